use axum::Json;

use crate::domains::items::{list_categories, CategoriesData};
use crate::server::middleware::AuthUser;

/// GET /categories
pub async fn categories_handler(_user: AuthUser) -> Json<CategoriesData> {
    Json(list_categories())
}
