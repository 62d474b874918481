use axum::{
    extract::{Extension, Query},
    Json,
};

use crate::common::AppResult;
use crate::domains::items::{browse_listings, ListingParams, ListingsData};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

/// GET /listings
pub async fn listings_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(params): Query<ListingParams>,
) -> AppResult<Json<ListingsData>> {
    Ok(Json(
        browse_listings(user.caller(), &params, &state.deps).await?,
    ))
}
