//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::domains::auth::JwtService;
use crate::kernel::ServerDeps;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    categories_handler, donate_handler, health_handler, listings_handler,
    organization_items_handler, pickup_handler, reserve_handler, samaritan_items_handler,
    unreserve_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
    /// Absent when running over in-memory stores
    pub db_pool: Option<PgPool>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub fn new(deps: Arc<ServerDeps>, db_pool: Option<PgPool>, jwt_service: Arc<JwtService>) -> Self {
        Self {
            deps,
            db_pool,
            jwt_service,
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        cors.allow_origin(AllowOrigin::any())
    } else {
        // Cookie auth needs credentials, which `Any` forbids
        cors.allow_origin(origins).allow_credentials(true)
    }
}

/// Build the Axum application router
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    let jwt_service = state.jwt_service.clone();

    Router::new()
        .route("/health", get(health_handler))
        .route("/categories", get(categories_handler))
        .route("/samaritan/donate", post(donate_handler))
        .route("/samaritan/items", get(samaritan_items_handler))
        .route("/organization/items", get(organization_items_handler))
        .route("/listings", get(listings_handler))
        .route("/items/:id/reserve", post(reserve_handler))
        .route("/items/:id/unreserve", post(unreserve_handler))
        .route("/items/:id/pickup", post(pickup_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service.clone(), req, next)
        }))
        .layer(Extension(state))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}
