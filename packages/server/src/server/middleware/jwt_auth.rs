use crate::common::{AppError, UserId};
use crate::domains::auth::JwtService;
use crate::domains::identity::{Caller, RoleKind};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

/// Cookie carrying the token for browser clients
pub const JWT_COOKIE: &str = "jwt";

/// Authenticated user information from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: UserId,
    pub username: String,
    pub role: RoleKind,
}

impl AuthUser {
    pub fn caller(&self) -> Caller {
        Caller::new(self.role, self.user_id)
    }
}

/// Handlers that take `AuthUser` reject unauthenticated requests with 401.
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}

/// JWT authentication middleware
///
/// Extracts JWT token from the Authorization header (or the `jwt` cookie), verifies it,
/// and adds AuthUser to request extensions.
/// If no token or invalid token, request continues without AuthUser (public access).
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth_user = extract_auth_user(&request, &jwt_service);

    if let Some(user) = auth_user {
        debug!("Authenticated user: {} ({})", user.user_id, user.role.as_str());
        request.extensions_mut().insert(user);
    } else {
        debug!("No valid authentication token");
    }

    next.run(request).await
}

fn token_from_cookie(request: &axum::http::Request<axum::body::Body>) -> Option<&str> {
    request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            (name == JWT_COOKIE).then_some(value)
        })
}

/// Extract and verify JWT token from request
fn extract_auth_user(
    request: &axum::http::Request<axum::body::Body>,
    jwt_service: &JwtService,
) -> Option<AuthUser> {
    let token = match request.headers().get(header::AUTHORIZATION) {
        // Handle both "Bearer <token>" and raw token
        Some(value) => {
            let auth_str = value.to_str().ok()?;
            auth_str.strip_prefix("Bearer ").unwrap_or(auth_str)
        }
        None => token_from_cookie(request)?,
    };

    let claims = jwt_service.verify_token(token).ok()?;

    Some(AuthUser {
        user_id: claims.user_id,
        username: claims.username,
        role: claims.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test_secret", "test_issuer".to_string())
    }

    #[test]
    fn test_extract_token_with_bearer() {
        let jwt_service = service();
        let user_id = UserId::new();
        let token = jwt_service
            .create_token(user_id, "foodbank".to_string(), RoleKind::Organization)
            .unwrap();

        let request = axum::http::Request::builder()
            .header("authorization", format!("Bearer {}", token))
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &jwt_service).unwrap();
        assert_eq!(auth_user.user_id, user_id);
        assert_eq!(auth_user.caller(), Caller::Organization(user_id));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let jwt_service = service();
        let user_id = UserId::new();
        let token = jwt_service
            .create_token(user_id, "donor".to_string(), RoleKind::Samaritan)
            .unwrap();

        let request = axum::http::Request::builder()
            .header("cookie", format!("theme=dark; jwt={}", token))
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &jwt_service).unwrap();
        assert_eq!(auth_user.caller(), Caller::Samaritan(user_id));
    }

    #[test]
    fn test_no_auth_header() {
        let request = axum::http::Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();

        assert!(extract_auth_user(&request, &service()).is_none());
    }

    #[test]
    fn test_invalid_token() {
        let request = axum::http::Request::builder()
            .header("authorization", "Bearer invalid_token")
            .body(axum::body::Body::empty())
            .unwrap();

        assert!(extract_auth_user(&request, &service()).is_none());
    }
}
