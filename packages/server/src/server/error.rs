//! HTTP mapping for `AppError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::common::{AppError, Options};

/// JSON error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable reason
    pub error: String,
    /// Machine-readable reason
    pub code: &'static str,
    /// Valid choices, when the rejected field has a fixed set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
}

pub fn status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::Validation(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
        AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::NotFound(_) | AppError::PageOutOfRange => StatusCode::NOT_FOUND,
        AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_code(&self);

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = match self {
            AppError::Validation(validation) => ErrorResponse {
                error: validation.message,
                code: "validation_error",
                options: validation.options,
            },
            // Infrastructure details stay in the logs
            AppError::Database(_) | AppError::Internal(_) => ErrorResponse {
                error: "Internal server error".to_string(),
                code: self.code(),
                options: None,
            },
            other => ErrorResponse {
                error: other.to_string(),
                code: other.code(),
                options: None,
            },
        };

        (status, Json(body)).into_response()
    }
}
