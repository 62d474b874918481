use std::collections::BTreeMap;

use thiserror::Error;

/// Valid choices attached to a validation error (e.g. the category map) so clients can
/// correct a request without a second round trip.
pub type Options = BTreeMap<i32, &'static str>;

/// Structured input rejection. Produced by the validators before any store access.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub options: Option<Options>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            options: None,
        }
    }

    pub fn with_options(message: impl Into<String>, options: Options) -> Self {
        Self {
            message: message.into(),
            options: Some(options),
        }
    }
}

/// A lifecycle guard that failed. Always reported, never retried.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateConflict {
    #[error("Item is not active.")]
    NotActive,

    #[error("Item is already reserved")]
    AlreadyReserved,

    #[error("Item has already been picked up")]
    AlreadyPickedUp,

    #[error("Item is no longer available")]
    Expired,

    #[error("Item is not reserved")]
    NotReserved,
}

impl StateConflict {
    /// Machine-readable reason string.
    pub fn code(&self) -> &'static str {
        match self {
            StateConflict::NotActive => "not_active",
            StateConflict::AlreadyReserved => "already_reserved",
            StateConflict::AlreadyPickedUp => "already_picked_up",
            StateConflict::Expired => "expired",
            StateConflict::NotReserved => "not_reserved",
        }
    }
}

/// Error taxonomy shared by every layer of the server.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Conflict(#[from] StateConflict),

    #[error("Page number exceeds available pages")]
    PageOutOfRange,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        AppError::Forbidden(reason.into())
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        AppError::NotFound(reason.into())
    }

    /// Machine-readable reason string.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::Unauthenticated => "unauthenticated",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(conflict) => conflict.code(),
            AppError::PageOutOfRange => "page_out_of_range",
            AppError::Database(_) | AppError::Internal(_) => "internal_error",
        }
    }

    /// The state conflict behind this error, if any.
    pub fn conflict(&self) -> Option<StateConflict> {
        match self {
            AppError::Conflict(conflict) => Some(*conflict),
            _ => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_messages_are_user_facing() {
        let err = AppError::from(StateConflict::NotActive);
        assert_eq!(err.to_string(), "Item is not active.");
        assert_eq!(err.code(), "not_active");

        let err = AppError::from(StateConflict::AlreadyReserved);
        assert_eq!(err.to_string(), "Item is already reserved");
    }

    #[test]
    fn test_validation_error_carries_options() {
        let mut options = Options::new();
        options.insert(1, "Food");
        let err = AppError::from(ValidationError::with_options("Invalid category", options));

        match err {
            AppError::Validation(v) => {
                assert_eq!(v.message, "Invalid category");
                assert_eq!(v.options.unwrap().get(&1), Some(&"Food"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
