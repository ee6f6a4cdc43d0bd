//! Error types for store operations and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use recordvault_common::ErrorResponse;

/// Failure of a credential, record, or aggregation operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A required field was missing or empty. Nothing was written.
    #[error("{0}")]
    Validation(&'static str),

    /// Username or email already taken. Which one is not reported.
    #[error("Username or email already exists")]
    Conflict,

    /// Unknown username or wrong password; the two are indistinguishable.
    #[error("Invalid credentials")]
    AuthFailure,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Database error: {0}")]
    Storage(String),

    /// Cascade stopped before the user's records were removed.
    #[error("Failed to delete user data: {0}")]
    RecordsNotDeleted(String),

    /// Cascade removed the records but not the user row.
    #[error("Failed to delete user: {0}")]
    UserNotDeleted(String),
}

impl StoreError {
    /// Whether this failure is the caller's fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Conflict | Self::AuthFailure | Self::NotFound(_)
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict => StatusCode::BAD_REQUEST,
            Self::AuthFailure => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::RecordsNotDeleted(_) | Self::UserNotDeleted(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show a caller. Driver detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Storage(_) => "Database error".to_string(),
            Self::RecordsNotDeleted(_) => "Error deleting user data".to_string(),
            Self::UserNotDeleted(_) => "Error deleting user".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        if !self.is_client_error() {
            tracing::error!("{}", self);
        }
        let body = Json(ErrorResponse::new(self.public_message()));
        (self.status(), body).into_response()
    }
}
