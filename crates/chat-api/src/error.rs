use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use chat_db::{ErrorKind, StoreError};
use chat_types::api::ApiResponse;

use crate::services::AuthError;

/// Handler-level failure. Rendered as `{"status":"Error","error":...}` with
/// a status code matching the kind of failure.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps a store error by kind. Transient failures are logged here.
    pub fn from_store(err: StoreError) -> Self {
        let message = err.public_message();
        match err.kind() {
            ErrorKind::NotFound => ApiError::NotFound(message),
            ErrorKind::Forbidden => ApiError::Forbidden(message),
            ErrorKind::Invalid => ApiError::Validation(message),
            ErrorKind::UniqueViolation => ApiError::Conflict(message),
            ErrorKind::Other => {
                error!(op = err.op().unwrap_or("db"), "store failure: {}", err);
                ApiError::Internal(message)
            }
        }
    }

    /// Prefixes the message, keeping the kind.
    pub fn context(self, context: &str) -> Self {
        let wrap = |message: String| format!("{context}: {message}");
        match self {
            ApiError::Validation(m) => ApiError::Validation(wrap(m)),
            ApiError::Unauthorized(m) => ApiError::Unauthorized(wrap(m)),
            ApiError::Forbidden(m) => ApiError::Forbidden(wrap(m)),
            ApiError::NotFound(m) => ApiError::NotFound(wrap(m)),
            ApiError::Conflict(m) => ApiError::Conflict(wrap(m)),
            ApiError::Internal(m) => ApiError::Internal(wrap(m)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UserNotFound => ApiError::NotFound(err.to_string()),
            AuthError::UserExists => ApiError::Conflict(err.to_string()),
            AuthError::IncorrectPassword | AuthError::Token(_) => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::Cipher(e) => {
                error!("cipher failure: {}", e);
                ApiError::Internal(e.to_string())
            }
            AuthError::Store(e) => ApiError::from_store(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ApiResponse::error(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_kinds_map_to_status_codes() {
        let forbidden = StoreError::Forbidden {
            op: "db.AddMessage",
            message: "Invalid chat_id".into(),
        };
        let err = ApiError::from_store(forbidden).context("Failed to create message");
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Failed to create message: Invalid chat_id");

        let err = ApiError::from_store(StoreError::UniqueViolation { op: "db.CreateChat" });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert!(!err.to_string().contains("db.CreateChat"));
    }

    #[test]
    fn unclassified_store_failures_are_internal() {
        let err = ApiError::from_store(StoreError::LockPoisoned);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.context("Failed to get chats").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn auth_errors_keep_their_messages() {
        let err = ApiError::from(AuthError::UserNotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "User not found");

        let err = ApiError::from(AuthError::IncorrectPassword);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
