//! Error types for the HTTP API.
//!
//! Every failure leaves the server as `{"code": "...", "message": "..."}`
//! with the status code that matches its [`ErrorCode`].

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use sloths_core::{CoreError, ValidationError};
use sloths_db::DbError;

/// Machine-readable error code carried in every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    Duplicate,
    Protected,
    InvalidReference,
    Unauthorized,
    DatabaseError,
    Internal,
}

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Protected(String),

    #[error("{0}")]
    InvalidReference(String),

    #[error("{0}")]
    Unauthorized(String),

    /// The database could not be reached.
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Duplicate(_) | ApiError::Protected(_) => StatusCode::CONFLICT,
            ApiError::InvalidReference(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::NotFound(_) => ErrorCode::NotFound,
            ApiError::Validation(_) => ErrorCode::ValidationError,
            ApiError::Duplicate(_) => ErrorCode::Duplicate,
            ApiError::Protected(_) => ErrorCode::Protected,
            ApiError::InvalidReference(_) => ErrorCode::InvalidReference,
            ApiError::Unauthorized(_) => ErrorCode::Unauthorized,
            ApiError::Unavailable(_) | ApiError::Database(_) => ErrorCode::DatabaseError,
            ApiError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = Json(ErrorBody {
            code: self.code(),
            message: self.to_string(),
        });

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }
        (status, body).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        let message = error.to_string();
        match error {
            DbError::NotFound { .. } => ApiError::NotFound(message),
            DbError::UniqueViolation { .. } => ApiError::Duplicate(message),
            DbError::InvalidReference { .. } => ApiError::InvalidReference(message),
            DbError::Protected { .. } | DbError::ImmutableRow(_) => ApiError::Protected(message),
            DbError::Validation(_) => ApiError::Validation(message),
            DbError::ConnectionFailed(_) | DbError::PoolExhausted => ApiError::Unavailable(message),
            DbError::MigrationFailed(_) | DbError::QueryFailed(_) | DbError::Internal(_) => {
                ApiError::Database(message)
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::Validation(error.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::NotFound { .. } => ApiError::NotFound(error.to_string()),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_errors_map_to_codes() {
        let cases = [
            (DbError::not_found("Item", "x"), StatusCode::NOT_FOUND, ErrorCode::NotFound),
            (
                DbError::duplicate("name", "Laptop"),
                StatusCode::CONFLICT,
                ErrorCode::Duplicate,
            ),
            (
                DbError::protected("Status", "s1", "operations"),
                StatusCode::CONFLICT,
                ErrorCode::Protected,
            ),
            (
                DbError::InvalidReference {
                    message: "Device not found: d1".to_string(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::InvalidReference,
            ),
            (
                DbError::PoolExhausted,
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::DatabaseError,
            ),
            (
                DbError::QueryFailed("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DatabaseError,
            ),
        ];

        for (db_error, status, code) in cases {
            let api: ApiError = db_error.into();
            assert_eq!(api.status(), status);
            assert_eq!(api.code(), code);
        }
    }

    #[test]
    fn test_not_found_message() {
        let api: ApiError = DbError::not_found("Item", "abc").into();
        assert_eq!(api.to_string(), "Item not found: abc");
    }

    #[test]
    fn test_validation_is_bad_request() {
        let api: ApiError = ValidationError::Required {
            field: "name".to_string(),
        }
        .into();
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::InvalidReference).unwrap();
        assert_eq!(json, "\"INVALID_REFERENCE\"");
    }
}
