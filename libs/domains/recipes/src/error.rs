use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, ErrorCode};
use core_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Embedding service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("No index exists for preference combination '{key}'")]
    IndexMissing { key: String },

    #[error("Recipe {id} has a malformed {field} field: {reason}")]
    Decode {
        id: i64,
        field: &'static str,
        reason: String,
    },

    #[error("Recipe store error: {0}")]
    Store(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index file {path} is corrupt: {reason}")]
    IndexCorrupt { path: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type RecipeResult<T> = Result<T, RecipeError>;

impl RecipeError {
    pub fn decode(id: i64, field: &'static str, reason: impl ToString) -> Self {
        RecipeError::Decode {
            id,
            field,
            reason: reason.to_string(),
        }
    }

    pub fn corrupt(path: impl ToString, reason: impl ToString) -> Self {
        RecipeError::IndexCorrupt {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Code reported in logs and error bodies.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            RecipeError::InvalidRequest(_) => ErrorCode::BadRequest,
            RecipeError::ServiceUnavailable(_) => ErrorCode::ServiceUnavailable,
            RecipeError::IndexMissing { .. } => ErrorCode::IndexMissing,
            RecipeError::Store(_) => ErrorCode::StoreUnavailable,
            RecipeError::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
            RecipeError::IndexCorrupt { .. } => ErrorCode::IndexCorrupt,
            RecipeError::Decode { .. } | RecipeError::Config(_) | RecipeError::Internal(_) => {
                ErrorCode::InternalError
            }
        }
    }
}

impl From<sqlx::Error> for RecipeError {
    fn from(err: sqlx::Error) -> Self {
        RecipeError::Store(err.to_string())
    }
}

impl From<database::DatabaseError> for RecipeError {
    fn from(err: database::DatabaseError) -> Self {
        RecipeError::Store(err.to_string())
    }
}

impl From<reqwest::Error> for RecipeError {
    fn from(err: reqwest::Error) -> Self {
        RecipeError::ServiceUnavailable(err.to_string())
    }
}

impl From<ConfigError> for RecipeError {
    fn from(err: ConfigError) -> Self {
        RecipeError::Config(err.to_string())
    }
}

/// Client-facing messages never carry driver, path or provider details.
///
/// The service logs each failure with its stage, so the response is rendered
/// without a second log line.
impl From<RecipeError> for AppError {
    fn from(err: RecipeError) -> Self {
        let code = err.error_code();
        let (status, message) = match err {
            RecipeError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            RecipeError::ServiceUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Embedding service is unavailable".to_string(),
            ),
            RecipeError::IndexMissing { .. } | RecipeError::DimensionMismatch { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            RecipeError::Store(_)
            | RecipeError::IndexCorrupt { .. }
            | RecipeError::Decode { .. }
            | RecipeError::Config(_)
            | RecipeError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                code.default_message().to_string(),
            ),
        };
        AppError::coded(status, code, message).already_logged()
    }
}

impl IntoResponse for RecipeError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_missing_message_names_key() {
        let err = RecipeError::IndexMissing {
            key: "keto_vegan".into(),
        };
        assert_eq!(
            err.to_string(),
            "No index exists for preference combination 'keto_vegan'"
        );
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (RecipeError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                RecipeError::ServiceUnavailable("timeout".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                RecipeError::IndexMissing { key: "vegan".into() },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RecipeError::Store("disk I/O error".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RecipeError::DimensionMismatch {
                    expected: 384,
                    actual: 768,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            let app: AppError = err.into();
            assert_eq!(app.status(), status);
        }
    }

    #[test]
    fn test_converted_errors_are_not_logged_again() {
        let errors = [
            RecipeError::InvalidRequest("query must not be empty".into()),
            RecipeError::ServiceUnavailable("connection refused".into()),
            RecipeError::IndexMissing { key: "keto".into() },
            RecipeError::Store("disk I/O error".into()),
            RecipeError::Internal("join error".into()),
        ];
        for err in errors {
            let app: AppError = err.into();
            assert!(!app.needs_logging(), "{app:?}");
        }
    }

    #[test]
    fn test_store_error_does_not_leak_driver_detail() {
        let app: AppError = RecipeError::Store("database is locked at /srv/recipes.db".into()).into();
        assert!(!app.to_string().contains("/srv"));
        assert!(app.to_string().contains("Recipe store is unavailable"));
    }
}
