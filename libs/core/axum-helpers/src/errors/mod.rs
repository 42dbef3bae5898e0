pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Body of every error response.
///
/// ```json
/// {
///   "code": 3001,
///   "error": "No index exists for preference combination 'keto_vegan'",
///   "error_code": "INDEX_MISSING"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Human-readable error message
    pub error: String,
    /// Machine-readable error identifier
    pub error_code: ErrorCode,
    /// Optional structured details (e.g. validation field errors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: error_code.code(),
            error: message.into(),
            error_code,
            details: None,
        }
    }
}

/// Application error type that can be converted to HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON parsing error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),

    /// An error whose status and code were chosen by a domain crate.
    #[error("{message}")]
    Coded {
        status: StatusCode,
        error_code: ErrorCode,
        message: String,
        /// The domain already logged this failure with its own context.
        logged: bool,
    },
}

impl AppError {
    pub fn coded(status: StatusCode, error_code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Coded {
            status,
            error_code,
            message: message.into(),
            logged: false,
        }
    }

    /// Render without a second log line; the caller has logged the failure.
    pub fn already_logged(self) -> Self {
        match self {
            Self::Coded {
                status,
                error_code,
                message,
                ..
            } => Self::Coded {
                status,
                error_code,
                message,
                logged: true,
            },
            other => other,
        }
    }

    /// Whether rendering this error emits a log line.
    pub fn needs_logging(&self) -> bool {
        !matches!(self, Self::Coded { logged: true, .. })
    }

    /// HTTP status this error renders with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::JsonExtractorRejection(_)
            | Self::ValidationError(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::SerdeJson(_) | Self::Io(_) | Self::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Coded { status, .. } => *status,
        }
    }
}

fn log_by_status(status: StatusCode, error_code: ErrorCode, message: &str) {
    if status.is_server_error() {
        if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::warn!(error_code = error_code.code(), "{}", message);
        } else {
            tracing::error!(error_code = error_code.code(), "{}", message);
        }
    } else {
        tracing::info!(error_code = error_code.code(), "{}", message);
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_code, message, details) = match self {
            AppError::SerdeJson(e) => {
                tracing::error!(
                    error_code = ErrorCode::SerdeJsonError.code(),
                    "JSON serialization error: {:?}",
                    e
                );
                (
                    ErrorCode::SerdeJsonError,
                    ErrorCode::SerdeJsonError.default_message().to_string(),
                    None,
                )
            }
            AppError::Io(e) => {
                tracing::error!(error_code = ErrorCode::IoError.code(), "I/O error: {:?}", e);
                (
                    ErrorCode::IoError,
                    ErrorCode::IoError.default_message().to_string(),
                    None,
                )
            }
            AppError::JsonExtractorRejection(e) => {
                tracing::info!(
                    error_code = ErrorCode::InvalidJson.code(),
                    "JSON extraction error: {:?}",
                    e
                );
                (ErrorCode::InvalidJson, e.body_text(), None)
            }
            AppError::ValidationError(e) => {
                tracing::info!(
                    error_code = ErrorCode::ValidationError.code(),
                    "Validation error: {:?}",
                    e
                );
                (
                    ErrorCode::ValidationError,
                    ErrorCode::ValidationError.default_message().to_string(),
                    serde_json::to_value(&e).ok(),
                )
            }
            AppError::BadRequest(msg) => {
                log_by_status(status, ErrorCode::BadRequest, &msg);
                (ErrorCode::BadRequest, msg, None)
            }
            AppError::NotFound(msg) => {
                log_by_status(status, ErrorCode::NotFound, &msg);
                (ErrorCode::NotFound, msg, None)
            }
            AppError::InternalServerError(msg) => {
                log_by_status(status, ErrorCode::InternalError, &msg);
                (ErrorCode::InternalError, msg, None)
            }
            AppError::ServiceUnavailable(msg) => {
                log_by_status(status, ErrorCode::ServiceUnavailable, &msg);
                (ErrorCode::ServiceUnavailable, msg, None)
            }
            AppError::Coded {
                error_code,
                message,
                logged,
                ..
            } => {
                if !logged {
                    log_by_status(status, error_code, &message);
                }
                (error_code, message, None)
            }
        };

        let body = Json(ErrorResponse {
            code: error_code.code(),
            error: message,
            error_code,
            details,
        });

        (status, body).into_response()
    }
}

/// Build an error response without going through [`AppError`].
pub fn error_response(status: StatusCode, message: String, error_code: ErrorCode) -> Response {
    (status, Json(ErrorResponse::new(error_code, message))).into_response()
}
