//! Type-safe error codes for API responses.
//!
//! Each code has a SCREAMING_SNAKE_CASE identifier for clients, an integer for
//! logs and dashboards, and a default human-readable message.
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::IndexMissing;
//! assert_eq!(code.as_str(), "INDEX_MISSING");
//! assert_eq!(code.code(), 3001);
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standardized error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000s)
    /// Request validation failed
    ValidationError,

    /// Request body could not be parsed as the expected JSON
    InvalidJson,

    /// Request is well-formed but semantically invalid
    BadRequest,

    /// Requested route or resource was not found
    NotFound,

    // Server errors (2000s)
    /// An unexpected internal server error occurred
    InternalError,

    /// A dependency is temporarily unavailable
    ServiceUnavailable,

    /// File system I/O error
    IoError,

    /// JSON serialization error
    SerdeJsonError,

    // Retrieval errors (3000s)
    /// No vector index exists for the requested preference combination
    IndexMissing,

    /// A vector index file failed validation
    IndexCorrupt,

    /// Query and index vector dimensions disagree
    DimensionMismatch,

    /// The recipe store failed
    StoreUnavailable,
}

impl ErrorCode {
    /// Identifier clients match on.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidJson => "INVALID_JSON",
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::IoError => "IO_ERROR",
            Self::SerdeJsonError => "SERDE_JSON_ERROR",
            Self::IndexMissing => "INDEX_MISSING",
            Self::IndexCorrupt => "INDEX_CORRUPT",
            Self::DimensionMismatch => "DIMENSION_MISMATCH",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
        }
    }

    /// Integer code for structured logs.
    ///
    /// - 1000-1999: client errors
    /// - 2000-2999: server errors
    /// - 3000-3999: retrieval errors
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidJson => 1002,
            Self::BadRequest => 1003,
            Self::NotFound => 1004,

            Self::InternalError => 2001,
            Self::ServiceUnavailable => 2002,
            Self::IoError => 2003,
            Self::SerdeJsonError => 2004,

            Self::IndexMissing => 3001,
            Self::IndexCorrupt => 3002,
            Self::DimensionMismatch => 3003,
            Self::StoreUnavailable => 3004,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::InvalidJson => "Request body is not valid JSON",
            Self::BadRequest => "Bad request",
            Self::NotFound => "The requested resource was not found",
            Self::InternalError => "An internal server error occurred",
            Self::ServiceUnavailable => "Service is temporarily unavailable",
            Self::IoError => "I/O error occurred",
            Self::SerdeJsonError => "JSON serialization error",
            Self::IndexMissing => "No index exists for this preference combination",
            Self::IndexCorrupt => "Vector index is corrupt",
            Self::DimensionMismatch => "Embedding dimension does not match the index",
            Self::StoreUnavailable => "Recipe store is unavailable",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
