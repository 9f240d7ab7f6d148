//! Type-safe error codes for API responses.
//!
//! Single source of truth for the error codes used across the application.
//! Each code carries:
//! - String representation for client consumption (e.g., "VALIDATION_ERROR")
//! - Integer code for logging and monitoring (e.g., 1001)
//! - Default human-readable message
//!
//! # Example
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::ValidationError;
//! assert_eq!(code.as_str(), "VALIDATION_ERROR");
//! assert_eq!(code.code(), 1001);
//! assert_eq!(code.default_message(), "Request validation failed");
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standardized error codes for API responses.
///
/// Combines string identifiers (for clients), integer codes (for
/// monitoring), and default messages (for consistency).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000-1999)
    /// Request validation failed
    ValidationError,

    /// Invalid ObjectId format in path or query parameter
    InvalidObjectId,

    /// Invalid JSON format in request body
    InvalidJson,

    /// Requested resource was not found
    NotFound,

    /// Authentication credentials are missing or invalid
    Unauthorized,

    /// Authenticated user lacks sufficient permissions
    Forbidden,

    /// Request conflicts with current resource state (e.g., duplicate resource)
    Conflict,

    /// Request payload is semantically incorrect
    UnprocessableEntity,

    /// JSON extraction from request body failed
    JsonExtraction,

    // Server errors (1000s)
    /// An unexpected internal server error occurred
    InternalError,

    /// Service is temporarily unavailable
    ServiceUnavailable,

    // Database errors (2000-2999)
    /// Database query returned no results
    DatabaseNotFound,

    /// No suitable database server could be selected
    DatabaseServerSelection,

    /// Database authentication failed
    DatabaseAuth,

    /// Database command error
    DatabaseCommand,

    /// Database write error (other than duplicate key)
    DatabaseWrite,

    /// Duplicate key write error
    DatabaseDuplicateKey,

    /// Database transaction error
    DatabaseTransaction,

    /// Failed to serialize or deserialize a database document
    DatabaseSerialization,

    /// Database I/O error
    DatabaseIo,

    /// Unhandled database error
    DatabaseUnhandled,

    // I/O errors (4000s)
    /// File system I/O error
    IoError,

    // JSON parsing errors (5000s)
    /// JSON serialization/deserialization error
    SerdeJsonError,
}

impl ErrorCode {
    /// Get the string representation for client consumption.
    ///
    /// This returns a SCREAMING_SNAKE_CASE identifier that clients can use
    /// to programmatically handle specific error types.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidObjectId => "INVALID_OBJECT_ID",
            Self::InvalidJson => "INVALID_JSON",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::UnprocessableEntity => "UNPROCESSABLE_ENTITY",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::DatabaseNotFound => "DATABASE_NOT_FOUND",
            Self::DatabaseServerSelection => "DATABASE_SERVER_SELECTION",
            Self::DatabaseAuth => "DATABASE_AUTH",
            Self::DatabaseCommand => "DATABASE_COMMAND",
            Self::DatabaseWrite => "DATABASE_WRITE",
            Self::DatabaseDuplicateKey => "DATABASE_DUPLICATE_KEY",
            Self::DatabaseTransaction => "DATABASE_TRANSACTION",
            Self::DatabaseSerialization => "DATABASE_SERIALIZATION",
            Self::DatabaseIo => "DATABASE_IO",
            Self::DatabaseUnhandled => "DATABASE_UNHANDLED",
            Self::IoError => "IO_ERROR",
            Self::SerdeJsonError => "SERDE_JSON_ERROR",
        }
    }

    /// Get the integer code for logging and monitoring.
    ///
    /// These codes are used in structured logs and metrics to identify error types.
    /// They are organized into ranges:
    /// - 1000-1999: Client errors
    /// - 2000-2999: Database errors
    /// - 4000-4999: I/O errors
    /// - 5000-5999: Serialization errors
    pub fn code(&self) -> i32 {
        match self {
            // Client errors (1000-1999)
            Self::ValidationError => 1001,
            Self::InvalidObjectId => 1002,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::InternalError => 1005,
            Self::Unauthorized => 1006,
            Self::Forbidden => 1007,
            Self::Conflict => 1008,
            Self::UnprocessableEntity => 1009,
            Self::InvalidJson => 1010,
            Self::ServiceUnavailable => 1011,

            // Database errors (2000-2999)
            Self::DatabaseNotFound => 2001,
            Self::DatabaseServerSelection => 2002,
            Self::DatabaseAuth => 2003,
            Self::DatabaseCommand => 2004,
            Self::DatabaseWrite => 2005,
            Self::DatabaseDuplicateKey => 2006,
            Self::DatabaseTransaction => 2007,
            Self::DatabaseSerialization => 2008,
            Self::DatabaseIo => 2009,
            Self::DatabaseUnhandled => 2099,

            // I/O errors (4000s)
            Self::IoError => 4001,

            // JSON parsing errors (5000s)
            Self::SerdeJsonError => 5001,
        }
    }

    /// Get the default user-facing error message.
    ///
    /// Individual handlers can override these messages with more specific
    /// details.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::InvalidObjectId => "Invalid ObjectId format",
            Self::InvalidJson => "Invalid JSON format",
            Self::NotFound => "Resource not found",
            Self::Unauthorized => "Authentication required",
            Self::Forbidden => "Access forbidden",
            Self::Conflict => "Resource already exists",
            Self::UnprocessableEntity => "Request cannot be processed",
            Self::JsonExtraction => "Failed to parse request body",
            Self::InternalError => "An internal server error occurred",
            Self::ServiceUnavailable => "Service is temporarily unavailable",
            Self::DatabaseNotFound => "Database record not found",
            Self::DatabaseServerSelection => "Database is unreachable",
            Self::DatabaseAuth => "Database authentication failed",
            Self::DatabaseCommand => "Database command failed",
            Self::DatabaseWrite => "Database write failed",
            Self::DatabaseDuplicateKey => "Resource already exists",
            Self::DatabaseTransaction => "Database transaction failed",
            Self::DatabaseSerialization => "Failed to process database document",
            Self::DatabaseIo => "Database I/O error",
            Self::DatabaseUnhandled => "Unhandled database error",
            Self::IoError => "I/O error occurred",
            Self::SerdeJsonError => "JSON serialization error",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
