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
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// MongoDB server code for a duplicate key write error.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Standard error response structure.
///
/// This structure is returned for all error responses, providing consistent
/// error information to clients including
/// - `code`: Integer error code for logging/monitoring (e.g., 1008)
/// - `error`: Machine-readable error identifier (e.g., "CONFLICT")
/// - `message`: Human-readable error message
/// - `details`: Optional additional error details (e.g., validation errors)
///
/// # JSON Example
///
/// ```json
/// {
///   "code": 1008,
///   "error": "CONFLICT",
///   "message": "Resource already exists",
///   "details": null
/// }
/// ```
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier for programmatic handling
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional structured error details (e.g., validation field errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application error type that can be converted to HTTP responses.
///
/// This enum integrates with common error types from dependencies
/// and provides structured error responses with error codes for observability.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON parsing error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] MongoError),

    #[error("Document serialization error: {0}")]
    BsonSerialize(#[from] mongodb::bson::ser::Error),

    #[error("Document deserialization error: {0}")]
    BsonDeserialize(#[from] mongodb::bson::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable Entity: {0}")]
    UnprocessableEntity(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details, code) = match self {
            AppError::SerdeJson(e) => {
                tracing::error!(
                    error_code = ErrorCode::SerdeJsonError.code(),
                    "JSON parsing error: {:?}",
                    e
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::SerdeJsonError.default_message().to_string(),
                    None,
                    ErrorCode::SerdeJsonError,
                )
            }
            AppError::Database(e) => map_mongo_error(&e),
            AppError::BsonSerialize(e) => {
                tracing::error!(
                    error_code = ErrorCode::DatabaseSerialization.code(),
                    "Document serialization error: {:?}",
                    e
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DatabaseSerialization
                        .default_message()
                        .to_string(),
                    None,
                    ErrorCode::DatabaseSerialization,
                )
            }
            AppError::BsonDeserialize(e) => {
                tracing::error!(
                    error_code = ErrorCode::DatabaseSerialization.code(),
                    "Document deserialization error: {:?}",
                    e
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DatabaseSerialization
                        .default_message()
                        .to_string(),
                    None,
                    ErrorCode::DatabaseSerialization,
                )
            }
            AppError::Io(e) => {
                tracing::error!(error_code = ErrorCode::IoError.code(), "I/O error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::IoError.default_message().to_string(),
                    None,
                    ErrorCode::IoError,
                )
            }
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!(
                    error_code = ErrorCode::JsonExtraction.code(),
                    "JSON extraction error: {:?}",
                    e
                );
                (e.status(), e.body_text(), None, ErrorCode::JsonExtraction)
            }
            AppError::ValidationError(e) => {
                tracing::info!(
                    error_code = ErrorCode::ValidationError.code(),
                    "Validation error: {:?}",
                    e
                );
                (
                    StatusCode::BAD_REQUEST,
                    ErrorCode::ValidationError.default_message().to_string(),
                    Some(serde_json::to_value(&e).unwrap_or(serde_json::json!(null))),
                    ErrorCode::ValidationError,
                )
            }
            AppError::BadRequest(msg) => {
                tracing::info!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg, None, ErrorCode::InternalError)
            }
            AppError::Unauthorized(msg) => {
                tracing::info!("Unauthorized: {}", msg);
                (StatusCode::UNAUTHORIZED, msg, None, ErrorCode::Unauthorized)
            }
            AppError::Forbidden(msg) => {
                tracing::info!("Forbidden: {}", msg);
                (StatusCode::FORBIDDEN, msg, None, ErrorCode::Forbidden)
            }
            AppError::NotFound(msg) => {
                tracing::info!(error_code = ErrorCode::NotFound.code(), "Not found: {}", msg);
                (StatusCode::NOT_FOUND, msg, None, ErrorCode::NotFound)
            }
            AppError::Conflict(msg) => {
                tracing::info!("Conflict: {}", msg);
                (StatusCode::CONFLICT, msg, None, ErrorCode::Conflict)
            }
            AppError::UnprocessableEntity(msg) => {
                tracing::info!("Unprocessable entity: {}", msg);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    msg,
                    None,
                    ErrorCode::UnprocessableEntity,
                )
            }
            AppError::InternalServerError(msg) => {
                tracing::error!(
                    error_code = ErrorCode::InternalError.code(),
                    "Internal server error: {}",
                    msg
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    msg,
                    None,
                    ErrorCode::InternalError,
                )
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    msg,
                    None,
                    ErrorCode::ServiceUnavailable,
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code.code(),
            error: code.as_str().to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Maps a MongoDB driver error to HTTP response components.
///
/// Duplicate key writes surface as 409 Conflict; unreachable or
/// overloaded database states surface as 503; everything else is an
/// internal error. Server messages are never leaked to the client.
fn map_mongo_error(
    error: &MongoError,
) -> (StatusCode, String, Option<serde_json::Value>, ErrorCode) {
    match &*error.kind {
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE =>
        {
            tracing::info!(
                error_code = ErrorCode::DatabaseDuplicateKey.code(),
                "Duplicate key write error: {:?}",
                write_error
            );
            (
                StatusCode::CONFLICT,
                ErrorCode::DatabaseDuplicateKey.default_message().to_string(),
                None,
                ErrorCode::DatabaseDuplicateKey,
            )
        }
        ErrorKind::Write(e) => {
            tracing::error!(
                error_code = ErrorCode::DatabaseWrite.code(),
                "Database write error: {:?}",
                e
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DatabaseWrite.default_message().to_string(),
                None,
                ErrorCode::DatabaseWrite,
            )
        }
        ErrorKind::ServerSelection { message, .. } => {
            tracing::error!(
                error_code = ErrorCode::DatabaseServerSelection.code(),
                "Database server selection failed: {}",
                message
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::DatabaseServerSelection
                    .default_message()
                    .to_string(),
                None,
                ErrorCode::DatabaseServerSelection,
            )
        }
        ErrorKind::Authentication { message, .. } => {
            tracing::error!(
                error_code = ErrorCode::DatabaseAuth.code(),
                "Database authentication failed: {}",
                message
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DatabaseAuth.default_message().to_string(),
                None,
                ErrorCode::DatabaseAuth,
            )
        }
        ErrorKind::Command(e) => {
            tracing::error!(
                error_code = ErrorCode::DatabaseCommand.code(),
                "Database command error: {:?}",
                e
            );
            (
                StatusCode::BAD_GATEWAY,
                ErrorCode::DatabaseCommand.default_message().to_string(),
                None,
                ErrorCode::DatabaseCommand,
            )
        }
        ErrorKind::Transaction { message, .. } => {
            tracing::error!(
                error_code = ErrorCode::DatabaseTransaction.code(),
                "Database transaction error: {}",
                message
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DatabaseTransaction.default_message().to_string(),
                None,
                ErrorCode::DatabaseTransaction,
            )
        }
        ErrorKind::BsonSerialization(e) => {
            tracing::error!(
                error_code = ErrorCode::DatabaseSerialization.code(),
                "Document serialization error: {:?}",
                e
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DatabaseSerialization
                    .default_message()
                    .to_string(),
                None,
                ErrorCode::DatabaseSerialization,
            )
        }
        ErrorKind::BsonDeserialization(e) => {
            tracing::error!(
                error_code = ErrorCode::DatabaseSerialization.code(),
                "Document deserialization error: {:?}",
                e
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DatabaseSerialization
                    .default_message()
                    .to_string(),
                None,
                ErrorCode::DatabaseSerialization,
            )
        }
        ErrorKind::Io(e) => {
            tracing::error!(
                error_code = ErrorCode::DatabaseIo.code(),
                "Database I/O error: {:?}",
                e
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::DatabaseIo.default_message().to_string(),
                None,
                ErrorCode::DatabaseIo,
            )
        }
        _ => {
            tracing::error!(
                error_code = ErrorCode::DatabaseUnhandled.code(),
                "Unhandled database error: {:?}",
                error
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DatabaseUnhandled.default_message().to_string(),
                None,
                ErrorCode::DatabaseUnhandled,
            )
        }
    }
}

/// Helper function to create error responses.
///
/// # Example
///
/// ```rust,ignore
/// use axum_helpers::errors::{error_response, ErrorCode};
/// use axum::http::StatusCode;
///
/// let response = error_response(
///     StatusCode::BAD_REQUEST,
///     "Invalid input".to_string(),
///     ErrorCode::ValidationError,
/// );
/// ```
pub fn error_response(status: StatusCode, message: String, error_code: ErrorCode) -> Response {
    let body = Json(ErrorResponse {
        code: error_code.code(),
        error: error_code.as_str().to_string(),
        message,
        details: None,
    });

    (status, body).into_response()
}
