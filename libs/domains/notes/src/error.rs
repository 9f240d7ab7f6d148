use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use mongo_repository::RepositoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("Note not found")]
    NotFound,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type NoteResult<T> = Result<T, NoteError>;

impl From<RepositoryError> for NoteError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => NoteError::NotFound,
            RepositoryError::Database(e) => NoteError::Database(e),
            RepositoryError::Serialize(e) => NoteError::Internal(e.to_string()),
            RepositoryError::Deserialize(e) => NoteError::Internal(e.to_string()),
        }
    }
}

/// Convert NoteError to AppError for standardized error responses
impl From<NoteError> for AppError {
    fn from(err: NoteError) -> Self {
        match err {
            NoteError::NotFound => AppError::NotFound("Note not found".to_string()),
            NoteError::Validation(msg) => AppError::BadRequest(msg),
            // Keeps the driver error so duplicate keys map to 409
            NoteError::Database(e) => AppError::Database(e),
            NoteError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for NoteError {
    fn into_response(self) -> Response {
        // Convert to AppError for the standardized error response format
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
