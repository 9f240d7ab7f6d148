use thiserror::Error;

/// Errors surfaced by [`crate::BaseRepository`].
///
/// Absence is not an error here: plain lookups return `None`/`false`/`0`
/// and malformed ids are treated as non-matches. Only the `*_or_fail`
/// family produces [`RepositoryError::NotFound`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("MongoDB error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("BSON serialization error: {0}")]
    Serialize(#[from] mongodb::bson::ser::Error),

    #[error("BSON deserialization error: {0}")]
    Deserialize(#[from] mongodb::bson::de::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
