//! Generic MongoDB data-access layer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ BaseRepository│  ← CRUD, soft delete, upsert, transactions
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │  Collection  │  ← mongodb driver handle (typed + raw views)
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │   convert    │  ← sanitize records for external exposure
//! └──────────────┘
//! ```
//!
//! [`BaseRepository`] wraps one collection and exposes a uniform operation
//! set: every read/count/exists path excludes soft-deleted records unless
//! the caller opts in, malformed ids are deterministic non-matches, and
//! only the `*_or_fail` lookups turn absence into an error.
//!
//! [`convert::convert_object`] prepares a record for API output: BSON
//! wrapper types become plain JSON values, `_id` is renamed to `id`, and
//! internal (`_`/`$`-prefixed) fields are stripped.

pub mod convert;
pub mod error;
pub mod options;
pub mod repository;

pub use convert::{convert_object, ConvertOptions, Keymap};
pub use error::{RepositoryError, RepositoryResult};
pub use options::{FindOptions, ReadOptions, RepositoryConfig, UpdateOptions};
pub use repository::BaseRepository;

/// Field holding the creation timestamp, assigned by `create`.
pub const CREATED_AT_FIELD: &str = "created_at";
/// Field holding the last-modified timestamp, bumped by save/update paths.
pub const UPDATED_AT_FIELD: &str = "updated_at";
/// Soft-delete flag. Underscore-prefixed so the default sanitizer strips it.
pub const SOFT_DELETED_FIELD: &str = "_deleted";
/// Timestamp set when a record is soft-deleted.
pub const DELETED_AT_FIELD: &str = "deleted_at";
/// Default primary key field.
pub const DEFAULT_PRIMARY_KEY: &str = "_id";
