//! Notes Domain
//!
//! This module provides a complete domain implementation for managing notes using MongoDB.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, response sanitization
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Business logic, validation
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Generic MongoDB data access (soft delete enabled)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_notes::{handlers, service::NoteService};
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("mydb");
//!
//! let service = NoteService::new(db);
//! let router = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod service;

// Re-export commonly used types
pub use error::{NoteError, NoteResult};
pub use handlers::ApiDoc;
pub use models::{CreateNote, Note, NoteFilter, NoteView, UpdateNote};
pub use service::{NOTES_COLLECTION, NoteService};
