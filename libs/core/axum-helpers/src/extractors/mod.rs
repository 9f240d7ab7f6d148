//! Custom extractors for Axum handlers.
//!
//! This module provides reusable extractors that reduce boilerplate
//! and standardize error handling across your API.

pub mod pagination_query;
pub mod validated_json;

pub use pagination_query::{PaginationQuery, pagination_header_map};
pub use validated_json::ValidatedJson;
