//! Offset-based pagination primitives.
//!
//! A [`Pagination`] describes one page of results as a page / page-size /
//! offset triple. [`create_pagination`] validates caller input and derives
//! the offset; [`pagination_headers`] projects a window plus a total count
//! into the `x-pagination-*` response header values; [`walk_pages`] drives
//! a page-returning function until it is exhausted.

mod walker;

pub use walker::walk_pages;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Default page for requests that do not specify one.
pub const DEFAULT_PAGE: u64 = 1;
/// Default page size for requests that do not specify one.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Response header carrying the current page.
pub const HEADER_PAGE: &str = "x-pagination-page";
/// Response header carrying the page size.
pub const HEADER_PAGE_SIZE: &str = "x-pagination-page-size";
/// Response header carrying the total record count.
pub const HEADER_TOTAL: &str = "x-pagination-total";

/// One page of results as an offset window.
///
/// Invariant: `offset == (page - 1) * page_size`. Construct through
/// [`create_pagination`] to keep it that way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    /// 1-based page number
    pub page: u64,
    /// Number of records per page
    pub page_size: u64,
    /// Number of records to skip
    pub offset: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

/// Limits applied when building a pagination window.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaginationOptions {
    /// Upper bound on the requested page size, if any
    pub max_limit: Option<u64>,
}

/// Request-validation failures for pagination input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Invalid pagination request")]
    InvalidRequest,

    #[error("Page size cannot be larger than {0}")]
    PageSizeTooLarge(u64),
}

/// Build a validated pagination window.
///
/// `page` and `page_size` must both be at least 1; `options.max_limit`, when
/// set, caps `page_size`. The resulting offset is `(page - 1) * page_size`.
pub fn create_pagination(
    page: u64,
    page_size: u64,
    options: &PaginationOptions,
) -> Result<Pagination, PaginationError> {
    if page < 1 || page_size < 1 {
        return Err(PaginationError::InvalidRequest);
    }

    if let Some(max_limit) = options.max_limit {
        if page_size > max_limit {
            return Err(PaginationError::PageSizeTooLarge(max_limit));
        }
    }

    // An offset past u64::MAX is not a window any backend can serve.
    let offset = (page - 1)
        .checked_mul(page_size)
        .ok_or(PaginationError::InvalidRequest)?;

    Ok(Pagination {
        page,
        page_size,
        offset,
    })
}

/// Derived response metadata for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationHeaders {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
}

impl PaginationHeaders {
    /// Header name/value pairs in wire order.
    pub fn as_pairs(&self) -> [(&'static str, String); 3] {
        [
            (HEADER_PAGE, self.page.to_string()),
            (HEADER_PAGE_SIZE, self.page_size.to_string()),
            (HEADER_TOTAL, self.total.to_string()),
        ]
    }
}

/// Project a window and a total count into response header values.
///
/// A missing window falls back to the default page and page size; a missing
/// total falls back to 0.
pub fn pagination_headers(
    pagination: Option<&Pagination>,
    total_count: Option<u64>,
) -> PaginationHeaders {
    PaginationHeaders {
        page: pagination.map(|p| p.page).unwrap_or(DEFAULT_PAGE),
        page_size: pagination.map(|p| p.page_size).unwrap_or(DEFAULT_PAGE_SIZE),
        total: total_count.unwrap_or(0),
    }
}

/// Continuation signal used by batch consumers.
///
/// Reproduces the original comparison exactly: `true` iff
/// `offset + page_size > total`. Call sites rely on this sign; do not
/// "correct" it.
pub fn need_to_get_more(total: u64, pagination: &Pagination) -> bool {
    pagination.offset.saturating_add(pagination.page_size) > total
}
