//! Cursor pagination primitives for the upstream document store.
//!
//! Cursors are minted by the upstream store and have no meaning outside a
//! single traversal. The core never inspects or re-encodes them; a cursor is
//! carried verbatim from one page response into the next page request.
//! `has_more = false` on a page is the sole termination signal.

use serde::Serialize;
use thiserror::Error;

use crate::domain::posts::Post;

/// Largest page size the upstream store accepts per request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used by consumers paging incrementally (infinite scroll).
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Opaque pagination token returned by the upstream store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Cursor {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Validated page request: a page size within the upstream bounds plus the
/// cursor to resume from (`None` starts from the beginning).
#[derive(Debug, Clone)]
pub struct PageRequest {
    page_size: u32,
    cursor: Option<Cursor>,
}

impl PageRequest {
    /// Rejects sizes outside `1..=MAX_PAGE_SIZE` rather than clamping, so a
    /// miscomputed caller value surfaces instead of silently shrinking.
    pub fn new(page_size: u32, cursor: Option<Cursor>) -> Result<Self, PaginationError> {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(PaginationError::InvalidPageSize {
                requested: page_size,
            });
        }
        Ok(Self { page_size, cursor })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }
}

/// One page of posts in upstream order.
#[derive(Debug, Clone, Serialize)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub has_more: bool,
    pub next_cursor: Option<Cursor>,
}

impl PostPage {
    pub fn empty() -> Self {
        Self {
            posts: Vec::new(),
            has_more: false,
            next_cursor: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page size {requested} is outside the accepted range 1..={MAX_PAGE_SIZE}")]
    InvalidPageSize { requested: u32 },
}
