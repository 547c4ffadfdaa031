//! The trait seam between application services and the remote document store.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::{PageRequest, PaginationError, PostPage};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Network-level failure before any upstream response arrived.
    #[error("upstream transport error: {0}")]
    Transport(String),
    /// The upstream store answered with a non-success status.
    #[error("upstream rejected the query (status {status}): {message}")]
    Upstream { status: u16, message: String },
    /// The upstream response body could not be decoded.
    #[error("failed to decode upstream response: {message}")]
    Decode { message: String },
    /// A fetched record failed required-field normalization. Aborts the page
    /// it arrived on; accumulated results from prior pages are discarded
    /// together with the traversal.
    #[error("record integrity error: {message}")]
    Integrity { message: String },
    #[error("store configuration error: {message}")]
    Configuration { message: String },
    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

impl StoreError {
    pub fn from_transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Caller-controllable query conditions. Site scoping and the published flag
/// are not represented here: every query a [`ContentStore`] implementation
/// issues carries them unconditionally, so no caller can bypass them.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Exact match against the upstream slug formula.
    pub slug: Option<String>,
    /// Posts carrying at least one of these tag ids (OR semantics).
    pub any_tag: Vec<String>,
}

impl PostFilter {
    pub fn by_slug(slug: impl Into<String>) -> Self {
        Self {
            slug: Some(slug.into()),
            ..Self::default()
        }
    }

    pub fn with_any_tag(tag_ids: Vec<String>) -> Self {
        Self {
            any_tag: tag_ids,
            ..Self::default()
        }
    }
}

/// Read access to the upstream post collection.
///
/// Results are always sorted by the upstream "when" timestamp, newest first,
/// and always restricted to published posts of the configured project; an
/// implementation has no API through which callers could change either.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn query_page(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<PostPage, StoreError>;
}
