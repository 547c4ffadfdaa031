//! Post aggregation over the cursor-paged upstream store.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::application::pagination::{Cursor, PageRequest, PaginationError, PostPage};
use crate::application::store::{ContentStore, PostFilter, StoreError};
use crate::domain::posts::Post;

/// Page size used internally when materializing the full collection, to
/// bound the number of upstream round trips.
pub const AGGREGATION_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum PostError {
    #[error("published post with slug `{slug}` not found")]
    NotFound { slug: String },
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PostError {
    pub fn not_found(slug: impl Into<String>) -> Self {
        Self::NotFound { slug: slug.into() }
    }
}

/// Read service for the published post collection.
#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn ContentStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Fetch one page for incremental consumption. `cursor = None` starts
    /// from the newest post.
    pub async fn page(
        &self,
        cursor: Option<Cursor>,
        page_size: u32,
    ) -> Result<PostPage, PostError> {
        let request = PageRequest::new(page_size, cursor)?;
        let page = self.store.query_page(&PostFilter::default(), request).await?;
        Ok(page)
    }

    /// Materialize the entire published collection in upstream order.
    ///
    /// Pages are fetched sequentially, each resuming from the cursor the
    /// previous page returned, until a page reports `has_more = false`. Any
    /// page failure aborts the traversal and surfaces the error; a partial
    /// collection is never returned. Concurrent upstream writes during the
    /// walk may still duplicate or skip a post, which cursor pagination over
    /// a live store cannot exclude.
    pub async fn all_posts(&self) -> Result<Vec<Post>, PostError> {
        let filter = PostFilter::default();
        let mut posts = Vec::new();
        let mut cursor: Option<Cursor> = None;
        let mut pages_fetched = 0u32;

        loop {
            let request = PageRequest::new(AGGREGATION_PAGE_SIZE, cursor.take())?;
            let page = self.store.query_page(&filter, request).await?;
            pages_fetched += 1;
            debug!(
                page = pages_fetched,
                received = page.posts.len(),
                has_more = page.has_more,
                "aggregated post page"
            );
            posts.extend(page.posts);

            if !page.has_more {
                break;
            }
            cursor = page.next_cursor;
        }

        debug!(total = posts.len(), pages = pages_fetched, "aggregation complete");
        Ok(posts)
    }

    /// Look up a single published post by slug.
    ///
    /// Zero matches is [`PostError::NotFound`] — the miss is an error
    /// uniformly, never an empty success.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Post, PostError> {
        let filter = PostFilter::by_slug(slug);
        let request = PageRequest::new(1, None)?;
        let page = self.store.query_page(&filter, request).await?;

        page.posts
            .into_iter()
            .next()
            .ok_or_else(|| PostError::not_found(slug))
    }
}
