//! Related-post resolution by tag intersection.

use std::sync::Arc;

use tracing::debug;

use crate::application::pagination::PageRequest;
use crate::application::posts::PostError;
use crate::application::store::{ContentStore, PostFilter};
use crate::domain::posts::Post;

pub const DEFAULT_RELATED_LIMIT: u32 = 3;

/// Finds other published posts sharing at least one tag with a source post,
/// newest first.
#[derive(Clone)]
pub struct RelatedPostsService {
    store: Arc<dyn ContentStore>,
}

impl RelatedPostsService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Up to `limit` posts sharing a tag with `post`, excluding `post`
    /// itself.
    ///
    /// A source post without tags has no relations: the resolver returns an
    /// empty set without querying upstream rather than degenerating into
    /// "all posts". The source post is removed after the query, so a result
    /// may hold as few as `limit - 1` entries when the source matched its
    /// own filter.
    pub async fn related_to(&self, post: &Post, limit: u32) -> Result<Vec<Post>, PostError> {
        if post.tags.is_empty() {
            debug!(post_id = %post.id, "post has no tags, skipping related lookup");
            return Ok(Vec::new());
        }

        let filter = PostFilter::with_any_tag(post.tag_ids().map(String::from).collect());
        let request = PageRequest::new(limit, None)?;
        let page = self.store.query_page(&filter, request).await?;

        let related: Vec<Post> = page
            .posts
            .into_iter()
            .filter(|candidate| candidate.id != post.id)
            .collect();
        debug!(post_id = %post.id, found = related.len(), "resolved related posts");
        Ok(related)
    }
}
