//! Per-request memoization of upstream-backed reads.
//!
//! A [`RequestScope`] is constructed at the start of one external request or
//! render pass, threaded through whatever needs post data, and dropped at the
//! end of the pass. Within the scope, operations with identical arguments
//! resolve to a single execution: the first caller runs the real operation
//! while concurrent and later callers await the same slot. The scope never
//! alters results and never outlives its pass — cross-request staleness is
//! the concern of whatever revalidation policy sits outside this crate.
//!
//! Failed executions are not memoized; a later caller with the same key may
//! retry within the scope.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use metrics::counter;
use tokio::sync::OnceCell;

use crate::application::pagination::{Cursor, PostPage};
use crate::application::posts::{PostError, PostService};
use crate::application::related::RelatedPostsService;
use crate::domain::posts::Post;

pub const METRIC_SCOPE_HIT_TOTAL: &str = "tidepool_scope_hit_total";
pub const METRIC_SCOPE_MISS_TOTAL: &str = "tidepool_scope_miss_total";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PageKey {
    cursor: Option<String>,
    page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RelatedKey {
    post_id: String,
    limit: u32,
}

/// One render pass worth of deduplicated post reads.
///
/// Keyed slots follow the one-typed-map-per-operation layout rather than a
/// single bag keyed by serialized arguments, so lookups stay typed end to
/// end.
pub struct RequestScope {
    posts: PostService,
    related: RelatedPostsService,
    pages: DashMap<PageKey, Arc<OnceCell<PostPage>>>,
    collection: OnceCell<Vec<Post>>,
    by_slug: DashMap<String, Arc<OnceCell<Post>>>,
    related_sets: DashMap<RelatedKey, Arc<OnceCell<Vec<Post>>>>,
}

impl RequestScope {
    pub fn new(posts: PostService, related: RelatedPostsService) -> Self {
        Self {
            posts,
            related,
            pages: DashMap::new(),
            collection: OnceCell::new(),
            by_slug: DashMap::new(),
            related_sets: DashMap::new(),
        }
    }

    /// Memoized [`PostService::page`].
    pub async fn page(
        &self,
        cursor: Option<Cursor>,
        page_size: u32,
    ) -> Result<PostPage, PostError> {
        let key = PageKey {
            cursor: cursor.as_ref().map(|c| c.as_str().to_string()),
            page_size,
        };
        memoized(&self.pages, key, "page", || {
            self.posts.page(cursor, page_size)
        })
        .await
    }

    /// Memoized [`PostService::all_posts`].
    pub async fn all_posts(&self) -> Result<Vec<Post>, PostError> {
        let ran = AtomicBool::new(false);
        let posts = self
            .collection
            .get_or_try_init(|| {
                ran.store(true, Ordering::Relaxed);
                self.posts.all_posts()
            })
            .await?;
        record_outcome("all_posts", ran.load(Ordering::Relaxed));
        Ok(posts.clone())
    }

    /// Memoized [`PostService::find_by_slug`]. A miss is an error and is
    /// therefore re-queried on subsequent calls within the scope.
    pub async fn post_by_slug(&self, slug: &str) -> Result<Post, PostError> {
        memoized(&self.by_slug, slug.to_string(), "post_by_slug", || {
            self.posts.find_by_slug(slug)
        })
        .await
    }

    /// Memoized [`RelatedPostsService::related_to`].
    pub async fn related_posts(&self, post: &Post, limit: u32) -> Result<Vec<Post>, PostError> {
        let key = RelatedKey {
            post_id: post.id.clone(),
            limit,
        };
        memoized(&self.related_sets, key, "related_posts", || {
            self.related.related_to(post, limit)
        })
        .await
    }
}

async fn memoized<K, T, F, Fut>(
    slots: &DashMap<K, Arc<OnceCell<T>>>,
    key: K,
    op: &'static str,
    fetch: F,
) -> Result<T, PostError>
where
    K: Eq + Hash,
    T: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, PostError>>,
{
    // Clone the slot out so the shard guard is released before awaiting.
    let cell = slots.entry(key).or_default().clone();

    let ran = AtomicBool::new(false);
    let value = cell
        .get_or_try_init(|| {
            ran.store(true, Ordering::Relaxed);
            fetch()
        })
        .await?;
    record_outcome(op, ran.load(Ordering::Relaxed));
    Ok(value.clone())
}

fn record_outcome(op: &'static str, executed: bool) {
    if executed {
        counter!(METRIC_SCOPE_MISS_TOTAL, "op" => op).increment(1);
    } else {
        counter!(METRIC_SCOPE_HIT_TOTAL, "op" => op).increment(1);
    }
}
