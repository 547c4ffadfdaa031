//! In-memory full-text search over the aggregated site content.
//!
//! The index is a pure function of its input: [`IndexSnapshot::build`]
//! consumes a batch of searchable content and produces an immutable
//! structure, and [`SearchService`] swaps whole snapshots behind a lock so
//! readers never observe a half-built index. Matching is forward-only —
//! query tokens match index tokens at token start, never mid-token.
//!
//! Searches issued before any snapshot is installed return empty categorized
//! results: the service degrades soft during cold start instead of blocking
//! or erroring.

mod lock;
mod tokenizer;

pub use tokenizer::tokenize;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use metrics::histogram;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::debug;

use crate::domain::posts::Post;
use crate::domain::types::ContentKind;
use lock::{rw_read, rw_write};

const SOURCE: &str = "application::search";

/// Result cap applied when a caller does not pick one.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

pub const METRIC_INDEX_BUILD_MS: &str = "tidepool_index_build_ms";

/// One item submitted for indexing. The body text is folded into the token
/// index during the build and discarded afterwards; only the projection
/// fields survive for result hydration.
#[derive(Debug, Clone)]
pub struct SearchableContent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub slug: String,
    /// Tag names; ids are not needed for faceting or tag search.
    pub tags: Vec<String>,
    pub kind: ContentKind,
    pub body: Option<String>,
    pub published_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl SearchableContent {
    /// Journal entries come straight from the post collection; projects and
    /// videos are supplied by the hosting site directly.
    pub fn from_post(post: &Post, body: Option<String>) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            description: post.description.clone(),
            slug: post.slug.clone(),
            tags: post.tag_names(),
            kind: ContentKind::Journal,
            body,
            published_at: post.published_at,
            created_at: post.created_at,
        }
    }

    fn index_blob(&self) -> String {
        let mut parts = Vec::with_capacity(3 + self.tags.len());
        parts.push(self.title.as_str());
        parts.push(self.description.as_str());
        parts.extend(self.tags.iter().map(String::as_str));
        if let Some(body) = &self.body {
            parts.push(body.as_str());
        }
        parts.join(" ")
    }

    fn into_hit(self) -> SearchHit {
        SearchHit {
            id: self.id,
            title: self.title,
            description: self.description,
            slug: self.slug,
            tags: self.tags,
            kind: self.kind,
            published_at: self.published_at,
            created_at: self.created_at,
        }
    }
}

/// Read-only projection retained by the index for result hydration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub tags: Vec<String>,
    pub kind: ContentKind,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl SearchHit {
    fn sort_key(&self) -> OffsetDateTime {
        self.published_at.unwrap_or(self.created_at)
    }
}

/// Search results partitioned by content category.
#[derive(Debug, Clone, Serialize)]
pub struct CategorizedResults {
    pub journal: Vec<SearchHit>,
    pub project: Vec<SearchHit>,
    pub video: Vec<SearchHit>,
    pub total: usize,
}

impl CategorizedResults {
    pub fn empty() -> Self {
        Self {
            journal: Vec::new(),
            project: Vec::new(),
            video: Vec::new(),
            total: 0,
        }
    }

    fn from_hits(hits: Vec<SearchHit>) -> Self {
        let mut results = Self::empty();
        results.total = hits.len();
        for hit in hits {
            match hit.kind {
                ContentKind::Journal => results.journal.push(hit),
                ContentKind::Project => results.project.push(hit),
                ContentKind::Video => results.video.push(hit),
            }
        }
        results
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Aggregated usage of one tag name across the indexed content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagUsage {
    pub name: String,
    pub count: usize,
    pub kinds: Vec<ContentKind>,
}

/// Immutable token index over one content generation.
pub struct IndexSnapshot {
    entries: Vec<SearchHit>,
    slot_by_id: HashMap<String, usize>,
    postings: BTreeMap<String, Vec<usize>>,
}

impl IndexSnapshot {
    /// Index a content batch. Duplicate ids keep the order slot of their
    /// first occurrence; the stored projection is the last one seen.
    pub fn build(content: Vec<SearchableContent>) -> Self {
        let started = Instant::now();
        let mut entries: Vec<SearchHit> = Vec::new();
        let mut slot_by_id: HashMap<String, usize> = HashMap::new();
        let mut postings: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();

        for item in content {
            let blob = item.index_blob();
            let hit = item.into_hit();
            let slot = match slot_by_id.get(&hit.id) {
                Some(&slot) => {
                    entries[slot] = hit;
                    slot
                }
                None => {
                    let slot = entries.len();
                    slot_by_id.insert(hit.id.clone(), slot);
                    entries.push(hit);
                    slot
                }
            };
            for token in tokenize(&blob) {
                postings.entry(token).or_default().insert(slot);
            }
        }

        let snapshot = Self {
            entries,
            slot_by_id,
            postings: postings
                .into_iter()
                .map(|(token, slots)| (token, slots.into_iter().collect()))
                .collect(),
        };
        histogram!(METRIC_INDEX_BUILD_MS).record(started.elapsed().as_secs_f64() * 1000.0);
        debug!(
            entries = snapshot.entries.len(),
            tokens = snapshot.postings.len(),
            "built search index snapshot"
        );
        snapshot
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slot_by_id.contains_key(id)
    }

    /// Free-text lookup. Each query token matches index tokens by prefix;
    /// an entry's score is the number of query tokens it matched. Results
    /// are ordered by score descending, then by indexing order, and capped
    /// at `limit`.
    pub fn query(&self, raw: &str, limit: usize) -> Vec<&SearchHit> {
        let tokens = tokenize(raw);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut scores: HashMap<usize, usize> = HashMap::new();
        for token in &tokens {
            for slot in self.slots_with_prefix(token) {
                *scores.entry(slot).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(usize, usize)> = scores.into_iter().collect();
        ranked.sort_by(|left, right| right.1.cmp(&left.1).then(left.0.cmp(&right.0)));
        ranked
            .into_iter()
            .take(limit)
            .map(|(slot, _)| &self.entries[slot])
            .collect()
    }

    fn slots_with_prefix(&self, prefix: &str) -> BTreeSet<usize> {
        let mut slots = BTreeSet::new();
        for (token, posting) in self
            .postings
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
        {
            if !token.starts_with(prefix) {
                break;
            }
            slots.extend(posting.iter().copied());
        }
        slots
    }

    /// Case-insensitive exact tag-name scan, newest first.
    pub fn by_tag(&self, tag: &str) -> Vec<&SearchHit> {
        let needle = tag.to_lowercase();
        let mut hits: Vec<&SearchHit> = self
            .entries
            .iter()
            .filter(|hit| hit.tags.iter().any(|name| name.to_lowercase() == needle))
            .collect();
        hits.sort_by(|left, right| right.sort_key().cmp(&left.sort_key()));
        hits
    }

    /// All entries of one category, newest first.
    pub fn by_kind(&self, kind: ContentKind) -> Vec<&SearchHit> {
        let mut hits: Vec<&SearchHit> =
            self.entries.iter().filter(|hit| hit.kind == kind).collect();
        hits.sort_by(|left, right| right.sort_key().cmp(&left.sort_key()));
        hits
    }

    /// Tag name → usage count and the categories it appears in, ordered by
    /// count descending with name ascending as the stable tie-break.
    pub fn tag_usage(&self) -> Vec<TagUsage> {
        let mut usage: BTreeMap<&str, (usize, BTreeSet<ContentKind>)> = BTreeMap::new();
        for hit in &self.entries {
            for name in &hit.tags {
                let slot = usage.entry(name.as_str()).or_default();
                slot.0 += 1;
                slot.1.insert(hit.kind);
            }
        }

        let mut tags: Vec<TagUsage> = usage
            .into_iter()
            .map(|(name, (count, kinds))| TagUsage {
                name: name.to_string(),
                count,
                kinds: kinds.into_iter().collect(),
            })
            .collect();
        tags.sort_by(|left, right| right.count.cmp(&left.count).then(left.name.cmp(&right.name)));
        tags
    }
}

/// Shared handle over the current index snapshot.
///
/// Uninitialized until the first [`initialize`](Self::initialize) or
/// [`rebuild`](Self::rebuild); all reads degrade to empty results until
/// then. A content refresh builds a fresh snapshot and swaps it in whole.
pub struct SearchService {
    snapshot: RwLock<Option<Arc<IndexSnapshot>>>,
}

impl SearchService {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(None),
        }
    }

    pub fn is_ready(&self) -> bool {
        rw_read(&self.snapshot, SOURCE, "is_ready").is_some()
    }

    /// Install the initial snapshot. A call while already initialized is a
    /// no-op; refreshing content goes through [`rebuild`](Self::rebuild).
    pub fn initialize(&self, content: Vec<SearchableContent>) {
        if self.is_ready() {
            debug!("search index already initialized, ignoring");
            return;
        }

        let built = Arc::new(IndexSnapshot::build(content));
        let mut slot = rw_write(&self.snapshot, SOURCE, "initialize");
        if slot.is_none() {
            *slot = Some(built);
        } else {
            debug!("search index initialized concurrently, discarding build");
        }
    }

    /// Replace the current snapshot with one built from `content`. In-flight
    /// reads keep the generation they already resolved.
    pub fn rebuild(&self, content: Vec<SearchableContent>) {
        let built = Arc::new(IndexSnapshot::build(content));
        *rw_write(&self.snapshot, SOURCE, "rebuild") = Some(built);
    }

    fn current(&self) -> Option<Arc<IndexSnapshot>> {
        rw_read(&self.snapshot, SOURCE, "current").clone()
    }

    /// Categorized free-text search. Empty or whitespace-only queries, and
    /// queries issued before initialization, return the empty result without
    /// touching the index.
    pub fn search(&self, query: &str, limit: usize) -> CategorizedResults {
        if query.trim().is_empty() {
            return CategorizedResults::empty();
        }
        let Some(snapshot) = self.current() else {
            return CategorizedResults::empty();
        };

        let hits = snapshot.query(query, limit).into_iter().cloned().collect();
        CategorizedResults::from_hits(hits)
    }

    /// Categorized exact-tag lookup, case-insensitive, newest first.
    pub fn search_by_tag(&self, tag: &str) -> CategorizedResults {
        let Some(snapshot) = self.current() else {
            return CategorizedResults::empty();
        };

        let hits = snapshot.by_tag(tag).into_iter().cloned().collect();
        CategorizedResults::from_hits(hits)
    }

    /// Tag usage across all indexed content; empty before initialization.
    pub fn all_tags(&self) -> Vec<TagUsage> {
        match self.current() {
            Some(snapshot) => snapshot.tag_usage(),
            None => Vec::new(),
        }
    }

    /// All indexed entries of one category, newest first.
    pub fn content_by_kind(&self, kind: ContentKind) -> Vec<SearchHit> {
        match self.current() {
            Some(snapshot) => snapshot.by_kind(kind).into_iter().cloned().collect(),
            None => Vec::new(),
        }
    }
}

impl Default for SearchService {
    fn default() -> Self {
        Self::new()
    }
}
