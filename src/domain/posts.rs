//! The canonical published-post entity.
//!
//! A [`Post`] exists only for records whose upstream "published" flag was set
//! at fetch time; the published filter is part of every query the store
//! client issues, never applied after the fact. Posts carry no local
//! identity: each fetch rebuilds them from the upstream payload.

use serde::Serialize;
use time::OffsetDateTime;

/// A tag attached to a post, as assigned in the upstream store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRef {
    pub id: String,
    pub name: String,
}

/// A published post normalized from an upstream record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    /// Opaque stable identifier assigned by the upstream store.
    pub id: String,
    /// Upstream slug formula value, or the record id when the formula is
    /// empty. Unique among published posts at any point in time, but not
    /// stable across upstream formula edits.
    pub slug: String,
    pub title: String,
    pub description: String,
    /// First attached image URL; empty string when the record carries none.
    pub image: String,
    /// Unique by tag id, upstream order preserved.
    pub tags: Vec<TagRef>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// `None` means "unscheduled", which consumers must treat as distinct
    /// from any past or future date.
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    pub author_id: String,
}

impl Post {
    /// Recency key used wherever posts are ordered outside the upstream
    /// sort: publication time when scheduled, creation time otherwise.
    pub fn sort_key(&self) -> OffsetDateTime {
        self.published_at.unwrap_or(self.created_at)
    }

    pub fn tag_ids(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|tag| tag.id.as_str())
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|tag| tag.name.clone()).collect()
    }
}

/// Slug rule: the upstream formula value when it is non-empty, otherwise the
/// record id.
pub fn slug_or_id(formula: Option<&str>, id: &str) -> String {
    match formula {
        Some(slug) if !slug.trim().is_empty() => slug.to_string(),
        _ => id.to_string(),
    }
}

/// Deduplicate tags by id, keeping the first occurrence and upstream order.
pub fn dedupe_tags(tags: Vec<TagRef>) -> Vec<TagRef> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .filter(|tag| seen.insert(tag.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn minimal_post() -> Post {
        Post {
            id: "rec-1".to_string(),
            slug: "rec-1".to_string(),
            title: "Untitled".to_string(),
            description: String::new(),
            image: String::new(),
            tags: Vec::new(),
            created_at: datetime!(2024-01-01 00:00 UTC),
            updated_at: datetime!(2024-01-02 00:00 UTC),
            published_at: None,
            author_id: String::new(),
        }
    }

    #[test]
    fn sort_key_prefers_publication_time() {
        let mut post = minimal_post();
        assert_eq!(post.sort_key(), datetime!(2024-01-01 00:00 UTC));

        post.published_at = Some(datetime!(2024-03-01 12:00 UTC));
        assert_eq!(post.sort_key(), datetime!(2024-03-01 12:00 UTC));
    }

    #[test]
    fn slug_falls_back_to_id() {
        assert_eq!(slug_or_id(Some("hello-world"), "rec-1"), "hello-world");
        assert_eq!(slug_or_id(Some("   "), "rec-1"), "rec-1");
        assert_eq!(slug_or_id(None, "rec-1"), "rec-1");
    }

    #[test]
    fn tags_dedupe_by_id_keeping_order() {
        let tags = vec![
            TagRef {
                id: "t1".to_string(),
                name: "rust".to_string(),
            },
            TagRef {
                id: "t2".to_string(),
                name: "async".to_string(),
            },
            TagRef {
                id: "t1".to_string(),
                name: "rust-again".to_string(),
            },
        ];

        let deduped = dedupe_tags(tags);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].id, "t1");
        assert_eq!(deduped[0].name, "rust");
        assert_eq!(deduped[1].id, "t2");
    }

    #[test]
    fn timestamps_serialize_as_rfc3339() {
        let post = minimal_post();
        let json = serde_json::to_value(&post).expect("serialized post");
        assert_eq!(json["created_at"], "2024-01-01T00:00:00Z");
        assert_eq!(json["updated_at"], "2024-01-02T00:00:00Z");
        assert!(json["published_at"].is_null());
    }
}
