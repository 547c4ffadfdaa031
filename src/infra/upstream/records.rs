//! Raw upstream record schema and its normalization into domain posts.
//!
//! The schema declares every field the normalizer touches; nothing is read
//! through untyped lookups. Only the identity fields (`id`, `created_time`)
//! are required — a record failing those aborts the page it arrived on,
//! while malformed optional fields degrade per-field.

use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

use crate::application::store::StoreError;
use crate::domain::posts::{self, Post, TagRef};

/// A record as returned by the upstream query endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub last_edited_time: Option<String>,
    #[serde(default)]
    pub created_by: Option<RawActor>,
    #[serde(default)]
    pub properties: RawProperties,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawActor {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProperties {
    #[serde(default, rename = "Name")]
    pub name: Option<RawTitle>,
    #[serde(default, rename = "Description")]
    pub description: Option<RawRichText>,
    #[serde(default, rename = "Slug")]
    pub slug: Option<RawFormula>,
    #[serde(default, rename = "Image")]
    pub image: Option<RawFiles>,
    #[serde(default, rename = "When")]
    pub when: Option<RawDate>,
    #[serde(default, rename = "Tags")]
    pub tags: Option<RawMultiSelect>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTitle {
    #[serde(default)]
    pub title: Option<Vec<RawTextRun>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRichText {
    #[serde(default)]
    pub rich_text: Option<Vec<RawTextRun>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTextRun {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFormula {
    #[serde(default)]
    pub formula: Option<RawFormulaValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFormulaValue {
    #[serde(default)]
    pub string: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFiles {
    #[serde(default)]
    pub files: Vec<RawFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFile {
    #[serde(default)]
    pub file: Option<RawFileUrl>,
    #[serde(default)]
    pub external: Option<RawFileUrl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFileUrl {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDate {
    #[serde(default)]
    pub date: Option<RawDateValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDateValue {
    #[serde(default)]
    pub start: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMultiSelect {
    #[serde(default)]
    pub multi_select: Vec<RawSelectOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSelectOption {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl RawRecord {
    /// Total normalization into a [`Post`] per the field rules: identity
    /// fields are required, everything else has a defined default.
    pub fn normalize(self) -> Result<Post, StoreError> {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreError::integrity("record is missing its id"))?;

        let created_raw = self.created_time.ok_or_else(|| {
            StoreError::integrity(format!("record `{id}` is missing created_time"))
        })?;
        let created_at = OffsetDateTime::parse(&created_raw, &Rfc3339).map_err(|err| {
            StoreError::integrity(format!("record `{id}` has unparseable created_time: {err}"))
        })?;

        let updated_at = match self.last_edited_time.as_deref() {
            Some(raw) => match OffsetDateTime::parse(raw, &Rfc3339) {
                Ok(parsed) => parsed,
                Err(error) => {
                    warn!(record = %id, %error, "ignoring malformed last_edited_time");
                    created_at
                }
            },
            None => created_at,
        };

        let RawProperties {
            name,
            description,
            slug,
            image,
            when,
            tags,
        } = self.properties;

        let published_at = match when.and_then(|p| p.date).and_then(|d| d.start) {
            Some(raw) => match OffsetDateTime::parse(&raw, &Rfc3339) {
                Ok(parsed) => Some(parsed),
                Err(error) => {
                    warn!(record = %id, %error, "ignoring malformed publication date");
                    None
                }
            },
            None => None,
        };

        let slug_formula = slug.and_then(|p| p.formula).and_then(|f| f.string);
        let tag_refs = tags
            .map(|p| {
                p.multi_select
                    .into_iter()
                    .map(|option| TagRef {
                        id: option.id,
                        name: option.name,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Post {
            slug: posts::slug_or_id(slug_formula.as_deref(), &id),
            title: plain_text_or(name.and_then(|p| p.title), "Untitled"),
            description: plain_text_or(description.and_then(|p| p.rich_text), ""),
            image: first_image_url(image).unwrap_or_default(),
            tags: posts::dedupe_tags(tag_refs),
            created_at,
            updated_at,
            published_at,
            author_id: self
                .created_by
                .and_then(|actor| actor.id)
                .unwrap_or_default(),
            id,
        })
    }
}

/// Rich-text runs join with single spaces; an absent property takes the
/// supplied default, while a present-but-empty run list joins to `""`.
fn plain_text_or(runs: Option<Vec<RawTextRun>>, default: &str) -> String {
    match runs {
        Some(runs) => runs
            .iter()
            .map(|run| run.plain_text.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        None => default.to_string(),
    }
}

fn first_image_url(image: Option<RawFiles>) -> Option<String> {
    let first = image?.files.into_iter().next()?;
    let url = first.file.or(first.external)?.url;
    if url.is_empty() { None } else { Some(url) }
}
