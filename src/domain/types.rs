//! Shared domain enumerations.

use serde::{Deserialize, Serialize};

/// Category of a searchable content item, used to partition search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Journal,
    Project,
    Video,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Journal => "journal",
            ContentKind::Project => "project",
            ContentKind::Video => "video",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ContentKind {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "journal" => Ok(ContentKind::Journal),
            "project" => Ok(ContentKind::Project),
            "video" => Ok(ContentKind::Video),
            _ => Err(()),
        }
    }
}
