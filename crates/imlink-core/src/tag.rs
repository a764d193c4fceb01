//! Tag records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unique tag identifier (UUID v4 rendered as a string).
pub type TagId = String;

/// Generate a fresh tag id.
pub fn new_tag_id() -> TagId {
    uuid::Uuid::new_v4().to_string()
}

/// Canonical form of a tag title.
pub fn normalize_tag_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// A named label referenced by id from links.
///
/// Title uniqueness is not enforced anywhere; two tags may share a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// Create a new tag with a generated id, stamped now.
    pub fn new(title: &str) -> Self {
        Self {
            id: new_tag_id(),
            title: normalize_tag_title(title),
            created_at: Utc::now(),
        }
    }

    /// Rebuild a tag from stored or imported parts, normalizing the title.
    pub fn from_parts(id: TagId, title: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: normalize_tag_title(title),
            created_at,
        }
    }
}
