//! Link records.
//!
//! A link moves through three shapes: [`NewLink`] before it is stored,
//! [`Link`] once the store has assigned an id and creation time, and
//! [`LinkPatch`] for partial updates merged over a stored link.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;
use crate::tag::TagId;

/// Store-assigned link identifier (auto-incrementing).
pub type LinkId = i64;

/// Maximum title length the UI accepts. Not enforced by the store.
pub const DEFAULT_TITLE_MAX_LEN: usize = 50;

/// A stored link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: LinkId,
    pub title: String,
    pub description: String,
    pub url: String,
    pub color: String,
    /// Tag ids in the order the user attached them. May contain ids of
    /// tags that have since been deleted.
    pub tags: Vec<TagId>,
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// Merge the fields present in `patch` over this link.
    ///
    /// `id` and `created_at` are never touched.
    pub fn apply(&mut self, patch: LinkPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(url) = patch.url {
            self.url = url;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
    }

    /// Whether this link references the given tag.
    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.tags.iter().any(|t| t == tag_id)
    }
}

/// A link that has not been persisted yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLink {
    pub title: String,
    pub description: String,
    pub url: String,
    pub color: String,
    pub tags: Vec<TagId>,
}

impl NewLink {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<TagId>) -> Self {
        self.tags = tags;
        self
    }

    /// Check the form-level conventions: a non-empty url and a title no
    /// longer than `title_max_len` characters.
    pub fn validate(&self, title_max_len: usize) -> Result<(), StoreError> {
        if self.url.trim().is_empty() {
            return Err(StoreError::Validation("url must not be empty".to_string()));
        }
        validate_title(&self.title, title_max_len)
    }

    /// Materialize into a stored link.
    pub fn into_link(self, id: LinkId, created_at: DateTime<Utc>) -> Link {
        Link {
            id,
            title: self.title,
            description: self.description,
            url: self.url,
            color: self.color,
            tags: self.tags,
            created_at,
        }
    }
}

/// Reject titles longer than `max_len` characters.
pub fn validate_title(title: &str, max_len: usize) -> Result<(), StoreError> {
    let len = title.chars().count();
    if len > max_len {
        return Err(StoreError::Validation(format!(
            "title is {} characters, maximum is {}",
            len, max_len
        )));
    }
    Ok(())
}

/// Partial update for a stored link. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub color: Option<String>,
    pub tags: Option<Vec<TagId>>,
}

impl LinkPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.url.is_none()
            && self.color.is_none()
            && self.tags.is_none()
    }
}

/// Full-field replacement, which is what edit forms submit.
impl From<NewLink> for LinkPatch {
    fn from(link: NewLink) -> Self {
        Self {
            title: Some(link.title),
            description: Some(link.description),
            url: Some(link.url),
            color: Some(link.color),
            tags: Some(link.tags),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Link {
        NewLink::new("Docs", "https://docs.example")
            .with_description("reference")
            .with_color("hsl(200, 85%, 75%)")
            .with_tags(vec!["a".into(), "b".into()])
            .into_link(7, Utc::now())
    }

    #[test]
    fn apply_partial_patch_preserves_absent_fields() {
        let mut link = sample();
        let created = link.created_at;
        link.apply(LinkPatch {
            title: Some("Docs v2".into()),
            ..Default::default()
        });
        assert_eq!(link.title, "Docs v2");
        assert_eq!(link.url, "https://docs.example");
        assert_eq!(link.description, "reference");
        assert_eq!(link.tags, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(link.id, 7);
        assert_eq!(link.created_at, created);
    }

    #[test]
    fn full_patch_replaces_every_field() {
        let mut link = sample();
        let replacement = NewLink::new("Other", "https://other.example");
        link.apply(replacement.into());
        assert_eq!(link.title, "Other");
        assert_eq!(link.description, "");
        assert!(link.tags.is_empty());
    }

    #[test]
    fn validate_title_length() {
        let ok = NewLink::new("a".repeat(50), "https://x.example");
        assert!(ok.validate(DEFAULT_TITLE_MAX_LEN).is_ok());

        let long = NewLink::new("a".repeat(51), "https://x.example");
        assert!(matches!(
            long.validate(DEFAULT_TITLE_MAX_LEN),
            Err(StoreError::Validation(_))
        ));

        let no_url = NewLink::new("t", "  ");
        assert!(no_url.validate(DEFAULT_TITLE_MAX_LEN).is_err());

        // counted in characters, not bytes
        assert!(validate_title(&"é".repeat(50), DEFAULT_TITLE_MAX_LEN).is_ok());
    }

    #[test]
    fn serializes_with_camel_case_timestamp() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"tags\":[\"a\",\"b\"]"));
    }

    #[test]
    fn empty_patch() {
        assert!(LinkPatch::default().is_empty());
        assert!(!LinkPatch::from(NewLink::default()).is_empty());
    }
}
