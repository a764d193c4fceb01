//! In-memory search over the full link set.
//!
//! Matching is a plain predicate: there is no ranking, and results keep
//! the order of the input.

use serde::{Deserialize, Serialize};

use crate::link::Link;
use crate::tag::TagId;

/// Text plus required tags. An empty field matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    /// Every id listed here must be present on a link (AND).
    pub tag_ids: Vec<TagId>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, tag_ids: Vec<TagId>) -> Self {
        Self {
            text: text.into(),
            tag_ids,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.tag_ids.is_empty()
    }

    /// Case-insensitive substring match on title or description.
    pub fn matches_text(&self, link: &Link) -> bool {
        if self.text.is_empty() {
            return true;
        }
        let needle = self.text.to_lowercase();
        link.title.to_lowercase().contains(&needle)
            || link.description.to_lowercase().contains(&needle)
    }

    pub fn matches_tags(&self, link: &Link) -> bool {
        self.tag_ids.iter().all(|tag| link.has_tag(tag))
    }

    pub fn matches(&self, link: &Link) -> bool {
        self.matches_text(link) && self.matches_tags(link)
    }
}

/// Keep the links matching `query`, preserving their order.
pub fn filter_links(links: Vec<Link>, query: &SearchQuery) -> Vec<Link> {
    if query.is_empty() {
        return links;
    }
    links.into_iter().filter(|link| query.matches(link)).collect()
}
