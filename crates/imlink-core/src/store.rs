use chrono::{DateTime, Utc};

use crate::link::{Link, LinkId, LinkPatch, NewLink};
use crate::search::{filter_links, SearchQuery};
use crate::tag::{Tag, TagId};

/// The trait that all link/tag storage backends implement.
///
/// Links and tags are two independent collections. A link's `tags` field
/// is a weak reference: nothing here keeps it in sync with the tag
/// collection.
pub trait LinkStore: Send + Sync {
    /// Store a link with an explicit creation time. Fails with
    /// [`StoreError::DuplicateUrl`] if any stored link already has the url.
    fn insert_link(&self, link: NewLink, created_at: DateTime<Utc>) -> Result<LinkId, StoreError>;

    /// Merge `patch` over the stored link. Fails with `NotFound` if the id
    /// is absent and `DuplicateUrl` if another link owns the resulting url.
    fn update_link(&self, id: LinkId, patch: LinkPatch) -> Result<(), StoreError>;

    /// Get a link by ID.
    fn get_link(&self, id: LinkId) -> Result<Option<Link>, StoreError>;

    /// Every stored link, in store order.
    fn get_all_links(&self) -> Result<Vec<Link>, StoreError>;

    /// Remove a link. Absent ids are not an error.
    fn delete_link(&self, id: LinkId) -> Result<(), StoreError>;

    /// Store a fully-formed tag, keeping its id and timestamp.
    fn insert_tag(&self, tag: Tag) -> Result<TagId, StoreError>;

    /// Replace a tag's title (lowercased). Fails with `NotFound` if absent.
    fn update_tag(&self, id: &str, title: &str) -> Result<(), StoreError>;

    /// Get a tag by ID.
    fn get_tag(&self, id: &str) -> Result<Option<Tag>, StoreError>;

    fn get_all_tags(&self) -> Result<Vec<Tag>, StoreError>;

    /// Remove a tag. Links referencing it are left untouched.
    fn delete_tag(&self, id: &str) -> Result<(), StoreError>;

    /// Store a new link stamped now.
    fn add_link(&self, link: NewLink) -> Result<LinkId, StoreError> {
        self.insert_link(link, Utc::now())
    }

    /// Store a new tag with a generated id and lowercased title.
    /// Duplicate titles are allowed.
    fn add_tag(&self, title: &str) -> Result<TagId, StoreError> {
        self.insert_tag(Tag::new(title))
    }

    /// Resolve tag ids, silently dropping the ones that no longer exist.
    /// Order follows `ids`.
    fn get_tags_by_ids(&self, ids: &[TagId]) -> Result<Vec<Tag>, StoreError> {
        let mut tags = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(tag) = self.get_tag(id)? {
                tags.push(tag);
            }
        }
        Ok(tags)
    }

    /// Full scan followed by the search predicate.
    fn search_links(&self, text: &str, tag_ids: &[TagId]) -> Result<Vec<Link>, StoreError> {
        let query = SearchQuery::new(text, tag_ids.to_vec());
        Ok(filter_links(self.get_all_links()?, &query))
    }
}

/// Errors from the link store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("A link with this URL already exists: {0}")]
    DuplicateUrl(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl StoreError {
    /// Duplicate urls are surfaced to the user as a warning rather than a
    /// generic failure.
    pub fn is_duplicate_url(&self) -> bool {
        matches!(self, StoreError::DuplicateUrl(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
