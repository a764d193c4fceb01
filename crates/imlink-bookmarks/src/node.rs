//! Bookmark tree and flat records.

use serde::{Deserialize, Serialize};

/// One entry of a parsed bookmark document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BookmarkNode {
    Folder {
        title: String,
        children: Vec<BookmarkNode>,
    },
    /// `url` is empty when the anchor had no `HREF`.
    Link { title: String, url: String },
}

impl BookmarkNode {
    pub fn title(&self) -> &str {
        match self {
            BookmarkNode::Folder { title, .. } | BookmarkNode::Link { title, .. } => title,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, BookmarkNode::Folder { .. })
    }
}

/// A leaf link, as produced by [`flatten`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub title: String,
    pub url: String,
}

impl Bookmark {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Depth-first walk emitting every link with a url, in document order.
/// Folders contribute only their descendants.
pub fn flatten(nodes: &[BookmarkNode]) -> Vec<Bookmark> {
    let mut out = Vec::new();
    flatten_into(nodes, &mut out);
    out
}

fn flatten_into(nodes: &[BookmarkNode], out: &mut Vec<Bookmark>) {
    for node in nodes {
        match node {
            BookmarkNode::Link { title, url } => {
                if !url.is_empty() {
                    out.push(Bookmark::new(title.clone(), url.clone()));
                }
            }
            BookmarkNode::Folder { children, .. } => flatten_into(children, out),
        }
    }
}
