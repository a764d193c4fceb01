//! Staged import of parsed bookmarks into a link store.
//!
//! Parsed bookmarks are staged with a selection flag (all selected at
//! first). Once started, the session walks the selected bookmarks one at a
//! time; for each, the caller may edit the title, description, color and
//! tags before saving it as a link. Description and tags reset after every
//! save; the color carries over.

use imlink_core::{
    pastelize, ColorError, LinkStore, NewLink, StoreError, TagId, DEFAULT_LINK_COLOR, UNTITLED,
};
use tracing::{debug, info};

use crate::node::Bookmark;
use crate::parser::{parse_and_flatten, ParseError};

/// A parsed bookmark awaiting selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedBookmark {
    pub bookmark: Bookmark,
    pub selected: bool,
}

/// Editable fields for the bookmark currently being imported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub description: String,
    /// Pastelized `hsl(...)` string
    pub color: String,
    pub tags: Vec<TagId>,
}

/// Where the session stands after a save or skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Another bookmark is current; `position` is 1-based.
    Next { position: usize, total: usize },
    /// Every selected bookmark has been handled.
    Finished { saved: usize, skipped: usize },
}

/// State machine for the bookmark import flow.
#[derive(Debug, Clone)]
pub struct ImportSession {
    staged: Vec<StagedBookmark>,
    /// Indices into `staged` captured by `start`
    queue: Vec<usize>,
    cursor: Option<usize>,
    draft: Draft,
    saved: usize,
    skipped: usize,
}

impl ImportSession {
    /// Stage bookmarks, all selected. Missing titles become "untitled".
    pub fn new(bookmarks: Vec<Bookmark>) -> Self {
        let staged = bookmarks
            .into_iter()
            .map(|mut bookmark| {
                if bookmark.title.trim().is_empty() {
                    bookmark.title = UNTITLED.to_string();
                }
                StagedBookmark {
                    bookmark,
                    selected: true,
                }
            })
            .collect();

        Self {
            staged,
            queue: Vec::new(),
            cursor: None,
            draft: Draft {
                color: pastelize(DEFAULT_LINK_COLOR).unwrap_or_default(),
                ..Default::default()
            },
            saved: 0,
            skipped: 0,
        }
    }

    /// Parse a bookmark document and stage its flattened links.
    pub fn from_document(text: &str) -> Result<Self, ParseError> {
        let bookmarks = parse_and_flatten(text)?;
        debug!(count = bookmarks.len(), "staged bookmarks");
        Ok(Self::new(bookmarks))
    }

    pub fn staged(&self) -> &[StagedBookmark] {
        &self.staged
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Flip the selection of one bookmark. Returns the new state, or
    /// `None` for an out-of-range index.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let entry = self.staged.get_mut(index)?;
        entry.selected = !entry.selected;
        Some(entry.selected)
    }

    pub fn set_selected(&mut self, index: usize, selected: bool) {
        if let Some(entry) = self.staged.get_mut(index) {
            entry.selected = selected;
        }
    }

    pub fn select_all(&mut self, selected: bool) {
        for entry in &mut self.staged {
            entry.selected = selected;
        }
    }

    pub fn selected_count(&self) -> usize {
        self.staged.iter().filter(|s| s.selected).count()
    }

    pub fn all_selected(&self) -> bool {
        self.selected_count() == self.staged.len()
    }

    /// Begin walking the selected bookmarks. Returns false if none are
    /// selected.
    pub fn start(&mut self) -> bool {
        self.queue = self
            .staged
            .iter()
            .enumerate()
            .filter(|(_, s)| s.selected)
            .map(|(i, _)| i)
            .collect();
        if self.queue.is_empty() {
            self.cursor = None;
            return false;
        }
        self.saved = 0;
        self.skipped = 0;
        self.move_to(0);
        true
    }

    pub fn is_importing(&self) -> bool {
        self.cursor.is_some()
    }

    /// Bookmark currently being imported.
    pub fn current(&self) -> Option<&Bookmark> {
        let index = *self.queue.get(self.cursor?)?;
        self.staged.get(index).map(|s| &s.bookmark)
    }

    /// 1-based position and total, e.g. `(3, 10)` for "3 of 10".
    pub fn position(&self) -> Option<(usize, usize)> {
        self.cursor.map(|c| (c + 1, self.queue.len()))
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.draft.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
    }

    /// Set the color from a `#RRGGBB` pick; it is stored pastelized.
    pub fn set_color(&mut self, hex: &str) -> Result<(), ColorError> {
        self.draft.color = pastelize(hex)?;
        Ok(())
    }

    pub fn set_tags(&mut self, tags: Vec<TagId>) {
        self.draft.tags = tags;
    }

    /// Save the current bookmark as a link and move on.
    ///
    /// On failure (a duplicate url, typically) the session stays on the
    /// same bookmark so the caller can edit, retry or skip.
    pub fn save_current<S: LinkStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<Progress, StoreError> {
        let Some(bookmark) = self.current() else {
            return Ok(self.finished());
        };

        let link = NewLink::new(self.draft.title.clone(), bookmark.url.clone())
            .with_description(self.draft.description.clone())
            .with_color(self.draft.color.clone())
            .with_tags(self.draft.tags.clone());
        let id = store.add_link(link)?;
        debug!(id, "saved bookmark as link");

        self.saved += 1;
        Ok(self.advance())
    }

    /// Move past the current bookmark without saving it.
    pub fn skip(&mut self) -> Progress {
        if self.cursor.is_some() {
            self.skipped += 1;
        }
        self.advance()
    }

    /// Drop everything: staged bookmarks, selection and progress.
    pub fn cancel(&mut self) {
        self.staged.clear();
        self.queue.clear();
        self.cursor = None;
        self.draft.description.clear();
        self.draft.tags.clear();
    }

    fn advance(&mut self) -> Progress {
        let next = self.cursor.map_or(self.queue.len(), |c| c + 1);
        if next < self.queue.len() {
            self.move_to(next);
            Progress::Next {
                position: next + 1,
                total: self.queue.len(),
            }
        } else {
            self.cursor = None;
            info!(saved = self.saved, skipped = self.skipped, "bookmark import finished");
            self.finished()
        }
    }

    fn move_to(&mut self, cursor: usize) {
        self.cursor = Some(cursor);
        self.draft.title = self
            .current()
            .map(|b| b.title.clone())
            .unwrap_or_default();
        self.draft.description.clear();
        self.draft.tags.clear();
    }

    fn finished(&self) -> Progress {
        Progress::Finished {
            saved: self.saved,
            skipped: self.skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imlink_core::SqliteLinkStore;

    fn session() -> ImportSession {
        ImportSession::new(vec![
            Bookmark::new("A", "https://a.example"),
            Bookmark::new("", "https://b.example"),
            Bookmark::new("C", "https://c.example"),
        ])
    }

    #[test]
    fn stages_everything_selected_with_title_fallback() {
        let s = session();
        assert_eq!(s.selected_count(), 3);
        assert!(s.all_selected());
        assert_eq!(s.staged()[1].bookmark.title, UNTITLED);
        assert_eq!(s.draft().color, "hsl(239, 85%, 75%)");
    }

    #[test]
    fn selection_controls() {
        let mut s = session();
        assert_eq!(s.toggle(0), Some(false));
        assert_eq!(s.toggle(9), None);
        assert_eq!(s.selected_count(), 2);
        s.select_all(false);
        assert_eq!(s.selected_count(), 0);
        assert!(!s.start());
        s.set_selected(2, true);
        assert_eq!(s.selected_count(), 1);
    }

    #[test]
    fn walks_selected_and_saves() {
        let store = SqliteLinkStore::open_in_memory().unwrap();
        let mut s = session();
        s.toggle(1);
        assert!(s.start());
        assert_eq!(s.position(), Some((1, 2)));
        assert_eq!(s.draft().title, "A");

        s.set_title("A renamed");
        s.set_description("first");
        s.set_color("#00ff00").unwrap();
        s.set_tags(vec!["t".into()]);
        assert_eq!(
            s.save_current(&store).unwrap(),
            Progress::Next {
                position: 2,
                total: 2
            }
        );

        // description and tags reset, color carries over
        assert_eq!(s.current().unwrap().url, "https://c.example");
        assert_eq!(s.draft().title, "C");
        assert!(s.draft().description.is_empty());
        assert!(s.draft().tags.is_empty());
        assert_eq!(s.draft().color, "hsl(120, 85%, 75%)");

        assert_eq!(
            s.save_current(&store).unwrap(),
            Progress::Finished {
                saved: 2,
                skipped: 0
            }
        );
        assert!(!s.is_importing());

        let links = store.get_all_links().unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].title, "A renamed");
        assert_eq!(links[0].description, "first");
        assert_eq!(links[0].tags, vec!["t".to_string()]);
        assert_eq!(links[1].color, "hsl(120, 85%, 75%)");
    }

    #[test]
    fn duplicate_stays_on_current_until_skipped() {
        let store = SqliteLinkStore::open_in_memory().unwrap();
        store
            .add_link(NewLink::new("existing", "https://a.example"))
            .unwrap();

        let mut s = session();
        s.start();
        let err = s.save_current(&store).unwrap_err();
        assert!(err.is_duplicate_url());
        assert_eq!(s.position(), Some((1, 3)));

        assert_eq!(
            s.skip(),
            Progress::Next {
                position: 2,
                total: 3
            }
        );
        s.save_current(&store).unwrap();
        s.skip();
        assert!(!s.is_importing());
        assert_eq!(store.get_all_links().unwrap().len(), 2);
    }

    #[test]
    fn invalid_color_is_rejected() {
        let mut s = session();
        let before = s.draft().color.clone();
        assert!(s.set_color("blue").is_err());
        assert_eq!(s.draft().color, before);
    }

    #[test]
    fn cancel_clears_session() {
        let mut s = session();
        s.start();
        s.cancel();
        assert!(s.is_empty());
        assert!(!s.is_importing());
        assert_eq!(s.current(), None);
    }

    #[test]
    fn from_document_stages_flattened_links() {
        let s = ImportSession::from_document(
            "<DL><DT><H3>F</H3><DL><DT><A HREF=\"https://x.example\">X</A></DL></DL>",
        )
        .unwrap();
        assert_eq!(s.staged().len(), 1);
        assert!(ImportSession::from_document("<p>nothing</p>").is_err());
    }
}
