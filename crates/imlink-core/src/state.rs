//! Observable application state.
//!
//! Holds what the front end renders (the current link list, the loading
//! flag, the interface language) and notifies subscribers on every change.
//! Subscribers receive [`StateEvent`]s over `mpsc` channels in the order
//! the changes happened; dropped receivers are pruned on the next send.

use std::fmt;
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, Sender};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::link::Link;
use crate::store::{LinkStore, StoreError};
use crate::tag::TagId;

/// Interface language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "es" => Ok(Language::Es),
            "en" => Ok(Language::En),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

/// Change notifications sent to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    LoadingChanged(bool),
    /// The link list was replaced; carries the new length.
    LinksChanged(usize),
    LanguageChanged(Language),
}

/// Application state over a link store.
pub struct AppState<S: LinkStore> {
    store: S,
    links: Vec<Link>,
    is_loading: bool,
    language: Language,
    subscribers: Vec<Sender<StateEvent>>,
}

impl<S: LinkStore> AppState<S> {
    pub fn new(store: S) -> Self {
        Self::with_language(store, Language::default())
    }

    pub fn with_language(store: S, language: Language) -> Self {
        Self {
            store,
            links: Vec::new(),
            is_loading: false,
            language,
            subscribers: Vec::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Register a new subscriber.
    pub fn subscribe(&mut self) -> Receiver<StateEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, event: StateEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn set_links(&mut self, links: Vec<Link>) {
        let count = links.len();
        self.links = links;
        self.notify(StateEvent::LinksChanged(count));
    }

    pub fn set_loading(&mut self, value: bool) {
        if self.is_loading != value {
            self.is_loading = value;
            self.notify(StateEvent::LoadingChanged(value));
        }
    }

    pub fn set_language(&mut self, language: Language) {
        if self.language != language {
            self.language = language;
            self.notify(StateEvent::LanguageChanged(language));
        }
    }

    /// Replace the current view with every stored link.
    pub fn load_links(&mut self) -> Result<(), StoreError> {
        self.set_loading(true);
        let result = self.store.get_all_links();
        self.finish_load(result)
    }

    /// Replace the current view with the links matching `text` and all of
    /// `tag_ids`.
    pub fn search(&mut self, text: &str, tag_ids: &[TagId]) -> Result<(), StoreError> {
        self.set_loading(true);
        let result = self.store.search_links(text, tag_ids);
        self.finish_load(result)
    }

    fn finish_load(&mut self, result: Result<Vec<Link>, StoreError>) -> Result<(), StoreError> {
        match result {
            Ok(links) => {
                self.set_links(links);
                self.set_loading(false);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load links: {}", e);
                self.set_loading(false);
                Err(e)
            }
        }
    }
}
