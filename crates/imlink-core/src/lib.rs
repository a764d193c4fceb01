//! imlink-core: link and tag records, search, persistence, and import/export.
//!
//! Links are saved URLs with a title, description, pastel color and a list
//! of tag ids. Tags are lowercase labels. The two live in independent
//! collections behind the [`LinkStore`] trait; the SQLite backend keeps
//! them durable across restarts.

pub mod color;
pub mod config;
pub mod error;
pub mod link;
pub mod search;
pub mod state;
pub mod store;
pub mod tag;
pub mod transfer;

#[cfg(feature = "sqlite")]
pub mod sqlite_store;

pub use color::*;
pub use config::*;
pub use error::{ImlinkError, Result};
pub use link::*;
pub use search::*;
pub use state::*;
pub use store::*;
pub use tag::*;
pub use transfer::*;

#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteLinkStore;
