//! imlink-bookmarks: read browser bookmark exports and import them as links.
//!
//! Chrome, Firefox, Safari and Edge all export the Netscape bookmark format.
//! [`parse_bookmarks`] turns one into a folder tree, [`flatten`] reduces the
//! tree to links, and [`ImportSession`] walks the user's selection into a
//! [`imlink_core::LinkStore`].
//!
//! # Example
//!
//! ```
//! use imlink_bookmarks::parse_and_flatten;
//!
//! let html = r#"<DL><p><DT><H3>Work</H3><DL><p>
//!     <DT><A HREF="https://mail.example">Mail</A></DL><p>
//!     <DT><A HREF="https://docs.example">Docs</A></DL>"#;
//! let links = parse_and_flatten(html).unwrap();
//! assert_eq!(links.len(), 2);
//! assert_eq!(links[0].title, "Mail");
//! ```

mod lexer;
pub mod node;
pub mod parser;
pub mod session;

pub use lexer::decode_entities;
pub use node::{flatten, Bookmark, BookmarkNode};
pub use parser::{parse_and_flatten, parse_bookmarks, ParseError, MAX_DEPTH};
pub use session::{Draft, ImportSession, Progress, StagedBookmark};
