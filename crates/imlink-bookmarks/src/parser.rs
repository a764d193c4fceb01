//! Netscape bookmark file parser.
//!
//! Handles the format every major browser exports:
//! - `<DL><p>` lists whose entries are `<DT>` items
//! - folders: `<DT><H3>Title</H3>` followed by a nested `<DL>`
//! - links: `<DT><A HREF="...">Title</A>`, optionally followed by `<DD>`
//! - unclosed `<DT>`, `<DD>` and `<p>` tags
//!
//! Only the direct `DT` children of each list are considered; a `DT` with
//! neither a heading nor an anchor is skipped.

use tracing::debug;

use crate::lexer::{decode_entities, tokenize, Token};
use crate::node::{flatten, Bookmark, BookmarkNode};

/// Deepest list nesting accepted. Real exports stay far below this.
pub const MAX_DEPTH: usize = 256;

/// Error type for parsing failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Bookmark file is empty")]
    Empty,
    #[error("No bookmark list (<DL>) found in document")]
    NoBookmarkList,
    #[error("Bookmark lists nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Parse a bookmark document into its folder tree.
pub fn parse_bookmarks(input: &str) -> Result<Vec<BookmarkNode>, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let tokens = tokenize(input);
    let mut cursor = Cursor::new(&tokens);
    let mut nodes = Vec::new();
    let mut found_list = false;

    while let Some(token) = cursor.next() {
        if token.is_start("DL") {
            found_list = true;
            nodes.extend(cursor.list()?);
        }
    }

    if !found_list {
        return Err(ParseError::NoBookmarkList);
    }
    debug!(top_level = nodes.len(), "parsed bookmark document");
    Ok(nodes)
}

/// Parse and flatten in one step.
pub fn parse_and_flatten(input: &str) -> Result<Vec<Bookmark>, ParseError> {
    Ok(flatten(&parse_bookmarks(input)?))
}

struct Cursor<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    /// Lists currently open
    depth: usize,
}

impl<'t, 'a> Cursor<'t, 'a> {
    fn new(tokens: &'t [Token<'a>]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'t Token<'a>> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Entries of a list whose `<DL>` was just consumed, up to and
    /// including its `</DL>` (or end of input).
    fn list(&mut self) -> Result<Vec<BookmarkNode>, ParseError> {
        if self.depth == MAX_DEPTH {
            return Err(ParseError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;

        let mut nodes = Vec::new();
        while let Some(token) = self.next() {
            if token.is_end("DL") {
                break;
            } else if token.is_start("DT") {
                if let Some(node) = self.entry()? {
                    nodes.push(node);
                }
            } else if token.is_start("DL") {
                // A list that isn't inside an entry has no folder to belong to.
                self.list()?;
            }
        }

        self.depth -= 1;
        Ok(nodes)
    }

    /// Contents of a `<DT>` up to the next sibling entry or the end of the
    /// enclosing list. Neither terminator is consumed. A `<DD>` description
    /// is passed over, so a folder's list may follow it.
    fn entry(&mut self) -> Result<Option<BookmarkNode>, ParseError> {
        let mut node: Option<BookmarkNode> = None;

        while let Some(token) = self.peek() {
            if token.is_start("DT") || token.is_end("DL") {
                break;
            }
            self.pos += 1;

            if token.is_start("H3") {
                let title = self.text_until("H3");
                let children = match node {
                    Some(BookmarkNode::Folder { children, .. }) => children,
                    _ => Vec::new(),
                };
                node = Some(BookmarkNode::Folder { title, children });
            } else if token.is_start("A") {
                let url = token.attr("HREF").unwrap_or_default();
                let title = self.text_until("A");
                if node.is_none() {
                    node = Some(BookmarkNode::Link { title, url });
                }
            } else if token.is_start("DL") {
                let nested = self.list()?;
                if let Some(BookmarkNode::Folder { children, .. }) = node.as_mut() {
                    children.extend(nested);
                }
            }
        }

        Ok(node)
    }

    /// Text content up to the closing tag, entity-decoded and trimmed.
    /// Stops early at list structure so a missing close tag can't swallow
    /// the rest of the document.
    fn text_until(&mut self, element: &str) -> String {
        let mut text = String::new();
        while let Some(token) = self.peek() {
            if token.is_end(element) {
                self.pos += 1;
                break;
            }
            if ends_entry(token) || token.is_start("DL") {
                break;
            }
            if let Token::Text(s) = token {
                text.push_str(&decode_entities(s));
            }
            self.pos += 1;
        }
        text.trim().to_string()
    }
}

fn ends_entry(token: &Token<'_>) -> bool {
    token.is_start("DT") || token.is_start("DD") || token.is_end("DL")
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORK_DOCS: &str = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<TITLE>Bookmarks</TITLE>
<H1>Bookmarks</H1>
<DL><p>
    <DT><H3>Work</H3>
    <DL><p>
        <DT><A HREF="https://mail.example">Mail</A>
    </DL><p>
    <DT><A HREF="https://docs.example">Docs</A>
</DL><p>
"#;

    #[test]
    fn work_folder_and_top_level_link() {
        let tree = parse_bookmarks(WORK_DOCS).unwrap();
        assert_eq!(
            tree,
            vec![
                BookmarkNode::Folder {
                    title: "Work".into(),
                    children: vec![BookmarkNode::Link {
                        title: "Mail".into(),
                        url: "https://mail.example".into(),
                    }],
                },
                BookmarkNode::Link {
                    title: "Docs".into(),
                    url: "https://docs.example".into(),
                },
            ]
        );

        assert_eq!(
            flatten(&tree),
            vec![
                Bookmark::new("Mail", "https://mail.example"),
                Bookmark::new("Docs", "https://docs.example"),
            ]
        );
    }

    #[test]
    fn entries_without_marker_are_ignored() {
        let doc = "<DL><p><DT>just text<DT><HR><DT><A HREF='u'>ok</A></DL>";
        let tree = parse_bookmarks(doc).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].title(), "ok");
    }

    #[test]
    fn descriptions_do_not_leak_into_entries() {
        let doc = r#"<DL><p>
<DT><A HREF="https://a.example">A</A>
<DD>All about A
<DT><A HREF="https://b.example">B</A>
</DL>"#;
        let flat = parse_and_flatten(doc).unwrap();
        assert_eq!(
            flat,
            vec![
                Bookmark::new("A", "https://a.example"),
                Bookmark::new("B", "https://b.example"),
            ]
        );
    }

    #[test]
    fn folder_description_keeps_children() {
        let doc = r#"<DL><p>
<DT><H3>Toolbar</H3>
<DD>Shown on the toolbar
<DL><p><DT><A HREF="https://a.example">A</A></DL><p>
</DL>"#;
        let tree = parse_bookmarks(doc).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(flatten(&tree), vec![Bookmark::new("A", "https://a.example")]);
    }

    #[test]
    fn decodes_titles_and_urls() {
        let doc = r#"<DL><DT><A HREF="https://x.example/?a=1&amp;b=2">Tom &amp; Jerry</A></DL>"#;
        let flat = parse_and_flatten(doc).unwrap();
        assert_eq!(flat[0].title, "Tom & Jerry");
        assert_eq!(flat[0].url, "https://x.example/?a=1&b=2");
    }

    #[test]
    fn unterminated_list_is_tolerated() {
        let doc = "<DL><p><DT><H3>F</H3><DL><p><DT><A HREF=\"u\">x</A>";
        let flat = parse_and_flatten(doc).unwrap();
        assert_eq!(flat, vec![Bookmark::new("x", "u")]);
    }

    #[test]
    fn missing_list_is_an_error() {
        assert_eq!(
            parse_bookmarks("<html><body><p>hello</p></body></html>"),
            Err(ParseError::NoBookmarkList)
        );
        assert_eq!(parse_bookmarks("  \n"), Err(ParseError::Empty));
    }

    #[test]
    fn nesting_limit() {
        let deep = "<DL><DT><H3>f</H3>".repeat(5_000);
        assert_eq!(parse_bookmarks(&deep), Err(ParseError::TooDeep(MAX_DEPTH)));
        let bare = "<DL>".repeat(200_000);
        assert_eq!(parse_bookmarks(&bare), Err(ParseError::TooDeep(MAX_DEPTH)));

        let mut doc = "<DL><DT><H3>f</H3>".repeat(MAX_DEPTH - 1);
        doc.push_str("<DL><DT><A HREF=\"https://deep.example\">deep</A>");
        let flat = parse_and_flatten(&doc).unwrap();
        assert_eq!(flat, vec![Bookmark::new("deep", "https://deep.example")]);
    }

    #[test]
    fn empty_list_yields_no_nodes() {
        assert!(parse_bookmarks("<DL><p></DL><p>").unwrap().is_empty());
    }
}
