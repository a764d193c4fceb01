//! JSON export and import of the whole store.
//!
//! The export document has two top-level arrays, `links` and `tags`, with
//! RFC 3339 timestamps. Import parses the whole document up front (a
//! syntax error writes nothing), then inserts records one by one: tags
//! first, then links. Per-record failures are collected, not rolled back.
//! Older exports that are a bare array of links are accepted too.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::link::{Link, NewLink};
use crate::store::{LinkStore, StoreError};
use crate::tag::{new_tag_id, Tag, TagId};

/// File name used when exporting without an explicit destination.
pub const EXPORT_FILE_NAME: &str = "utility-links-export.json";

/// Title given to imported records that have none.
pub const UNTITLED: &str = "untitled";

/// Errors from import/export.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("Malformed import data: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Full snapshot of both collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub links: Vec<Link>,
    pub tags: Vec<Tag>,
}

/// A link as found in an import file. Every field is optional; a missing
/// url is reported when the record is imported.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkRecord {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub color: Option<String>,
    pub tags: Vec<TagId>,
    pub created_at: Option<DateTime<Utc>>,
}

impl LinkRecord {
    fn into_new_link(self) -> Result<(NewLink, DateTime<Utc>), StoreError> {
        let url = self
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| StoreError::Validation("link record has no url".to_string()))?;
        let link = NewLink {
            title: non_empty_or_untitled(self.title),
            description: self.description.unwrap_or_default(),
            url,
            color: self.color.unwrap_or_default(),
            tags: self.tags,
        };
        Ok((link, self.created_at.unwrap_or_else(Utc::now)))
    }
}

/// A tag as found in an import file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TagRecord {
    pub id: Option<TagId>,
    pub title: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl TagRecord {
    /// Ids are kept so that links in the same file still resolve.
    fn into_tag(self) -> Tag {
        let id = self.id.filter(|id| !id.is_empty()).unwrap_or_else(new_tag_id);
        Tag::from_parts(
            id,
            &non_empty_or_untitled(self.title),
            self.created_at.unwrap_or_else(Utc::now),
        )
    }
}

/// Parsed import file. Records stay raw JSON until they are imported, so a
/// malformed record only fails itself.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImportDocument {
    pub links: Vec<serde_json::Value>,
    pub tags: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Link,
    Tag,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Link => f.write_str("link"),
            RecordKind::Tag => f.write_str("tag"),
        }
    }
}

/// A record that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    pub kind: RecordKind,
    /// Position of the record within its array in the import file
    pub index: usize,
    pub reason: String,
    pub duplicate_url: bool,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub links_imported: usize,
    pub tags_imported: usize,
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    /// True when every record made it in.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

fn non_empty_or_untitled(title: Option<String>) -> String {
    title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Snapshot both collections.
pub fn export_data<S: LinkStore + ?Sized>(store: &S) -> Result<ExportDocument, StoreError> {
    Ok(ExportDocument {
        links: store.get_all_links()?,
        tags: store.get_all_tags()?,
    })
}

/// Snapshot both collections as pretty-printed JSON.
pub fn export_json<S: LinkStore + ?Sized>(store: &S) -> Result<String, TransferError> {
    let doc = export_data(store)?;
    serde_json::to_string_pretty(&doc).map_err(|e| TransferError::Serialize(e.to_string()))
}

/// Write the JSON export to `path`.
pub fn export_to_file<S: LinkStore + ?Sized>(store: &S, path: &Path) -> Result<(), TransferError> {
    let json = export_json(store)?;
    std::fs::write(path, json)
        .map_err(|e| TransferError::Io(format!("{}: {}", path.display(), e)))?;
    info!(path = %path.display(), "exported links");
    Ok(())
}

/// Parse an import file without touching any store.
pub fn parse_import(json: &str) -> Result<ImportDocument, TransferError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| TransferError::Parse(e.to_string()))?;
    if let serde_json::Value::Array(links) = value {
        return Ok(ImportDocument {
            links,
            tags: Vec::new(),
        });
    }
    serde_json::from_value(value).map_err(|e| TransferError::Parse(e.to_string()))
}

/// Insert every record of a parsed document, best effort.
pub fn import_document<S: LinkStore + ?Sized>(store: &S, doc: ImportDocument) -> ImportReport {
    let mut report = ImportReport::default();

    for (index, value) in doc.tags.into_iter().enumerate() {
        let result = serde_json::from_value::<TagRecord>(value)
            .map_err(|e| StoreError::Validation(format!("malformed tag record: {}", e)))
            .and_then(|record| store.insert_tag(record.into_tag()));
        match result {
            Ok(_) => report.tags_imported += 1,
            Err(e) => {
                warn!(index, "Failed to import tag: {}", e);
                report.failures.push(ImportFailure {
                    kind: RecordKind::Tag,
                    index,
                    reason: e.to_string(),
                    duplicate_url: false,
                });
            }
        }
    }

    for (index, value) in doc.links.into_iter().enumerate() {
        let result = serde_json::from_value::<LinkRecord>(value)
            .map_err(|e| StoreError::Validation(format!("malformed link record: {}", e)))
            .and_then(LinkRecord::into_new_link)
            .and_then(|(link, created_at)| store.insert_link(link, created_at));
        match result {
            Ok(_) => report.links_imported += 1,
            Err(e) => {
                warn!(index, "Failed to import link: {}", e);
                report.failures.push(ImportFailure {
                    kind: RecordKind::Link,
                    index,
                    duplicate_url: e.is_duplicate_url(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        links = report.links_imported,
        tags = report.tags_imported,
        failed = report.failures.len(),
        "import finished"
    );
    report
}

/// Parse and import. Malformed JSON fails before anything is written.
pub fn import_json<S: LinkStore + ?Sized>(
    store: &S,
    json: &str,
) -> Result<ImportReport, TransferError> {
    let doc = parse_import(json)?;
    Ok(import_document(store, doc))
}

/// Import and collapse the outcome to a success flag. Details are logged.
pub fn import_data<S: LinkStore + ?Sized>(store: &S, json: &str) -> bool {
    match import_json(store, json) {
        Ok(report) => report.is_complete(),
        Err(e) => {
            warn!("Error importing data: {}", e);
            false
        }
    }
}
