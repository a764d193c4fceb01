use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::config::database_file_name;
use crate::link::{Link, LinkId, LinkPatch, NewLink};
use crate::store::{LinkStore, StoreError};
use crate::tag::{normalize_tag_title, Tag, TagId};

const LINK_COLUMNS: &str = "id, title, description, url, color, tags, created_at";

/// Raw column values of one `links` row.
type LinkRow = (i64, String, String, String, String, String, i64);

/// SQLite-backed implementation of the LinkStore trait.
pub struct SqliteLinkStore {
    conn: Mutex<Connection>,
}

impl SqliteLinkStore {
    /// Open (or create) a database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn =
            Connection::open(path).map_err(|e| StoreError::Storage(format!("open: {}", e)))?;
        debug!(path = %path.display(), "opened link store");
        Self::init_with_connection(conn)
    }

    /// Open the store for an application name inside `dir`, creating the
    /// directory if needed. The file name is derived from the app name.
    pub fn open_named(dir: &Path, app_name: &str) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| StoreError::Storage(format!("create {}: {}", dir.display(), e)))?;
        Self::open(&dir.join(database_file_name(app_name)))
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Storage(format!("open_in_memory: {}", e)))?;
        Self::init_with_connection(conn)
    }

    fn init_with_connection(conn: Connection) -> Result<Self, StoreError> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        // The title index mirrors the browser store layout; no query uses it.
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                url TEXT NOT NULL,
                color TEXT NOT NULL DEFAULT '',
                tags TEXT NOT NULL DEFAULT '[]',
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tags (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_links_title ON links(title);
            ",
        )
        .map_err(|e| StoreError::Storage(format!("init_schema: {}", e)))?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    /// Id of a link other than `exclude` that already uses `url`.
    fn url_owner(
        conn: &Connection,
        url: &str,
        exclude: Option<LinkId>,
    ) -> Result<Option<LinkId>, StoreError> {
        conn.query_row(
            "SELECT id FROM links WHERE url = ?1 AND (?2 IS NULL OR id != ?2) LIMIT 1",
            params![url, exclude],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| StoreError::Storage(format!("check url: {}", e)))
    }

    fn read_link_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LinkRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
        ))
    }

    fn link_from_row(row: LinkRow) -> Result<Link, StoreError> {
        let (id, title, description, url, color, tags_json, created_ms) = row;
        let tags: Vec<TagId> = serde_json::from_str(&tags_json)
            .map_err(|e| StoreError::Storage(format!("parse tags of link {}: {}", id, e)))?;
        Ok(Link {
            id,
            title,
            description,
            url,
            color,
            tags,
            created_at: from_millis(created_ms),
        })
    }

    fn load_link(conn: &Connection, id: LinkId) -> Result<Option<Link>, StoreError> {
        let row = conn
            .query_row(
                &format!("SELECT {} FROM links WHERE id = ?1", LINK_COLUMNS),
                params![id],
                Self::read_link_row,
            )
            .optional()
            .map_err(|e| StoreError::Storage(format!("query link: {}", e)))?;
        row.map(Self::link_from_row).transpose()
    }

    fn tags_json(tags: &[TagId]) -> Result<String, StoreError> {
        serde_json::to_string(tags).map_err(|e| StoreError::Storage(e.to_string()))
    }
}

impl LinkStore for SqliteLinkStore {
    fn insert_link(&self, link: NewLink, created_at: DateTime<Utc>) -> Result<LinkId, StoreError> {
        let conn = self.lock()?;
        if Self::url_owner(&conn, &link.url, None)?.is_some() {
            return Err(StoreError::DuplicateUrl(link.url));
        }

        conn.execute(
            "INSERT INTO links (title, description, url, color, tags, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                link.title,
                link.description,
                link.url,
                link.color,
                Self::tags_json(&link.tags)?,
                created_at.timestamp_millis(),
            ],
        )
        .map_err(|e| StoreError::Storage(format!("insert link: {}", e)))?;

        let id = conn.last_insert_rowid();
        debug!(id, url = %link.url, "link added");
        Ok(id)
    }

    fn update_link(&self, id: LinkId, patch: LinkPatch) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let mut link =
            Self::load_link(&conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        link.apply(patch);

        if Self::url_owner(&conn, &link.url, Some(id))?.is_some() {
            return Err(StoreError::DuplicateUrl(link.url));
        }

        conn.execute(
            "UPDATE links SET title = ?1, description = ?2, url = ?3, color = ?4, tags = ?5
             WHERE id = ?6",
            params![
                link.title,
                link.description,
                link.url,
                link.color,
                Self::tags_json(&link.tags)?,
                id,
            ],
        )
        .map_err(|e| StoreError::Storage(format!("update link: {}", e)))?;

        debug!(id, "link updated");
        Ok(())
    }

    fn get_link(&self, id: LinkId) -> Result<Option<Link>, StoreError> {
        let conn = self.lock()?;
        Self::load_link(&conn, id)
    }

    fn get_all_links(&self) -> Result<Vec<Link>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM links ORDER BY id", LINK_COLUMNS))
            .map_err(|e| StoreError::Storage(format!("prepare links: {}", e)))?;
        let rows = stmt
            .query_map([], Self::read_link_row)
            .map_err(|e| StoreError::Storage(format!("query links: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Storage(format!("collect links: {}", e)))?;
        rows.into_iter().map(Self::link_from_row).collect()
    }

    fn delete_link(&self, id: LinkId) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let deleted = conn
            .execute("DELETE FROM links WHERE id = ?1", params![id])
            .map_err(|e| StoreError::Storage(format!("delete link: {}", e)))?;
        debug!(id, deleted, "link delete");
        Ok(())
    }

    fn insert_tag(&self, tag: Tag) -> Result<TagId, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO tags (id, title, created_at) VALUES (?1, ?2, ?3)",
            params![tag.id, tag.title, tag.created_at.timestamp_millis()],
        )
        .map_err(|e| {
            if let rusqlite::Error::SqliteFailure(ref err, _) = e {
                if err.code == rusqlite::ErrorCode::ConstraintViolation {
                    return StoreError::AlreadyExists(tag.id.clone());
                }
            }
            StoreError::Storage(format!("insert tag: {}", e))
        })?;

        debug!(id = %tag.id, title = %tag.title, "tag added");
        Ok(tag.id)
    }

    fn update_tag(&self, id: &str, title: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE tags SET title = ?1 WHERE id = ?2",
                params![normalize_tag_title(title), id],
            )
            .map_err(|e| StoreError::Storage(format!("update tag: {}", e)))?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        debug!(id, "tag updated");
        Ok(())
    }

    fn get_tag(&self, id: &str) -> Result<Option<Tag>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, title, created_at FROM tags WHERE id = ?1",
            params![id],
            |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    created_at: from_millis(row.get(2)?),
                })
            },
        )
        .optional()
        .map_err(|e| StoreError::Storage(format!("query tag: {}", e)))
    }

    fn get_all_tags(&self) -> Result<Vec<Tag>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, title, created_at FROM tags ORDER BY rowid")
            .map_err(|e| StoreError::Storage(format!("prepare tags: {}", e)))?;
        let tags = stmt
            .query_map([], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    created_at: from_millis(row.get(2)?),
                })
            })
            .map_err(|e| StoreError::Storage(format!("query tags: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Storage(format!("collect tags: {}", e)))?;
        Ok(tags)
    }

    fn delete_tag(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let deleted = conn
            .execute("DELETE FROM tags WHERE id = ?1", params![id])
            .map_err(|e| StoreError::Storage(format!("delete tag: {}", e)))?;
        debug!(id, deleted, "tag delete");
        Ok(())
    }
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::NewLink;

    fn store() -> SqliteLinkStore {
        SqliteLinkStore::open_in_memory().unwrap()
    }

    fn new_link(title: &str, url: &str) -> NewLink {
        NewLink::new(title, url)
            .with_description(format!("about {}", title))
            .with_color("hsl(200, 85%, 75%)")
    }

    #[test]
    fn add_and_get_round_trip() {
        let store = store();
        let id = store
            .add_link(new_link("Docs", "https://docs.example").with_tags(vec!["t1".into()]))
            .unwrap();
        let got = store.get_link(id).unwrap().unwrap();
        assert_eq!(got.id, id);
        assert_eq!(got.title, "Docs");
        assert_eq!(got.description, "about Docs");
        assert_eq!(got.url, "https://docs.example");
        assert_eq!(got.color, "hsl(200, 85%, 75%)");
        assert_eq!(got.tags, vec!["t1".to_string()]);
    }

    #[test]
    fn ids_auto_increment() {
        let store = store();
        let a = store.add_link(new_link("a", "https://a.example")).unwrap();
        let b = store.add_link(new_link("b", "https://b.example")).unwrap();
        assert!(b > a);
    }

    #[test]
    fn add_duplicate_url_fails() {
        let store = store();
        store.add_link(new_link("a", "https://same.example")).unwrap();
        let err = store
            .add_link(new_link("b", "https://same.example"))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUrl(ref u) if u == "https://same.example"));
        assert_eq!(store.get_all_links().unwrap().len(), 1);
    }

    #[test]
    fn update_to_other_links_url_fails() {
        let store = store();
        store.add_link(new_link("a", "https://a.example")).unwrap();
        let b = store.add_link(new_link("b", "https://b.example")).unwrap();
        let err = store
            .update_link(
                b,
                LinkPatch {
                    url: Some("https://a.example".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_duplicate_url());
        assert_eq!(store.get_link(b).unwrap().unwrap().url, "https://b.example");
    }

    #[test]
    fn update_keeping_own_url_succeeds() {
        let store = store();
        let id = store.add_link(new_link("a", "https://a.example")).unwrap();
        store
            .update_link(id, new_link("renamed", "https://a.example").into())
            .unwrap();
        assert_eq!(store.get_link(id).unwrap().unwrap().title, "renamed");
    }

    #[test]
    fn update_merges_partial_fields() {
        let store = store();
        let id = store
            .add_link(new_link("a", "https://a.example").with_tags(vec!["x".into()]))
            .unwrap();
        let before = store.get_link(id).unwrap().unwrap();
        store
            .update_link(
                id,
                LinkPatch {
                    description: Some("new".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let after = store.get_link(id).unwrap().unwrap();
        assert_eq!(after.description, "new");
        assert_eq!(after.title, before.title);
        assert_eq!(after.tags, before.tags);
        assert_eq!(after.created_at, before.created_at);
    }

    #[test]
    fn update_nonexistent_fails() {
        let store = store();
        let err = store.update_link(99, LinkPatch::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref id) if id == "99"));
    }

    #[test]
    fn delete_link_is_idempotent() {
        let store = store();
        let id = store.add_link(new_link("a", "https://a.example")).unwrap();
        store.delete_link(id).unwrap();
        store.delete_link(id).unwrap();
        store.delete_link(12345).unwrap();
        assert!(store.get_link(id).unwrap().is_none());
    }

    #[test]
    fn deleted_url_can_be_reused() {
        let store = store();
        let id = store.add_link(new_link("a", "https://a.example")).unwrap();
        store.delete_link(id).unwrap();
        assert!(store.add_link(new_link("a2", "https://a.example")).is_ok());
    }

    #[test]
    fn get_all_links_in_insertion_order() {
        let store = store();
        for name in ["c", "a", "b"] {
            store
                .add_link(new_link(name, &format!("https://{}.example", name)))
                .unwrap();
        }
        let titles: Vec<String> = store
            .get_all_links()
            .unwrap()
            .into_iter()
            .map(|l| l.title)
            .collect();
        assert_eq!(titles, vec!["c", "a", "b"]);
    }

    #[test]
    fn tag_crud() {
        let store = store();
        let id = store.add_tag("Rust").unwrap();
        assert_eq!(store.get_tag(&id).unwrap().unwrap().title, "rust");

        store.update_tag(&id, "RustLang").unwrap();
        assert_eq!(store.get_tag(&id).unwrap().unwrap().title, "rustlang");

        store.delete_tag(&id).unwrap();
        store.delete_tag(&id).unwrap();
        assert!(store.get_tag(&id).unwrap().is_none());
    }

    #[test]
    fn update_missing_tag_fails() {
        let store = store();
        assert!(store.update_tag("missing", "x").unwrap_err().is_not_found());
    }

    #[test]
    fn duplicate_tag_titles_allowed() {
        let store = store();
        let a = store.add_tag("news").unwrap();
        let b = store.add_tag("NEWS").unwrap();
        assert_ne!(a, b);
        assert_eq!(store.get_all_tags().unwrap().len(), 2);
    }

    #[test]
    fn insert_tag_with_existing_id_fails() {
        let store = store();
        let tag = Tag::new("a");
        store.insert_tag(tag.clone()).unwrap();
        let err = store.insert_tag(tag).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[test]
    fn get_tags_by_ids_drops_missing_and_keeps_order() {
        let store = store();
        let a = store.add_tag("a").unwrap();
        let b = store.add_tag("b").unwrap();
        let got = store
            .get_tags_by_ids(&[b.clone(), "gone".into(), a.clone()])
            .unwrap();
        let ids: Vec<TagId> = got.into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b, a]);
    }

    #[test]
    fn delete_tag_leaves_dangling_reference() {
        let store = store();
        let tag = store.add_tag("temp").unwrap();
        let link = store
            .add_link(new_link("a", "https://a.example").with_tags(vec![tag.clone()]))
            .unwrap();

        store.delete_tag(&tag).unwrap();

        assert!(store.get_tags_by_ids(&[tag.clone()]).unwrap().is_empty());
        assert_eq!(store.get_link(link).unwrap().unwrap().tags, vec![tag]);
    }

    #[test]
    fn search_with_empty_query_matches_get_all() {
        let store = store();
        store.add_link(new_link("b", "https://b.example")).unwrap();
        store.add_link(new_link("a", "https://a.example")).unwrap();
        assert_eq!(
            store.search_links("", &[]).unwrap(),
            store.get_all_links().unwrap()
        );
    }

    #[test]
    fn search_filters_by_tags() {
        let store = store();
        let (a, b, c) = ("A".to_string(), "B".to_string(), "C".to_string());
        store
            .add_link(new_link("ab", "https://ab.example").with_tags(vec![a.clone(), b.clone()]))
            .unwrap();
        store
            .add_link(new_link("a", "https://a.example").with_tags(vec![a.clone()]))
            .unwrap();

        assert_eq!(store.search_links("", &[a.clone(), b.clone()]).unwrap().len(), 1);
        assert_eq!(store.search_links("", &[a.clone()]).unwrap().len(), 2);
        assert!(store.search_links("", &[a, c]).unwrap().is_empty());
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let (link_id, tag_id) = {
            let store = SqliteLinkStore::open_named(dir.path(), "utility-links").unwrap();
            let tag_id = store.add_tag("saved").unwrap();
            let link_id = store
                .add_link(new_link("a", "https://a.example").with_tags(vec![tag_id.clone()]))
                .unwrap();
            (link_id, tag_id)
        };

        assert!(dir.path().join("utility-links-db.sqlite3").exists());
        let store = SqliteLinkStore::open_named(dir.path(), "utility-links").unwrap();
        let link = store.get_link(link_id).unwrap().unwrap();
        assert_eq!(link.tags, vec![tag_id.clone()]);
        assert_eq!(store.get_tag(&tag_id).unwrap().unwrap().title, "saved");
    }

    #[test]
    fn explicit_created_at_is_kept() {
        let store = store();
        let at = Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap();
        let id = store
            .insert_link(new_link("old", "https://old.example"), at)
            .unwrap();
        assert_eq!(store.get_link(id).unwrap().unwrap().created_at, at);
    }
}
