//! SQLite database layer for bookmark and tag storage
//!
//! Single connection behind a mutex; the schema mirrors the app's bookmark
//! grid: bookmarks, tags, and a join table for the many-to-many relation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::models::{Platform, Tag, VideoBookmark};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Thread-safe database wrapper
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DatabaseResult<Self> {
        let conn = Connection::open(path)?;

        // WAL keeps widget reads cheap while the app writes.
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA foreign_keys=ON;
            PRAGMA cache_size=-16000;
        ",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.setup_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> DatabaseResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.setup_schema()?;
        Ok(db)
    }

    fn setup_schema(&self) -> DatabaseResult<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS bookmarks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL,
                platform TEXT NOT NULL,
                title TEXT,
                customTitle TEXT,
                thumbnailUrl TEXT,
                thumbnail BLOB,
                createdAt INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_bookmarks_url ON bookmarks(url);
            CREATE INDEX IF NOT EXISTS idx_bookmarks_created ON bookmarks(createdAt);

            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                colorHex TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS bookmark_tags (
                bookmarkId INTEGER NOT NULL REFERENCES bookmarks(id) ON DELETE CASCADE,
                tagId INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                PRIMARY KEY (bookmarkId, tagId)
            );
            "#,
        )?;

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Bookmarks
    // ─────────────────────────────────────────────────────────────────────

    /// Insert a new bookmark, returns the row ID
    pub fn insert_bookmark(&self, bookmark: &VideoBookmark) -> DatabaseResult<i64> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO bookmarks (url, platform, title, customTitle, thumbnailUrl, thumbnail, createdAt)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                bookmark.url,
                bookmark.platform.as_db_str(),
                bookmark.title,
                bookmark.custom_title,
                bookmark.thumbnail_url,
                bookmark.thumbnail,
                bookmark.created_at_unix,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Find an existing bookmark by its exact URL
    pub fn find_by_url(&self, url: &str) -> DatabaseResult<Option<VideoBookmark>> {
        let conn = self.conn.lock();
        let bookmark = conn
            .prepare("SELECT * FROM bookmarks WHERE url = ?1 LIMIT 1")?
            .query_row([url], Self::row_to_bookmark)
            .optional()?;

        match bookmark {
            Some(mut bookmark) => {
                Self::attach_tag_ids(&conn, std::slice::from_mut(&mut bookmark))?;
                Ok(Some(bookmark))
            }
            None => Ok(None),
        }
    }

    /// Fetch a single bookmark by ID
    pub fn get_bookmark(&self, id: i64) -> DatabaseResult<Option<VideoBookmark>> {
        let conn = self.conn.lock();
        let bookmark = conn
            .prepare("SELECT * FROM bookmarks WHERE id = ?1")?
            .query_row([id], Self::row_to_bookmark)
            .optional()?;

        match bookmark {
            Some(mut bookmark) => {
                Self::attach_tag_ids(&conn, std::slice::from_mut(&mut bookmark))?;
                Ok(Some(bookmark))
            }
            None => Ok(None),
        }
    }

    /// All bookmarks, newest first
    pub fn fetch_all(&self) -> DatabaseResult<Vec<VideoBookmark>> {
        let conn = self.conn.lock();
        let mut bookmarks = conn
            .prepare("SELECT * FROM bookmarks ORDER BY createdAt DESC, id DESC")?
            .query_map([], Self::row_to_bookmark)?
            .collect::<Result<Vec<_>, _>>()?;
        Self::attach_tag_ids(&conn, &mut bookmarks)?;
        Ok(bookmarks)
    }

    /// The newest `limit` bookmarks (widget feed)
    pub fn fetch_recent(&self, limit: usize) -> DatabaseResult<Vec<VideoBookmark>> {
        let conn = self.conn.lock();
        let mut bookmarks = conn
            .prepare("SELECT * FROM bookmarks ORDER BY createdAt DESC, id DESC LIMIT ?1")?
            .query_map([limit as i64], Self::row_to_bookmark)?
            .collect::<Result<Vec<_>, _>>()?;
        Self::attach_tag_ids(&conn, &mut bookmarks)?;
        Ok(bookmarks)
    }

    /// Bookmarks carrying a given tag, newest first
    pub fn fetch_by_tag(&self, tag_id: i64) -> DatabaseResult<Vec<VideoBookmark>> {
        let conn = self.conn.lock();
        let mut bookmarks = conn
            .prepare(
                r#"
                SELECT b.* FROM bookmarks b
                JOIN bookmark_tags bt ON bt.bookmarkId = b.id
                WHERE bt.tagId = ?1
                ORDER BY b.createdAt DESC, b.id DESC
                "#,
            )?
            .query_map([tag_id], Self::row_to_bookmark)?
            .collect::<Result<Vec<_>, _>>()?;
        Self::attach_tag_ids(&conn, &mut bookmarks)?;
        Ok(bookmarks)
    }

    /// Store resolver output on an existing bookmark
    pub fn update_metadata(
        &self,
        id: i64,
        title: Option<&str>,
        thumbnail: Option<&[u8]>,
    ) -> DatabaseResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE bookmarks SET title = ?1, thumbnail = ?2 WHERE id = ?3",
            params![title, thumbnail, id],
        )?;
        Ok(())
    }

    /// Update the user-assigned title
    pub fn update_custom_title(&self, id: i64, custom_title: Option<&str>) -> DatabaseResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE bookmarks SET customTitle = ?1 WHERE id = ?2",
            params![custom_title, id],
        )?;
        Ok(())
    }

    /// Refresh the creation timestamp (duplicate-save behavior)
    pub fn update_created_at(&self, id: i64, created_at_unix: i64) -> DatabaseResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE bookmarks SET createdAt = ?1 WHERE id = ?2",
            params![created_at_unix, id],
        )?;
        Ok(())
    }

    /// Delete a bookmark; its tag assignments cascade
    pub fn delete_bookmark(&self, id: i64) -> DatabaseResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM bookmarks WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Delete all bookmarks and tags
    pub fn clear_all(&self) -> DatabaseResult<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            "DELETE FROM bookmark_tags; DELETE FROM bookmarks; DELETE FROM tags;",
        )?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tags
    // ─────────────────────────────────────────────────────────────────────

    pub fn insert_tag(&self, tag: &Tag) -> DatabaseResult<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO tags (name, colorHex) VALUES (?1, ?2)",
            params![tag.name, tag.color_hex],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Update a tag, returning the number of rows touched (0 for an
    /// unknown id).
    pub fn update_tag(&self, id: i64, name: &str, color_hex: &str) -> DatabaseResult<usize> {
        let conn = self.conn.lock();
        Ok(conn.execute(
            "UPDATE tags SET name = ?1, colorHex = ?2 WHERE id = ?3",
            params![name, color_hex, id],
        )?)
    }

    pub fn delete_tag(&self, id: i64) -> DatabaseResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM tags WHERE id = ?1", [id])?;
        Ok(())
    }

    /// All tags, in creation order
    pub fn fetch_tags(&self) -> DatabaseResult<Vec<Tag>> {
        let conn = self.conn.lock();
        let tags = conn
            .prepare("SELECT id, name, colorHex FROM tags ORDER BY id")?
            .query_map([], |row| {
                Ok(Tag {
                    id: Some(row.get(0)?),
                    name: row.get(1)?,
                    color_hex: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    pub fn count_tags(&self) -> DatabaseResult<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn assign_tag(&self, bookmark_id: i64, tag_id: i64) -> DatabaseResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR IGNORE INTO bookmark_tags (bookmarkId, tagId) VALUES (?1, ?2)",
            params![bookmark_id, tag_id],
        )?;
        Ok(())
    }

    pub fn unassign_tag(&self, bookmark_id: i64, tag_id: i64) -> DatabaseResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM bookmark_tags WHERE bookmarkId = ?1 AND tagId = ?2",
            params![bookmark_id, tag_id],
        )?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Row mapping
    // ─────────────────────────────────────────────────────────────────────

    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<VideoBookmark> {
        let platform: String = row.get("platform")?;
        Ok(VideoBookmark {
            id: Some(row.get("id")?),
            url: row.get("url")?,
            platform: Platform::from_db_str(&platform),
            title: row.get("title")?,
            custom_title: row.get("customTitle")?,
            thumbnail_url: row.get("thumbnailUrl")?,
            thumbnail: row.get("thumbnail")?,
            created_at_unix: row.get("createdAt")?,
            tag_ids: Vec::new(),
        })
    }

    /// Fill in `tag_ids` for already-mapped bookmarks
    fn attach_tag_ids(
        conn: &Connection,
        bookmarks: &mut [VideoBookmark],
    ) -> rusqlite::Result<()> {
        if bookmarks.is_empty() {
            return Ok(());
        }

        let mut by_bookmark: HashMap<i64, Vec<i64>> = HashMap::new();
        let mut stmt =
            conn.prepare("SELECT bookmarkId, tagId FROM bookmark_tags ORDER BY tagId")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (bookmark_id, tag_id) = row?;
            by_bookmark.entry(bookmark_id).or_default().push(tag_id);
        }

        for bookmark in bookmarks {
            if let Some(id) = bookmark.id {
                if let Some(tag_ids) = by_bookmark.remove(&id) {
                    bookmark.tag_ids = tag_ids;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bookmark(url: &str) -> VideoBookmark {
        VideoBookmark::new(url, None)
    }

    #[test]
    fn test_insert_and_fetch_roundtrip() {
        let db = Database::open_in_memory().unwrap();

        let mut saved = bookmark("https://youtu.be/abc123");
        saved.custom_title = Some("My short".to_string());
        let id = db.insert_bookmark(&saved).unwrap();
        assert!(id > 0);

        let loaded = db.get_bookmark(id).unwrap().unwrap();
        assert_eq!(loaded.url, "https://youtu.be/abc123");
        assert_eq!(loaded.platform, Platform::Youtube);
        assert_eq!(loaded.custom_title.as_deref(), Some("My short"));
        assert!(loaded.title.is_none());
        assert!(loaded.thumbnail.is_none());
    }

    #[test]
    fn test_find_by_url() {
        let db = Database::open_in_memory().unwrap();
        db.insert_bookmark(&bookmark("https://youtu.be/abc123")).unwrap();

        assert!(db.find_by_url("https://youtu.be/abc123").unwrap().is_some());
        assert!(db.find_by_url("https://youtu.be/other").unwrap().is_none());
    }

    #[test]
    fn test_update_metadata() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_bookmark(&bookmark("https://youtu.be/abc123")).unwrap();

        db.update_metadata(id, Some("Fetched"), Some(b"img".as_slice()))
            .unwrap();

        let loaded = db.get_bookmark(id).unwrap().unwrap();
        assert_eq!(loaded.title.as_deref(), Some("Fetched"));
        assert_eq!(loaded.thumbnail.as_deref(), Some(b"img".as_slice()));
    }

    #[test]
    fn test_recent_is_newest_first() {
        let db = Database::open_in_memory().unwrap();
        for (i, url) in ["https://youtu.be/a", "https://youtu.be/b", "https://youtu.be/c"]
            .iter()
            .enumerate()
        {
            let mut item = bookmark(url);
            item.created_at_unix = 1000 + i as i64;
            db.insert_bookmark(&item).unwrap();
        }

        let recent = db.fetch_recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].url, "https://youtu.be/c");
        assert_eq!(recent[1].url, "https://youtu.be/b");
    }

    #[test]
    fn test_tags_and_assignment() {
        let db = Database::open_in_memory().unwrap();
        let bookmark_id = db.insert_bookmark(&bookmark("https://youtu.be/a")).unwrap();
        let tag_id = db.insert_tag(&Tag::new("Cooking")).unwrap();

        db.assign_tag(bookmark_id, tag_id).unwrap();
        db.assign_tag(bookmark_id, tag_id).unwrap(); // idempotent

        let tagged = db.fetch_by_tag(tag_id).unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].tag_ids, vec![tag_id]);

        db.unassign_tag(bookmark_id, tag_id).unwrap();
        assert!(db.fetch_by_tag(tag_id).unwrap().is_empty());
    }

    #[test]
    fn test_delete_bookmark_cascades_assignments() {
        let db = Database::open_in_memory().unwrap();
        let bookmark_id = db.insert_bookmark(&bookmark("https://youtu.be/a")).unwrap();
        let tag_id = db.insert_tag(&Tag::new("Music")).unwrap();
        db.assign_tag(bookmark_id, tag_id).unwrap();

        db.delete_bookmark(bookmark_id).unwrap();

        assert!(db.get_bookmark(bookmark_id).unwrap().is_none());
        assert!(db.fetch_by_tag(tag_id).unwrap().is_empty());
        // The tag itself survives.
        assert_eq!(db.count_tags().unwrap(), 1);
    }

    #[test]
    fn test_delete_tag_cascades_assignments() {
        let db = Database::open_in_memory().unwrap();
        let bookmark_id = db.insert_bookmark(&bookmark("https://youtu.be/a")).unwrap();
        let tag_id = db.insert_tag(&Tag::new("Travel")).unwrap();
        db.assign_tag(bookmark_id, tag_id).unwrap();

        db.delete_tag(tag_id).unwrap();

        let loaded = db.get_bookmark(bookmark_id).unwrap().unwrap();
        assert!(loaded.tag_ids.is_empty());
    }

    #[test]
    fn test_clear_all() {
        let db = Database::open_in_memory().unwrap();
        db.insert_bookmark(&bookmark("https://youtu.be/a")).unwrap();
        db.insert_tag(&Tag::new("T")).unwrap();

        db.clear_all().unwrap();

        assert!(db.fetch_all().unwrap().is_empty());
        assert_eq!(db.count_tags().unwrap(), 0);
    }
}
