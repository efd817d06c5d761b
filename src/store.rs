//! BookmarkStore - main API embedded by the app, share extension and widget
//!
//! Composes the database and the metadata resolver. Saving is a two-phase
//! flow, as in the app's add-bookmark sheet: the classified bookmark is
//! persisted immediately, then enriched asynchronously once the resolver
//! returns title and thumbnail.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use crate::database::{Database, DatabaseError};
use crate::metadata_resolver::MetadataResolver;
use crate::models::{Tag, VideoBookmark, VideoMetadata, PRESET_TAG_COLORS};
use crate::transport::{HttpTransport, ReqwestTransport, TransportError};
use crate::url_parser::classify;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no bookmark with id {0}")]
    UnknownBookmark(i64),
    #[error("no tag with id {0}")]
    UnknownTag(i64),
}

/// Listing filter for the thumbnail grid.
#[derive(Debug, Clone, Default)]
pub struct BookmarkFilter {
    /// Case-insensitive substring match over url, fetched title and custom title.
    pub query: Option<String>,
    /// Restrict to bookmarks carrying this tag.
    pub tag_id: Option<i64>,
}

/// Thread-safe bookmark store: SQLite persistence plus metadata resolution.
pub struct BookmarkStore {
    db: Arc<Database>,
    resolver: Arc<MetadataResolver>,
}

impl BookmarkStore {
    /// Open a store with a database at the given path, using the production
    /// HTTP transport.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let transport = Arc::new(ReqwestTransport::new()?);
        Ok(Self::with_parts(Database::open(db_path)?, transport))
    }

    /// Open a store at the given path with an injected transport.
    pub fn open_with_transport<P: AsRef<Path>>(
        db_path: P,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, StoreError> {
        Ok(Self::with_parts(Database::open(db_path)?, transport))
    }

    /// Create a store with an in-memory database (for testing)
    pub fn new_in_memory(transport: Arc<dyn HttpTransport>) -> Result<Self, StoreError> {
        Ok(Self::with_parts(Database::open_in_memory()?, transport))
    }

    fn with_parts(db: Database, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            db: Arc::new(db),
            resolver: Arc::new(MetadataResolver::new(transport)),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Bookmarks
    // ─────────────────────────────────────────────────────────────────────

    /// Classify and persist a pasted/shared URL.
    ///
    /// Returns the new bookmark ID, or 0 if the URL was already saved
    /// (the existing bookmark's timestamp is refreshed instead).
    pub fn save_bookmark(
        &self,
        url: &str,
        custom_title: Option<String>,
    ) -> Result<i64, StoreError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(StoreError::InvalidInput("empty URL".into()));
        }

        if let Some(existing) = self.db.find_by_url(trimmed)? {
            if let Some(id) = existing.id {
                self.db.update_created_at(id, Utc::now().timestamp())?;
                debug!(id, "duplicate save, refreshed timestamp");
                return Ok(0);
            }
        }

        let bookmark = VideoBookmark::new(trimmed, custom_title);
        let id = self.db.insert_bookmark(&bookmark)?;
        debug!(id, platform = bookmark.platform.display_label(), "bookmark saved");
        Ok(id)
    }

    /// Fetch title and thumbnail for a saved bookmark and persist them.
    ///
    /// The resolver never fails; an unreachable source simply leaves both
    /// fields empty. Returns the metadata that was stored.
    pub async fn enrich_bookmark(&self, id: i64) -> Result<VideoMetadata, StoreError> {
        let bookmark = self
            .db
            .get_bookmark(id)?
            .ok_or(StoreError::UnknownBookmark(id))?;

        let metadata = self.resolver.fetch_metadata(&classify(&bookmark.url)).await;
        self.db.update_metadata(
            id,
            metadata.title.as_deref(),
            metadata.thumbnail.as_deref(),
        )?;
        Ok(metadata)
    }

    /// Bookmarks for the grid, newest first, honoring the filter.
    pub fn bookmarks(&self, filter: &BookmarkFilter) -> Result<Vec<VideoBookmark>, StoreError> {
        let mut bookmarks = match filter.tag_id {
            Some(tag_id) => self.db.fetch_by_tag(tag_id)?,
            None => self.db.fetch_all()?,
        };

        if let Some(query) = filter.query.as_deref() {
            let needle = query.to_lowercase();
            bookmarks.retain(|b| {
                b.url.to_lowercase().contains(&needle)
                    || b.title
                        .as_deref()
                        .is_some_and(|t| t.to_lowercase().contains(&needle))
                    || b.custom_title
                        .as_deref()
                        .is_some_and(|t| t.to_lowercase().contains(&needle))
            });
        }

        Ok(bookmarks)
    }

    /// The newest `limit` bookmarks, for the home-screen widget.
    pub fn recent_bookmarks(&self, limit: usize) -> Result<Vec<VideoBookmark>, StoreError> {
        Ok(self.db.fetch_recent(limit)?)
    }

    pub fn update_custom_title(
        &self,
        id: i64,
        custom_title: Option<&str>,
    ) -> Result<(), StoreError> {
        Ok(self.db.update_custom_title(id, custom_title)?)
    }

    pub fn delete_bookmark(&self, id: i64) -> Result<(), StoreError> {
        Ok(self.db.delete_bookmark(id)?)
    }

    /// Delete all bookmarks and tags.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.db.clear_all()?;
        self.resolver.clear_cache();
        Ok(())
    }

    /// Drop cached thumbnail bytes without touching stored bookmarks.
    pub fn clear_thumbnail_cache(&self) {
        self.resolver.clear_cache();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tags
    // ─────────────────────────────────────────────────────────────────────

    /// Create a tag, cycling through the preset palette.
    pub fn create_tag(&self, name: &str) -> Result<Tag, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("empty tag name".into()));
        }

        let color = PRESET_TAG_COLORS[self.db.count_tags()? % PRESET_TAG_COLORS.len()];
        let mut tag = Tag::with_color(name, color);
        tag.id = Some(self.db.insert_tag(&tag)?);
        Ok(tag)
    }

    pub fn update_tag(&self, id: i64, name: &str, color_hex: &str) -> Result<(), StoreError> {
        if self.db.update_tag(id, name, color_hex)? == 0 {
            return Err(StoreError::UnknownTag(id));
        }
        Ok(())
    }

    pub fn delete_tag(&self, id: i64) -> Result<(), StoreError> {
        Ok(self.db.delete_tag(id)?)
    }

    pub fn tags(&self) -> Result<Vec<Tag>, StoreError> {
        Ok(self.db.fetch_tags()?)
    }

    pub fn assign_tag(&self, bookmark_id: i64, tag_id: i64) -> Result<(), StoreError> {
        Ok(self.db.assign_tag(bookmark_id, tag_id)?)
    }

    pub fn unassign_tag(&self, bookmark_id: i64, tag_id: i64) -> Result<(), StoreError> {
        Ok(self.db.unassign_tag(bookmark_id, tag_id)?)
    }
}
