//! ClipStocker Core - Rust business logic for the ClipStocker bookmarking app
//!
//! The app saves short-form video links (YouTube, TikTok, Instagram, X,
//! Threads) into a tag-filterable grid. This crate holds everything below
//! the UI:
//!
//! # Architecture
//! - `url_parser`: pure URL classification (platform + video identifier)
//! - `metadata_resolver`: per-platform title/thumbnail fetching (oEmbed,
//!   link preview) over an injectable HTTP transport
//! - `thumbnail_cache`: shared in-memory byte cache with per-key dedup
//! - `database`: SQLite storage for bookmarks and tags
//! - `store`: the API surface the app, share extension and widget embed

mod database;
mod link_metadata;
mod metadata_resolver;
mod models;
mod store;
mod thumbnail_cache;
mod transport;
mod url_parser;

pub use database::{Database, DatabaseError};
pub use metadata_resolver::MetadataResolver;
pub use models::*;
pub use store::{BookmarkFilter, BookmarkStore, StoreError};
pub use thumbnail_cache::ThumbnailCache;
pub use transport::{HttpTransport, ReqwestTransport, TransportError};
pub use url_parser::classify;

/// Quick check used by the share extension before offering to save:
/// does this text classify to a supported platform at all?
pub fn is_supported_url(text: &str) -> bool {
    classify(text).platform != Platform::Unknown
}
