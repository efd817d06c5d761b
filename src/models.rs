//! Core data models for ClipStocker
//!
//! Plain value types shared between the classifier, the resolver, the
//! database layer and the embedding app.

use chrono::Utc;
use url::Url;

// ─────────────────────────────────────────────────────────────────────────────
// PLATFORM
// ─────────────────────────────────────────────────────────────────────────────

/// The short-video platforms a pasted link can belong to.
///
/// The set is closed: new platforms require a new variant plus a matching
/// host rule in the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Youtube,
    Tiktok,
    Instagram,
    Twitter,
    Threads,
    Unknown,
}

impl Platform {
    /// Human-readable label shown in the app UI.
    pub fn display_label(&self) -> &'static str {
        match self {
            Platform::Youtube => "YouTube",
            Platform::Tiktok => "TikTok",
            Platform::Instagram => "Instagram",
            Platform::Twitter => "X",
            Platform::Threads => "Threads",
            Platform::Unknown => "Unknown",
        }
    }

    /// Asset name for the platform badge on thumbnail cells.
    pub fn icon_name(&self) -> &'static str {
        match self {
            Platform::Youtube => "logo_youtube",
            Platform::Tiktok => "logo_tiktok",
            Platform::Instagram => "logo_instagram",
            Platform::Twitter => "logo_x",
            Platform::Threads => "logo_threads",
            Platform::Unknown => "link",
        }
    }

    /// Whether `icon_name` refers to a bundled brand asset rather than a
    /// generic system symbol.
    pub fn is_custom_icon(&self) -> bool {
        *self != Platform::Unknown
    }

    /// Stable string stored in the database.
    pub(crate) fn as_db_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Threads => "threads",
            Platform::Unknown => "unknown",
        }
    }

    pub(crate) fn from_db_str(value: &str) -> Self {
        match value {
            "youtube" => Platform::Youtube,
            "tiktok" => Platform::Tiktok,
            "instagram" => Platform::Instagram,
            "twitter" => Platform::Twitter,
            "threads" => Platform::Threads,
            _ => Platform::Unknown,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CLASSIFIER / RESOLVER VALUE OBJECTS
// ─────────────────────────────────────────────────────────────────────────────

/// Result of classifying a raw input string.
///
/// `video_id` is `None` when the platform was recognized but no identifier
/// pattern matched, and always `None` for [`Platform::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedUrl {
    pub platform: Platform,
    pub video_id: Option<String>,
    pub original_url: String,
}

/// Best-effort display metadata for a bookmark.
///
/// Both fields are independently optional: title and thumbnail come from
/// different fallible sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub thumbnail: Option<Vec<u8>>,
}

impl VideoMetadata {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.thumbnail.is_none()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// STORED RECORDS
// ─────────────────────────────────────────────────────────────────────────────

/// A saved video bookmark as persisted in the database.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoBookmark {
    pub id: Option<i64>,
    pub url: String,
    pub platform: Platform,
    /// Title fetched from the platform, if resolution succeeded.
    pub title: Option<String>,
    /// Title the user typed when saving, takes precedence for display.
    pub custom_title: Option<String>,
    pub thumbnail_url: Option<String>,
    pub thumbnail: Option<Vec<u8>>,
    pub created_at_unix: i64,
    pub tag_ids: Vec<i64>,
}

impl VideoBookmark {
    /// Create an unsaved bookmark from a raw input string, classifying it
    /// in the process.
    pub fn new(input: &str, custom_title: Option<String>) -> Self {
        let classified = crate::url_parser::classify(input);
        Self {
            id: None,
            url: classified.original_url,
            platform: classified.platform,
            title: None,
            custom_title,
            thumbnail_url: None,
            thumbnail: None,
            created_at_unix: Utc::now().timestamp(),
            tag_ids: Vec::new(),
        }
    }

    /// Title to show in lists: the user's own title wins over the fetched one,
    /// falling back to the raw URL.
    pub fn display_title(&self) -> &str {
        self.custom_title
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or(&self.url)
    }

    /// Deep link handed to companion surfaces (widget, share flow) so they
    /// can open this bookmark in the main app.
    pub fn deep_link(&self) -> Option<Url> {
        Url::parse_with_params("clipstocker://open", [("url", self.url.as_str())]).ok()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TAGS
// ─────────────────────────────────────────────────────────────────────────────

/// Preset tag colors, cycled through as the user creates tags.
pub const PRESET_TAG_COLORS: [&str; 8] = [
    "#FF3B30", // Red
    "#FF9500", // Orange
    "#FFCC00", // Yellow
    "#34C759", // Green
    "#007AFF", // Blue
    "#5856D6", // Purple
    "#AF52DE", // Violet
    "#FF2D55", // Pink
];

const DEFAULT_TAG_COLOR: &str = "#007AFF";

/// A user-defined tag for filtering the bookmark grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: Option<i64>,
    pub name: String,
    pub color_hex: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            color_hex: DEFAULT_TAG_COLOR.to_string(),
        }
    }

    pub fn with_color(name: impl Into<String>, color_hex: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            color_hex: color_hex.into(),
        }
    }
}
