//! URL classification for pasted and shared video links
//!
//! Maps an arbitrary input string to a platform plus an optional content
//! identifier. Pure and synchronous: no network, no state, and malformed
//! input never panics — it classifies as [`Platform::Unknown`].

use url::Url;

use crate::models::{ClassifiedUrl, Platform};

/// Classify a raw input string.
///
/// Host matching is case-insensitive substring matching against a fixed
/// per-platform host list; identifier extraction is per-platform, first
/// match wins. The same input always yields the same result.
pub fn classify(input: &str) -> ClassifiedUrl {
    let Ok(parsed) = Url::parse(input) else {
        return ClassifiedUrl {
            platform: Platform::Unknown,
            video_id: None,
            original_url: input.to_string(),
        };
    };

    let host = parsed
        .host_str()
        .map(str::to_lowercase)
        .unwrap_or_default();

    let (platform, video_id) = if host.contains("youtube.com") || host.contains("youtu.be") {
        (Platform::Youtube, extract_youtube_id(&parsed, &host))
    } else if host.contains("tiktok.com") {
        (Platform::Tiktok, extract_tiktok_id(&parsed, &host))
    } else if host.contains("instagram.com") {
        (Platform::Instagram, extract_instagram_id(&parsed))
    } else if host.contains("twitter.com") || host.contains("x.com") {
        (Platform::Twitter, extract_twitter_id(&parsed))
    } else if host.contains("threads.net") || host.contains("threads.com") {
        (Platform::Threads, extract_threads_id(&parsed))
    } else {
        (Platform::Unknown, None)
    };

    ClassifiedUrl {
        platform,
        video_id,
        original_url: input.to_string(),
    }
}

/// Non-empty path segments of a URL.
fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

/// The segment immediately following `marker`, if any.
///
/// A marker that is the last path component yields `None`.
fn segment_after<'a>(segments: &[&'a str], marker: &str) -> Option<&'a str> {
    segments
        .iter()
        .position(|&s| s == marker)
        .and_then(|idx| segments.get(idx + 1))
        .copied()
}

fn extract_youtube_id(url: &Url, host: &str) -> Option<String> {
    let segments = path_segments(url);

    // youtu.be/VIDEO_ID
    if host.contains("youtu.be") {
        return segments.first().map(|s| s.to_string());
    }

    // youtube.com/watch?v=VIDEO_ID — first `v` parameter wins
    if let Some((_, value)) = url.query_pairs().find(|(key, _)| key == "v") {
        return Some(value.into_owned());
    }

    // youtube.com/shorts/VIDEO_ID
    segment_after(&segments, "shorts").map(str::to_string)
}

fn extract_tiktok_id(url: &Url, host: &str) -> Option<String> {
    let segments = path_segments(url);

    // tiktok.com/@user/video/VIDEO_ID
    if let Some(id) = segment_after(&segments, "video") {
        return Some(id.to_string());
    }

    // vm.tiktok.com/SHORT_ID
    if host.contains("vm.tiktok.com") {
        return segments.first().map(|s| s.to_string());
    }

    None
}

fn extract_instagram_id(url: &Url) -> Option<String> {
    // instagram.com/reel/VIDEO_ID or instagram.com/reels/VIDEO_ID
    let segments = path_segments(url);
    segment_after(&segments, "reel")
        .or_else(|| segment_after(&segments, "reels"))
        .map(str::to_string)
}

fn extract_twitter_id(url: &Url) -> Option<String> {
    // x.com/{username}/status/{id} or twitter.com/{username}/status/{id}
    let segments = path_segments(url);
    segment_after(&segments, "status").map(str::to_string)
}

fn extract_threads_id(url: &Url) -> Option<String> {
    // threads.net/@username/post/POST_ID
    let segments = path_segments(url);
    segment_after(&segments, "post").map(str::to_string)
}
