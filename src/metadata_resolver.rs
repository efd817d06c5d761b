//! Metadata resolution: per-platform title and thumbnail fetching
//!
//! Given a classified URL, fetches a best-effort (title, thumbnail) pair
//! using the strategy each platform requires: oEmbed JSON for YouTube and
//! TikTok, a generic link preview for the rest. The public method never
//! fails — every transport or decode error degrades to a `None` field.

use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::link_metadata;
use crate::models::{ClassifiedUrl, Platform, VideoMetadata};
use crate::thumbnail_cache::ThumbnailCache;
use crate::transport::HttpTransport;

const TIKTOK_OEMBED: &str = "https://www.tiktok.com/oembed";

#[derive(Deserialize)]
struct OembedResponse {
    title: Option<String>,
    thumbnail_url: Option<String>,
}

pub struct MetadataResolver {
    transport: Arc<dyn HttpTransport>,
    cache: ThumbnailCache,
}

impl MetadataResolver {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            cache: ThumbnailCache::new(),
        }
    }

    /// Fetch display metadata for a classified URL.
    ///
    /// Sub-steps run sequentially (title, then thumbnail candidates in
    /// priority order); separate invocations are fully independent and may
    /// run concurrently.
    pub async fn fetch_metadata(&self, classified: &ClassifiedUrl) -> VideoMetadata {
        match classified.platform {
            Platform::Youtube => {
                self.fetch_youtube(classified.video_id.as_deref(), &classified.original_url)
                    .await
            }
            Platform::Tiktok => self.fetch_tiktok(&classified.original_url).await,
            Platform::Instagram | Platform::Twitter | Platform::Threads => {
                self.fetch_link_preview(&classified.original_url).await
            }
            Platform::Unknown => VideoMetadata::empty(),
        }
    }

    /// Drop all cached thumbnail bytes.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    // ─────────────────────────────────────────────────────────────────────
    // YouTube
    // ─────────────────────────────────────────────────────────────────────

    async fn fetch_youtube(&self, video_id: Option<&str>, original_url: &str) -> VideoMetadata {
        let Some(video_id) = video_id else {
            return VideoMetadata::empty();
        };

        let title = self.fetch_youtube_title(video_id).await;

        // Shorts are portrait, so the portrait frames come before the
        // standard horizontal fallback. Tried strictly in order; a cache hit
        // under the bookmark URL short-circuits the whole chain.
        let candidates = [
            format!("https://i.ytimg.com/vi/{video_id}/oardefault.jpg"),
            format!("https://i.ytimg.com/vi/{video_id}/oar2.jpg"),
            format!("https://img.youtube.com/vi/{video_id}/hqdefault.jpg"),
        ];

        let mut thumbnail = None;
        for candidate in &candidates {
            if let Some(bytes) = self
                .cache
                .fetch(self.transport.as_ref(), candidate, original_url)
                .await
            {
                thumbnail = Some(bytes);
                break;
            }
        }

        VideoMetadata { title, thumbnail }
    }

    async fn fetch_youtube_title(&self, video_id: &str) -> Option<String> {
        let endpoint = format!(
            "https://www.youtube.com/oembed?url=https://www.youtube.com/watch?v={video_id}&format=json"
        );
        self.fetch_oembed(&endpoint).await.and_then(|o| o.title)
    }

    // ─────────────────────────────────────────────────────────────────────
    // TikTok
    // ─────────────────────────────────────────────────────────────────────

    async fn fetch_tiktok(&self, original_url: &str) -> VideoMetadata {
        let Ok(endpoint) = Url::parse_with_params(TIKTOK_OEMBED, [("url", original_url)]) else {
            return VideoMetadata::empty();
        };
        let Some(oembed) = self.fetch_oembed(endpoint.as_str()).await else {
            return VideoMetadata::empty();
        };

        let thumbnail = match oembed.thumbnail_url.as_deref() {
            Some(thumbnail_url) => {
                self.cache
                    .fetch(self.transport.as_ref(), thumbnail_url, original_url)
                    .await
            }
            None => None,
        };

        VideoMetadata {
            title: oembed.title,
            thumbnail,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Instagram / X / Threads
    // ─────────────────────────────────────────────────────────────────────

    async fn fetch_link_preview(&self, original_url: &str) -> VideoMetadata {
        let preview = link_metadata::fetch_preview(self.transport.as_ref(), original_url).await;
        VideoMetadata {
            title: preview.title,
            thumbnail: preview.image,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Shared
    // ─────────────────────────────────────────────────────────────────────

    async fn fetch_oembed(&self, endpoint: &str) -> Option<OembedResponse> {
        let body = match self.transport.get(endpoint).await {
            Ok(body) => body,
            Err(err) => {
                warn!(endpoint, error = %err, "oEmbed request failed");
                return None;
            }
        };
        match serde_json::from_slice(&body) {
            Ok(response) => Some(response),
            Err(err) => {
                warn!(endpoint, error = %err, "oEmbed payload malformed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::MockTransport;
    use crate::url_parser::classify;

    const WATCH_URL: &str = "https://www.youtube.com/watch?v=xyz";
    const OEMBED_URL: &str =
        "https://www.youtube.com/oembed?url=https://www.youtube.com/watch?v=xyz&format=json";
    const PORTRAIT: &str = "https://i.ytimg.com/vi/xyz/oardefault.jpg";
    const PORTRAIT_ALT: &str = "https://i.ytimg.com/vi/xyz/oar2.jpg";
    const HORIZONTAL: &str = "https://img.youtube.com/vi/xyz/hqdefault.jpg";

    fn resolver(transport: Arc<MockTransport>) -> MetadataResolver {
        MetadataResolver::new(transport)
    }

    #[tokio::test]
    async fn test_unknown_platform_is_empty_without_network() {
        let transport = Arc::new(MockTransport::new());
        let resolver = resolver(Arc::clone(&transport));

        let metadata = resolver.fetch_metadata(&classify("not a url")).await;
        assert!(metadata.is_empty());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_youtube_without_id_is_empty_without_network() {
        let transport = Arc::new(MockTransport::new());
        let resolver = resolver(Arc::clone(&transport));

        let classified = classify("https://www.youtube.com/feed/history");
        assert_eq!(classified.platform, Platform::Youtube);
        assert!(classified.video_id.is_none());

        let metadata = resolver.fetch_metadata(&classified).await;
        assert!(metadata.is_empty());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_youtube_title_and_first_candidate() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(OEMBED_URL, br#"{"title":"A short"}"#.to_vec());
        transport.respond(PORTRAIT, b"portrait".to_vec());
        let resolver = resolver(Arc::clone(&transport));

        let metadata = resolver.fetch_metadata(&classify(WATCH_URL)).await;
        assert_eq!(metadata.title.as_deref(), Some("A short"));
        assert_eq!(metadata.thumbnail.as_deref(), Some(b"portrait".as_slice()));

        // First candidate succeeded: the later ones are never attempted.
        assert_eq!(transport.calls(), vec![OEMBED_URL, PORTRAIT]);
    }

    #[tokio::test]
    async fn test_youtube_fallback_order_until_third() {
        let transport = Arc::new(MockTransport::new());
        transport.fail(OEMBED_URL);
        transport.fail(PORTRAIT);
        transport.fail(PORTRAIT_ALT);
        transport.respond(HORIZONTAL, b"hq".to_vec());
        let resolver = resolver(Arc::clone(&transport));

        let metadata = resolver.fetch_metadata(&classify(WATCH_URL)).await;

        // Title fetch failed but the thumbnail chain still ran to success.
        assert!(metadata.title.is_none());
        assert_eq!(metadata.thumbnail.as_deref(), Some(b"hq".as_slice()));
        assert_eq!(
            transport.calls(),
            vec![OEMBED_URL, PORTRAIT, PORTRAIT_ALT, HORIZONTAL]
        );
    }

    #[tokio::test]
    async fn test_youtube_all_candidates_fail() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(OEMBED_URL, br#"{"title":"Still titled"}"#.to_vec());
        let resolver = resolver(Arc::clone(&transport));

        let metadata = resolver.fetch_metadata(&classify(WATCH_URL)).await;
        assert_eq!(metadata.title.as_deref(), Some("Still titled"));
        assert!(metadata.thumbnail.is_none());
    }

    #[tokio::test]
    async fn test_youtube_malformed_oembed_yields_no_title() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(OEMBED_URL, b"<html>not json</html>".to_vec());
        transport.respond(PORTRAIT, b"p".to_vec());
        let resolver = resolver(Arc::clone(&transport));

        let metadata = resolver.fetch_metadata(&classify(WATCH_URL)).await;
        assert!(metadata.title.is_none());
        assert_eq!(metadata.thumbnail.as_deref(), Some(b"p".as_slice()));
    }

    #[tokio::test]
    async fn test_youtube_thumbnail_cached_by_original_url() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(OEMBED_URL, br#"{"title":"t"}"#.to_vec());
        transport.respond(PORTRAIT, b"bytes".to_vec());
        let resolver = resolver(Arc::clone(&transport));

        let classified = classify(WATCH_URL);
        let first = resolver.fetch_metadata(&classified).await;
        let second = resolver.fetch_metadata(&classified).await;

        assert_eq!(first.thumbnail, second.thumbnail);
        // Two oEmbed calls, but only one thumbnail fetch: the second run hits
        // the cache entry keyed by the bookmark URL.
        let thumbnail_calls = transport
            .calls()
            .iter()
            .filter(|u| u.as_str() == PORTRAIT)
            .count();
        assert_eq!(thumbnail_calls, 1);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(OEMBED_URL, br#"{"title":"t"}"#.to_vec());
        transport.respond(PORTRAIT, b"bytes".to_vec());
        let resolver = resolver(Arc::clone(&transport));

        let classified = classify(WATCH_URL);
        resolver.fetch_metadata(&classified).await;
        resolver.clear_cache();
        resolver.fetch_metadata(&classified).await;

        let thumbnail_calls = transport
            .calls()
            .iter()
            .filter(|u| u.as_str() == PORTRAIT)
            .count();
        assert_eq!(thumbnail_calls, 2);
    }

    #[tokio::test]
    async fn test_tiktok_oembed() {
        let video_url = "https://www.tiktok.com/@user/video/111222";
        let endpoint = Url::parse_with_params(TIKTOK_OEMBED, [("url", video_url)]).unwrap();

        let transport = Arc::new(MockTransport::new());
        transport.respond(
            endpoint.as_str(),
            br#"{"title":"Dance","thumbnail_url":"https://p16.tiktokcdn.com/img.jpeg"}"#.to_vec(),
        );
        transport.respond("https://p16.tiktokcdn.com/img.jpeg", b"tk".to_vec());
        let resolver = resolver(Arc::clone(&transport));

        let metadata = resolver.fetch_metadata(&classify(video_url)).await;
        assert_eq!(metadata.title.as_deref(), Some("Dance"));
        assert_eq!(metadata.thumbnail.as_deref(), Some(b"tk".as_slice()));
    }

    #[tokio::test]
    async fn test_tiktok_oembed_without_thumbnail_url() {
        let video_url = "https://www.tiktok.com/@user/video/333";
        let endpoint = Url::parse_with_params(TIKTOK_OEMBED, [("url", video_url)]).unwrap();

        let transport = Arc::new(MockTransport::new());
        transport.respond(endpoint.as_str(), br#"{"title":"No thumb"}"#.to_vec());
        let resolver = resolver(Arc::clone(&transport));

        let metadata = resolver.fetch_metadata(&classify(video_url)).await;
        assert_eq!(metadata.title.as_deref(), Some("No thumb"));
        assert!(metadata.thumbnail.is_none());
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_tiktok_transport_failure_is_empty() {
        let transport = Arc::new(MockTransport::new());
        let resolver = resolver(Arc::clone(&transport));

        let metadata = resolver
            .fetch_metadata(&classify("https://www.tiktok.com/@user/video/404"))
            .await;
        assert!(metadata.is_empty());
    }

    #[tokio::test]
    async fn test_link_preview_platforms_share_one_path() {
        for url in [
            "https://www.instagram.com/reel/abcXYZ/",
            "https://x.com/user/status/999",
            "https://www.threads.net/@user/post/C8abc",
        ] {
            let transport = Arc::new(MockTransport::new());
            transport.respond(
                url,
                br#"<meta property="og:title" content="Preview title">"#.to_vec(),
            );
            let resolver = resolver(Arc::clone(&transport));

            let metadata = resolver.fetch_metadata(&classify(url)).await;
            assert_eq!(metadata.title.as_deref(), Some("Preview title"), "{url}");
            assert_eq!(transport.calls(), vec![url]);
        }
    }
}
