//! Generic link-preview extraction
//!
//! Platforms without a usable oEmbed endpoint (Instagram, X, Threads) get a
//! best-effort OpenGraph scrape of the page: `og:title` with a `<title>`
//! fallback, and the `og:image` bytes if the tag resolves to a fetchable URL.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::transport::HttpTransport;

const MAX_HTML_SIZE: usize = 512 * 1024; // 512KB max HTML
const MAX_IMAGE_SIZE: usize = 2 * 1024 * 1024; // 2MB max image

// <meta property="og:x" content="..."> in either attribute order.
static OG_TITLE: Lazy<[Regex; 2]> = Lazy::new(|| og_patterns("og:title"));
static OG_IMAGE: Lazy<[Regex; 2]> = Lazy::new(|| og_patterns("og:image"));

static TITLE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<title[^>]*>([^<]+)</title>").expect("static regex"));

fn og_patterns(property: &str) -> [Regex; 2] {
    let escaped = regex::escape(property);
    let property_first = format!(
        r#"<meta[^>]*property=["']{escaped}["'][^>]*content=["']([^"']+)["']"#
    );
    let content_first = format!(
        r#"<meta[^>]*content=["']([^"']+)["'][^>]*property=["']{escaped}["']"#
    );
    [
        Regex::new(&property_first).expect("static regex"),
        Regex::new(&content_first).expect("static regex"),
    ]
}

/// Best-effort preview of an arbitrary page.
#[derive(Debug, Default)]
pub(crate) struct LinkPreview {
    pub(crate) title: Option<String>,
    pub(crate) image: Option<Vec<u8>>,
}

/// Fetch and scrape `page_url`. Every failure degrades to empty fields.
pub(crate) async fn fetch_preview(
    transport: &dyn HttpTransport,
    page_url: &str,
) -> LinkPreview {
    let Ok(body) = transport.get(page_url).await else {
        return LinkPreview::default();
    };
    if body.len() > MAX_HTML_SIZE {
        return LinkPreview::default();
    }
    let html = String::from_utf8_lossy(&body);

    let title = og_content(&html, &OG_TITLE).or_else(|| title_tag(&html));

    let image = match og_content(&html, &OG_IMAGE).and_then(|u| resolve_url(page_url, &u)) {
        Some(image_url) => fetch_image(transport, &image_url).await,
        None => None,
    };

    LinkPreview { title, image }
}

fn og_content(html: &str, patterns: &[Regex; 2]) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(html))
        .map(|captures| captures[1].to_string())
}

fn title_tag(html: &str) -> Option<String> {
    TITLE_TAG
        .captures(html)
        .map(|captures| captures[1].trim().to_string())
}

/// Resolve a possibly relative og:image URL against the page URL.
fn resolve_url(base: &str, relative: &str) -> Option<String> {
    if relative.starts_with("http://") || relative.starts_with("https://") {
        return Some(relative.to_string());
    }
    if relative.starts_with("//") {
        return Some(format!("https:{relative}"));
    }
    url::Url::parse(base)
        .ok()?
        .join(relative)
        .ok()
        .map(|u| u.to_string())
}

async fn fetch_image(transport: &dyn HttpTransport, url: &str) -> Option<Vec<u8>> {
    let bytes = transport.get(url).await.ok()?;
    if bytes.len() > MAX_IMAGE_SIZE {
        return None;
    }
    Some(bytes)
}
