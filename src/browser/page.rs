use crate::models::ImageRef;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// Errors that can occur while fetching a chapter page
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid chapter url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("navigation failed for {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("timed out after {timeout_secs}s waiting for '{selector}'")]
    PageLoadTimeout { selector: String, timeout_secs: u64 },

    #[error("could not read page content: {0}")]
    Content(String),

    #[error("browser session already closed")]
    SessionClosed,

    #[error("no chapter images found at {0}")]
    NoImages(String),
}

/// The page operations the chapter fetcher needs from a browser session.
///
/// `BrowserSession` implements this over headless Chrome; tests substitute a
/// mock so the orchestration can run without a browser install.
pub trait PageDriver {
    fn navigate(&self, url: &str) -> Result<(), FetchError>;

    /// Poll until an element matching `selector` is present, up to `timeout`
    fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), FetchError>;

    /// Rendered HTML of the current page
    fn content(&self) -> Result<String, FetchError>;

    /// Release the underlying session. Safe to call multiple times.
    fn close(&mut self);
}

/// How to recognize and enumerate chapter images on a rendered page
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Content marker whose presence means the reader has rendered
    pub wait_selector: String,

    /// Tried in order; the first selector that matches any element wins
    pub image_selectors: Vec<String>,

    /// Extra wait after the marker appears, for late lazy-loaded images
    pub settle_delay: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            wait_selector: "img".to_string(),
            image_selectors: vec![
                "img[src*='mangapark']".to_string(),
                ".reader-main img".to_string(),
                "img[data-src]".to_string(),
            ],
            settle_delay: Duration::from_secs(3),
        }
    }
}

/// Navigate to a chapter page and enumerate its images in on-page order.
///
/// The result is materialized immediately; the live page may change state
/// after navigation, so callers never re-enumerate.
pub async fn fetch_image_refs<D: PageDriver>(
    driver: &D,
    url: &str,
    timeout: Duration,
    settings: &FetchSettings,
) -> Result<Vec<ImageRef>, FetchError> {
    let base = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    driver.navigate(url)?;
    driver.wait_for(&settings.wait_selector, timeout)?;

    if !settings.settle_delay.is_zero() {
        tokio::time::sleep(settings.settle_delay).await;
    }

    let html = driver.content()?;
    let refs = extract_image_refs(&html, &base, &settings.image_selectors);

    if refs.is_empty() {
        return Err(FetchError::NoImages(url.to_string()));
    }

    log::info!("Found {} images in chapter", refs.len());
    Ok(refs)
}

/// Enumerate image elements in document order, extracting `src` with a
/// `data-src` fallback and skipping elements without a resolvable URL.
fn extract_image_refs(html: &str, base: &Url, selectors: &[String]) -> Vec<ImageRef> {
    let document = Html::parse_document(html);

    for sel in selectors {
        let Ok(selector) = Selector::parse(sel) else {
            log::warn!("Skipping invalid image selector: {}", sel);
            continue;
        };

        let mut urls = Vec::new();
        for element in document.select(&selector) {
            let Some(src) = element
                .value()
                .attr("src")
                .or_else(|| element.value().attr("data-src"))
            else {
                continue;
            };

            let src = src.trim();
            if src.is_empty() || src.starts_with("data:") {
                continue;
            }

            match base.join(src) {
                Ok(resolved) => urls.push(resolved.to_string()),
                Err(e) => log::warn!("Skipping unresolvable image url {}: {}", src, e),
            }
        }

        if !urls.is_empty() {
            return urls
                .into_iter()
                .enumerate()
                .map(|(i, url)| ImageRef {
                    index: i + 1,
                    url,
                })
                .collect();
        }
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://mangapark.io/title/87295-en-eleceed/8945341-en-ch.1").unwrap()
    }

    fn default_selectors() -> Vec<String> {
        FetchSettings::default().image_selectors
    }

    #[test]
    fn test_extract_in_document_order() {
        let html = r#"
            <html><body>
                <img src="https://cdn.mangapark.net/pages/1.jpg">
                <img src="https://cdn.mangapark.net/pages/2.jpg">
                <img src="https://cdn.mangapark.net/pages/3.jpg">
            </body></html>
        "#;
        let refs = extract_image_refs(html, &base(), &default_selectors());
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].index, 1);
        assert_eq!(refs[0].url, "https://cdn.mangapark.net/pages/1.jpg");
        assert_eq!(refs[2].index, 3);
        assert_eq!(refs[2].url, "https://cdn.mangapark.net/pages/3.jpg");
    }

    #[test]
    fn test_selector_fallback_to_data_src() {
        // No mangapark-hosted src and no reader-main container; the
        // data-src selector is the last resort.
        let html = r#"
            <html><body>
                <img data-src="https://cdn.example.net/lazy/1.jpg">
                <img data-src="https://cdn.example.net/lazy/2.jpg">
            </body></html>
        "#;
        let refs = extract_image_refs(html, &base(), &default_selectors());
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].url, "https://cdn.example.net/lazy/2.jpg");
    }

    #[test]
    fn test_skips_unresolvable_and_data_uris() {
        let html = r#"
            <html><body><div class="reader-main">
                <img src="data:image/gif;base64,R0lGOD">
                <img src="/pages/real.jpg">
                <img alt="spacer">
            </div></body></html>
        "#;
        let refs = extract_image_refs(html, &base(), &default_selectors());
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].url, "https://mangapark.io/pages/real.jpg");
        assert_eq!(refs[0].index, 1);
    }

    #[test]
    fn test_empty_page_yields_no_refs() {
        let refs = extract_image_refs("<html><body></body></html>", &base(), &default_selectors());
        assert!(refs.is_empty());
    }

    #[test]
    fn test_primary_selector_wins_over_fallbacks() {
        let html = r#"
            <html><body>
                <img src="https://cdn.mangapark.net/pages/1.jpg">
                <img data-src="https://ads.example.com/banner.jpg">
            </body></html>
        "#;
        let refs = extract_image_refs(html, &base(), &default_selectors());
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].url, "https://cdn.mangapark.net/pages/1.jpg");
    }
}
