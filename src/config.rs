use crate::browser::page::FetchSettings;
use crate::browser::BrowserConfig;
use crate::downloader::DownloaderConfig;
use crate::models::ChapterRequest;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_download_dir")]
    pub download_dir: String,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub page: PageConfig,
    #[serde(default)]
    pub browser: BrowserSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Retries per image after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial backoff in milliseconds; doubles per attempt
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    /// Backoff ceiling in milliseconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,

    /// Timeout for image requests in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Fixed pause between image downloads in milliseconds
    #[serde(default = "default_rate_limit")]
    pub rate_limit_delay_ms: u64,

    /// Referer sent with image requests
    #[serde(default = "default_referer")]
    pub referer: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PageConfig {
    /// Content marker whose presence means the reader has rendered
    #[serde(default = "default_wait_selector")]
    pub wait_selector: String,

    /// Image selectors tried in order; first match wins
    #[serde(default = "default_image_selectors")]
    pub image_selectors: Vec<String>,

    /// Extra wait after the marker appears, for lazy-loaded images
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrowserSettings {
    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Skip loading images in the browser; raw bytes are fetched separately
    #[serde(default = "default_true")]
    pub disable_images: bool,

    #[serde(default = "default_true")]
    pub disable_sandbox: bool,

    #[serde(default = "default_true")]
    pub disable_gpu: bool,

    #[serde(default = "default_true")]
    pub disable_dev_shm: bool,

    /// Override the default browser user agent
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_download_dir() -> String {
    "downloads".to_string()
}
fn default_true() -> bool {
    true
}
fn default_max_retries() -> usize {
    3
}
fn default_backoff_base() -> u64 {
    1000
}
fn default_max_backoff() -> u64 {
    8000
}
fn default_timeout() -> u64 {
    30
}
fn default_rate_limit() -> u64 {
    1000
}
fn default_referer() -> String {
    "https://mangapark.io/".to_string()
}
fn default_wait_selector() -> String {
    "img".to_string()
}
fn default_image_selectors() -> Vec<String> {
    FetchSettings::default().image_selectors
}
fn default_settle_delay() -> u64 {
    3000
}
fn default_window_width() -> u32 {
    1920
}
fn default_window_height() -> u32 {
    1080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            http: HttpConfig::default(),
            page: PageConfig::default(),
            browser: BrowserSettings::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base(),
            max_backoff_ms: default_max_backoff(),
            timeout_secs: default_timeout(),
            rate_limit_delay_ms: default_rate_limit(),
            referer: default_referer(),
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            wait_selector: default_wait_selector(),
            image_selectors: default_image_selectors(),
            settle_delay_ms: default_settle_delay(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: default_window_width(),
            window_height: default_window_height(),
            disable_images: true,
            disable_sandbox: true,
            disable_gpu: true,
            disable_dev_shm: true,
            user_agent: None,
        }
    }
}

impl Config {
    /// Load config.toml from the working directory, falling back to defaults
    pub fn load() -> Self {
        let path = Path::new("config.toml");
        if path.exists() {
            if let Ok(content) = fs::read_to_string(path) {
                match toml::from_str::<Config>(&content) {
                    Ok(cfg) => return cfg,
                    Err(e) => log::warn!("Ignoring invalid config.toml: {}", e),
                }
            }
        }
        Self::default()
    }

    /// Browser launch configuration for one session
    pub fn browser_config(&self, timeout: Duration) -> BrowserConfig {
        let mut config = BrowserConfig::default();
        config.headless = self.browser.headless;
        config.window_size = (self.browser.window_width, self.browser.window_height);
        config.timeout_seconds = timeout.as_secs();
        config.disable_images = self.browser.disable_images;
        config.disable_sandbox = self.browser.disable_sandbox;
        config.disable_gpu = self.browser.disable_gpu;
        config.disable_dev_shm = self.browser.disable_dev_shm;
        if self.browser.user_agent.is_some() {
            config.user_agent = self.browser.user_agent.clone();
        }
        config
    }

    /// Downloader configuration for one chapter request
    pub fn downloader_config(&self, request: &ChapterRequest) -> DownloaderConfig {
        DownloaderConfig {
            timeout: request.timeout,
            max_retries: request.max_retries,
            backoff_base_ms: self.http.backoff_base_ms,
            max_backoff_ms: self.http.max_backoff_ms,
            rate_limit_delay_ms: self.http.rate_limit_delay_ms,
            referer: Some(self.http.referer.clone()),
        }
    }

    /// Page fetch settings (wait marker, selector chain, settle delay)
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            wait_selector: self.page.wait_selector.clone(),
            image_selectors: self.page.image_selectors.clone(),
            settle_delay: Duration::from_millis(self.page.settle_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.download_dir, "downloads");
        assert_eq!(config.http.max_retries, 3);
        assert_eq!(config.http.backoff_base_ms, 1000);
        assert!(config.browser.headless);
        assert_eq!(config.page.wait_selector, "img");
        assert_eq!(config.page.image_selectors.len(), 3);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            download_dir = "/tmp/manga"

            [http]
            max_retries = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.download_dir, "/tmp/manga");
        assert_eq!(config.http.max_retries, 1);
        assert_eq!(config.http.backoff_base_ms, 1000);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_downloader_config_uses_request_values() {
        let config = Config::default();
        let request = ChapterRequest {
            url: "https://mangapark.io/x/y".to_string(),
            output_dir: "out".into(),
            name: "y".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 5,
        };

        let dl = config.downloader_config(&request);
        assert_eq!(dl.timeout, Duration::from_secs(60));
        assert_eq!(dl.max_retries, 5);
        assert_eq!(dl.referer.as_deref(), Some("https://mangapark.io/"));
    }
}
