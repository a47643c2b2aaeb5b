use rand::Rng;
use reqwest::{header, Client, ClientBuilder, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;

/// User agents to rotate through to avoid bot detection
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Errors that can occur while saving one image
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("server returned {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("{url} failed after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        url: String,
        attempts: usize,
        last_error: String,
    },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),
}

/// Configuration for the image downloader
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: usize,
    pub backoff_base_ms: u64,
    pub max_backoff_ms: u64,
    /// Fixed pause between image downloads
    pub rate_limit_delay_ms: u64,
    /// Referer sent with every image request
    pub referer: Option<String>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff_base_ms: 1000,
            max_backoff_ms: 8000,
            rate_limit_delay_ms: 1000,
            referer: Some("https://mangapark.io/".to_string()),
        }
    }
}

/// HTTP downloader for chapter images, with bounded retries and atomic writes
pub struct ImageDownloader {
    client: Client,
    config: DownloaderConfig,
}

impl ImageDownloader {
    /// Create a downloader with default configuration
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(DownloaderConfig::default())
    }

    /// Create a downloader with custom configuration
    pub fn with_config(config: DownloaderConfig) -> Result<Self, reqwest::Error> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            "image/avif,image/webp,image/apng,image/*,*/*;q=0.8"
                .parse()
                .expect("static header"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            "en-US,en;q=0.9".parse().expect("static header"),
        );
        if let Some(ref referer) = config.referer {
            if let Ok(value) = referer.parse() {
                headers.insert(header::REFERER, value);
            }
        }

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(Self::random_user_agent())
            .cookie_store(true)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Pause between image requests to avoid overloading the remote server
    pub async fn rate_limit_delay(&self) {
        sleep(Duration::from_millis(self.config.rate_limit_delay_ms)).await;
    }

    /// Fetch `url` and write the full payload to `dest`.
    ///
    /// Transient failures back off exponentially and retry; permanent
    /// failures (404/410 and other non-retryable statuses) return at once
    /// without consuming retries. No partial file remains at `dest` after a
    /// failed attempt.
    pub async fn save(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        let attempts = self.config.max_retries + 1;
        let mut last_error = String::new();

        for attempt in 0..attempts {
            // Rotate user agent for each attempt
            let request = self
                .client
                .get(url)
                .header(header::USER_AGENT, Self::random_user_agent());

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
                        return Err(DownloadError::NotFound(url.to_string()));
                    }

                    if status.is_success() {
                        match response.bytes().await {
                            Ok(bytes) => {
                                self.write_atomic(dest, &bytes)?;
                                log::info!(
                                    "Downloaded: {}",
                                    dest.file_name()
                                        .map(|n| n.to_string_lossy().into_owned())
                                        .unwrap_or_else(|| dest.display().to_string())
                                );
                                return Ok(());
                            }
                            // Body cut off mid-transfer; treat like a network error
                            Err(e) => last_error = e.to_string(),
                        }
                    } else if Self::is_retryable_status(status) {
                        last_error = format!("status {}", status);
                    } else {
                        return Err(DownloadError::HttpStatus {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }
                }
                Err(e) => {
                    let transient = e.is_timeout() || e.is_connect() || e.is_request();
                    if !transient {
                        return Err(DownloadError::Request(e));
                    }
                    last_error = e.to_string();
                }
            }

            if attempt + 1 < attempts {
                let delay = self.retry_delay(attempt);
                log::warn!(
                    "Attempt {}/{} failed for {}: {}; backing off {}ms",
                    attempt + 1,
                    attempts,
                    url,
                    last_error,
                    delay.as_millis()
                );
                sleep(delay).await;
            }
        }

        Err(DownloadError::MaxRetriesExceeded {
            url: url.to_string(),
            attempts,
            last_error,
        })
    }

    /// Write to a temporary path and move into place only on full success
    fn write_atomic(&self, dest: &Path, bytes: &[u8]) -> Result<(), DownloadError> {
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = dest.with_extension("part");
        if let Err(e) = std::fs::write(&tmp, bytes) {
            let _ = std::fs::remove_file(&tmp);
            return Err(DownloadError::Filesystem(e));
        }
        if let Err(e) = std::fs::rename(&tmp, dest) {
            let _ = std::fs::remove_file(&tmp);
            return Err(DownloadError::Filesystem(e));
        }
        Ok(())
    }

    /// Exponential backoff with jitter: backoff_base * 2^attempt, capped.
    /// The cap is applied after the jitter so delays never decrease across
    /// attempts: doubling outruns ±25% jitter, and capped attempts are equal.
    fn retry_delay(&self, attempt: usize) -> Duration {
        let base_delay = self.config.backoff_base_ms;
        let max_delay = self.config.max_backoff_ms;

        let delay_ms = base_delay.saturating_mul(2u64.saturating_pow(attempt as u32));

        // ±25% jitter to avoid thundering herd
        let mut rng = rand::thread_rng();
        let jitter = rng.gen_range(0.75..=1.25);
        let final_delay_ms = ((delay_ms as f64 * jitter) as u64).min(max_delay);

        Duration::from_millis(final_delay_ms)
    }

    fn is_retryable_status(status: StatusCode) -> bool {
        matches!(
            status.as_u16(),
            // Rate limiting
            429 |
            // Server errors
            500 | 502 | 503 | 504 |
            // Cloudflare errors
            520 | 521 | 522 | 523 | 524 | 525 | 526 | 527
        )
    }

    fn random_user_agent() -> &'static str {
        let mut rng = rand::thread_rng();
        USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())]
    }
}
