use std::time::Duration;

/// Configuration for one browser session
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run Chrome in headless mode
    pub headless: bool,

    /// Browser window size
    pub window_size: (u32, u32),

    /// Custom user agent
    pub user_agent: Option<String>,

    /// Page-load wait ceiling in seconds
    pub timeout_seconds: u64,

    /// Skip loading images in the browser; raw bytes are fetched separately
    pub disable_images: bool,

    /// Pass --no-sandbox / --disable-setuid-sandbox (required in containers)
    pub disable_sandbox: bool,

    /// Pass --disable-gpu
    pub disable_gpu: bool,

    /// Pass --disable-dev-shm-usage, the /dev/shm workaround for small shm mounts
    pub disable_dev_shm: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1920, 1080),
            user_agent: Some(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            timeout_seconds: 30,
            disable_images: true,
            disable_sandbox: true,
            disable_gpu: true,
            disable_dev_shm: true,
        }
    }
}

impl BrowserConfig {
    /// Create a configuration for debugging (non-headless, visible browser)
    pub fn debug_mode() -> Self {
        let mut config = Self::default();
        config.headless = false;
        config.disable_images = false;
        config
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert_eq!(config.window_size, (1920, 1080));
        assert!(config.user_agent.is_some());
        assert!(config.disable_images);
        assert!(config.disable_dev_shm);
    }

    #[test]
    fn test_debug_mode() {
        let config = BrowserConfig::debug_mode();
        assert!(!config.headless);
        assert!(!config.disable_images);
    }

    #[test]
    fn test_timeout_duration() {
        let mut config = BrowserConfig::default();
        config.timeout_seconds = 45;
        assert_eq!(config.timeout(), Duration::from_secs(45));
    }
}
