use super::config::BrowserConfig;
use super::page::{FetchError, PageDriver};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Errors that can occur while managing a browser session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("browser environment unavailable: {0}")]
    EnvironmentUnavailable(String),

    #[error("invalid launch options: {0}")]
    Configuration(String),

    #[error("failed to open tab: {0}")]
    TabCreation(String),
}

/// One headless Chrome process, owned for the duration of a single chapter
/// download. Never reused across chapters.
pub struct BrowserSession {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
}

impl BrowserSession {
    /// Launch Chrome with stability-oriented flags and open the working tab
    pub fn launch(config: &BrowserConfig) -> Result<Self, SessionError> {
        use std::ffi::OsStr;

        // Store owned strings first for lifetime management
        let images_arg = config
            .disable_images
            .then(|| "--blink-settings=imagesEnabled=false".to_string());
        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args: Vec<&OsStr> = vec![OsStr::new("--disable-extensions")];

        if config.disable_sandbox {
            args.push(OsStr::new("--no-sandbox"));
            args.push(OsStr::new("--disable-setuid-sandbox"));
        }
        if config.disable_gpu {
            args.push(OsStr::new("--disable-gpu"));
        }
        if config.disable_dev_shm {
            args.push(OsStr::new("--disable-dev-shm-usage"));
        }
        if let Some(ref img) = images_arg {
            args.push(OsStr::new(img));
        }
        if let Some(ref ua) = user_agent_arg {
            args.push(OsStr::new(ua));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some(config.window_size))
            .args(args)
            // The connection must outlive slow chapters; downloads happen while
            // the tab sits idle.
            .idle_browser_timeout(Duration::from_secs(600))
            .build()
            .map_err(|e| SessionError::Configuration(e.to_string()))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| SessionError::EnvironmentUnavailable(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| SessionError::TabCreation(e.to_string()))?;
        tab.set_default_timeout(config.timeout());

        log::info!("Browser session started");

        Ok(Self {
            browser: Some(browser),
            tab: Some(tab),
        })
    }

    /// Title of the current page, for the environment self-test
    pub fn title(&self) -> Result<String, FetchError> {
        let tab = self.live_tab()?;
        tab.get_title()
            .map_err(|e| FetchError::Content(e.to_string()))
    }

    fn live_tab(&self) -> Result<&Arc<Tab>, FetchError> {
        self.tab.as_ref().ok_or(FetchError::SessionClosed)
    }
}

impl PageDriver for BrowserSession {
    fn navigate(&self, url: &str) -> Result<(), FetchError> {
        log::info!("Loading chapter page: {}", url);

        let tab = self.live_tab()?;

        tab.navigate_to(url).map_err(|e| FetchError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        tab.wait_until_navigated()
            .map_err(|e| FetchError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(())
    }

    fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), FetchError> {
        let tab = self.live_tab()?;
        let script = format!(
            r#"document.querySelector('{}') !== null"#,
            selector.replace('\'', "\\'")
        );
        let start = Instant::now();

        loop {
            if start.elapsed() > timeout {
                return Err(FetchError::PageLoadTimeout {
                    selector: selector.to_string(),
                    timeout_secs: timeout.as_secs(),
                });
            }

            if let Ok(result) = tab.evaluate(&script, false) {
                if result.value.and_then(|v| v.as_bool()) == Some(true) {
                    return Ok(());
                }
            }

            std::thread::sleep(Duration::from_millis(100));
        }
    }

    fn content(&self) -> Result<String, FetchError> {
        let tab = self.live_tab()?;
        tab.get_content()
            .map_err(|e| FetchError::Content(e.to_string()))
    }

    fn close(&mut self) {
        self.tab = None;
        if let Some(browser) = self.browser.take() {
            drop(browser);
            log::info!("Browser session closed");
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires Chrome to be installed
    fn test_session_launch_and_close() {
        let mut session = BrowserSession::launch(&BrowserConfig::default()).unwrap();
        session.close();
        // Release is idempotent
        session.close();
    }

    #[test]
    #[ignore] // Requires Chrome to be installed
    fn test_navigation_after_close_fails() {
        let mut session = BrowserSession::launch(&BrowserConfig::default()).unwrap();
        session.close();
        assert!(session.navigate("https://example.com").is_err());
    }
}
