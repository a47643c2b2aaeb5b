//! Browser automation module for fetching JavaScript-rendered chapter pages
//!
//! This module owns the lifetime of one headless Chrome process per chapter
//! download and exposes the page operations the chapter fetcher needs.
//!
//! # Example
//!
//! ```no_run
//! use mangapark_dl::browser::{BrowserConfig, BrowserSession, PageDriver};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Launch a session with default configuration
//! let mut session = BrowserSession::launch(&BrowserConfig::default())?;
//!
//! // Navigate and wait for the reader to render
//! session.navigate("https://mangapark.io/title/87295-en-eleceed/8945341-en-ch.1")?;
//! session.wait_for("img", Duration::from_secs(30))?;
//! let html = session.content()?;
//!
//! println!("Rendered {} bytes of HTML", html.len());
//!
//! // Teardown is idempotent and also runs on drop
//! session.close();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod page;
pub mod session;

// Re-export main types for convenience
pub use config::BrowserConfig;
pub use page::{fetch_image_refs, FetchError, PageDriver};
pub use session::{BrowserSession, SessionError};
