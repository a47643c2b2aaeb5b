//! Chapter download orchestration
//!
//! One invocation is strictly linear: acquire a browser session, enumerate
//! the chapter images, save each in order, release the session. Image-level
//! failures are recorded without aborting the rest; session- and fetch-level
//! failures abort the chapter and propagate after the session is released.

use crate::browser::page::FetchSettings;
use crate::browser::{fetch_image_refs, BrowserSession, FetchError, PageDriver, SessionError};
use crate::config::Config;
use crate::downloader::ImageDownloader;
use crate::helpers::page_filename;
use crate::models::{ChapterRequest, ChapterResult, ImageFailure};

/// Errors that abort a whole chapter
#[derive(Debug, thiserror::Error)]
pub enum ChapterError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Download a complete chapter with a freshly launched browser session.
///
/// The session never outlives this call; it is closed on success and on
/// every failure path, and is never reused across chapters.
pub async fn download_chapter(
    request: &ChapterRequest,
    config: &Config,
) -> Result<ChapterResult, ChapterError> {
    let downloader = ImageDownloader::with_config(config.downloader_config(request))?;
    let mut session = BrowserSession::launch(&config.browser_config(request.timeout))?;

    run_chapter(&mut session, &downloader, request, &config.fetch_settings()).await
}

/// Orchestrate one chapter against any page driver.
///
/// The driver is closed exactly once before this returns, whichever way the
/// chapter ends.
pub async fn run_chapter<D: PageDriver>(
    driver: &mut D,
    downloader: &ImageDownloader,
    request: &ChapterRequest,
    settings: &FetchSettings,
) -> Result<ChapterResult, ChapterError> {
    let result = run_inner(driver, downloader, request, settings).await;
    driver.close();
    result
}

async fn run_inner<D: PageDriver>(
    driver: &D,
    downloader: &ImageDownloader,
    request: &ChapterRequest,
    settings: &FetchSettings,
) -> Result<ChapterResult, ChapterError> {
    log::info!("Starting download for: {}", request.name);

    let refs = fetch_image_refs(driver, &request.url, request.timeout, settings).await?;

    let mut result = ChapterResult {
        attempted: refs.len(),
        ..Default::default()
    };

    for image in &refs {
        let dest = request
            .output_dir
            .join(page_filename(&request.name, image.index, &image.url));

        match downloader.save(&image.url, &dest).await {
            Ok(()) => result.saved += 1,
            Err(e) => {
                log::error!("Failed to save page {}: {}", image.index, e);
                result.failures.push(ImageFailure {
                    index: image.index,
                    url: image.url.clone(),
                    reason: e.to_string(),
                });
            }
        }

        if image.index < refs.len() {
            downloader.rate_limit_delay().await;
        }
    }

    log::info!(
        "Chapter '{}' completed: {}/{} images downloaded",
        request.name,
        result.saved,
        result.attempted
    );

    Ok(result)
}
