use clap::Parser;
use mangapark_dl::browser::{BrowserSession, PageDriver};
use mangapark_dl::chapter::download_chapter;
use mangapark_dl::config::Config;
use mangapark_dl::helpers::{derive_chapter_name, sanitize_filename};
use mangapark_dl::models::{ChapterRequest, ChapterResult};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

const EXIT_CODES_HELP: &str = "Exit codes:
  0  chapter fully downloaded
  1  unrecoverable failure (browser launch, page fetch)
  2  chapter processed but some pages failed";

/// Download manga chapters from MangaPark using headless Chrome
#[derive(Debug, Parser)]
#[command(name = "mangapark-dl", version, about, after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Chapter page URL
    #[arg(required_unless_present = "check")]
    url: Option<String>,

    /// Destination directory for saved images
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Base filename for saved images (default: derived from the URL)
    #[arg(short, long)]
    name: Option<String>,

    /// Page-load and download timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Run Chrome with a visible window
    #[arg(long)]
    headed: bool,

    /// Verify the Chrome environment and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = Config::load();
    if cli.headed {
        config.browser.headless = false;
        config.browser.disable_images = false;
    }

    if cli.check {
        return check_environment(&config);
    }

    let url = cli.url.expect("clap requires a url unless --check");
    let request = ChapterRequest {
        name: cli
            .name
            .map(|n| sanitize_filename(&n))
            .unwrap_or_else(|| derive_chapter_name(&url)),
        output_dir: cli
            .output
            .unwrap_or_else(|| PathBuf::from(&config.download_dir)),
        timeout: Duration::from_secs(cli.timeout.unwrap_or(config.http.timeout_secs)),
        max_retries: config.http.max_retries,
        url,
    };

    log::info!("Download path set to: {}", request.output_dir.display());

    let outcome = tokio::select! {
        res = download_chapter(&request, &config) => res,
        _ = tokio::signal::ctrl_c() => {
            // Dropping the in-flight download drops the session, which
            // closes the browser process.
            log::warn!("Interrupted, shutting down");
            return ExitCode::from(130);
        }
    };

    match outcome {
        Ok(result) if result.is_complete() => {
            log::info!("Download completed successfully!");
            print_summary(&result);
            ExitCode::SUCCESS
        }
        Ok(result) => {
            log::warn!(
                "Chapter processed with {} failed page(s)",
                result.failures.len()
            );
            print_summary(&result);
            ExitCode::from(2)
        }
        Err(e) => {
            log::error!("Download failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// One JSON summary line on stdout; everything else goes to the log stream
fn print_summary(result: &ChapterResult) {
    if let Ok(json) = serde_json::to_string(result) {
        println!("{}", json);
    }
}

/// Launch Chrome, load a known page, and tear down again
fn check_environment(config: &Config) -> ExitCode {
    log::info!("Testing Chrome environment...");

    let timeout = Duration::from_secs(config.http.timeout_secs);
    let mut session = match BrowserSession::launch(&config.browser_config(timeout)) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Chrome check failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = session
        .navigate("https://httpbin.org/get")
        .and_then(|()| session.title());
    session.close();

    match outcome {
        Ok(title) => {
            log::info!("Chrome environment OK (loaded page '{}')", title);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Chrome check failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
