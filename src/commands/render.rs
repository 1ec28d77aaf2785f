use crate::commands::fetcher::{normalize_url, HttpPageFetcher, PageFetcher, USER_AGENT};
use crate::models::request::{FetchOptions, PageSnapshot};
use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;

const VIEWPORT_WIDTH: u32 = 1280;
const VIEWPORT_HEIGHT: u32 = 800;

/// Pause after scrolling so lazily loaded content lands in the markup.
const LAZY_LOAD_WAIT: Duration = Duration::from_millis(1000);

/// Renders pages in headless Chromium and captures a viewport PNG.
/// Falls back to a plain GET when the browser cannot be launched or the page
/// does not load within the fetch timeout.
pub struct BrowserPageFetcher {
    fallback: HttpPageFetcher,
    chrome_executable: Option<PathBuf>,
}

impl BrowserPageFetcher {
    pub fn new(fallback: HttpPageFetcher, chrome_executable: Option<PathBuf>) -> Self {
        Self {
            fallback,
            chrome_executable,
        }
    }

    async fn render(&self, url: &str) -> Result<PageSnapshot, String> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
            .arg(format!("--user-agent={USER_AGENT}"));
        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build()?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| format!("failed to launch browser: {e}"))?;
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let captured = match browser.new_page(url).await {
            Ok(page) => capture(&page).await,
            Err(e) => Err(format!("failed to open {url}: {e}")),
        };

        if let Err(e) = browser.close().await {
            log::debug!("browser did not close cleanly: {e}");
        }
        events.abort();
        captured
    }
}

async fn capture(page: &Page) -> Result<PageSnapshot, String> {
    page.wait_for_navigation()
        .await
        .map_err(|e| format!("navigation failed: {e}"))?;

    if let Err(e) = page.evaluate("window.scrollTo(0, document.body.scrollHeight)").await {
        log::debug!("scroll failed: {e}");
    }
    tokio::time::sleep(LAZY_LOAD_WAIT).await;

    let html = page
        .content()
        .await
        .map_err(|e| format!("failed to read rendered markup: {e}"))?;

    let screenshot = page
        .screenshot(
            ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build(),
        )
        .await;
    let screenshot_base64 = match screenshot {
        Ok(png) => Some(base64::engine::general_purpose::STANDARD.encode(png)),
        Err(e) => {
            log::warn!("screenshot failed: {e}");
            None
        }
    };

    Ok(PageSnapshot {
        html,
        screenshot_base64,
    })
}

#[async_trait]
impl PageFetcher for BrowserPageFetcher {
    async fn fetch(&self, url: &str, options: FetchOptions) -> PageSnapshot {
        let plain = FetchOptions {
            render: false,
            ..options
        };
        if !options.render {
            return self.fallback.fetch(url, plain).await;
        }

        let target = normalize_url(url);
        let budget = Duration::from_millis(options.timeout_ms) + LAZY_LOAD_WAIT;
        match tokio::time::timeout(budget, self.render(&target)).await {
            Ok(Ok(snapshot)) => {
                log::info!(
                    "rendered {target} ({} bytes, screenshot: {})",
                    snapshot.html.len(),
                    snapshot.screenshot_base64.is_some()
                );
                snapshot
            }
            Ok(Err(e)) => {
                log::warn!("rendering {target} failed, falling back to GET: {e}");
                self.fallback.fetch(url, plain).await
            }
            Err(_) => {
                log::warn!("rendering {target} timed out, falling back to GET");
                self.fallback.fetch(url, plain).await
            }
        }
    }
}
