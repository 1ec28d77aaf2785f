use crate::models::request::{FetchOptions, PageSnapshot};
use async_trait::async_trait;
use std::time::Duration;

pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (compatible; AuthorityAuditBot/1.0)";

/// Bodies past this size are truncated; the prompt only previews the start.
const MAX_HTML_BYTES: usize = 2 * 1024 * 1024;

/// Retrieves a page's markup. Never fails: errors become placeholder HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, options: FetchOptions) -> PageSnapshot;
}

/// Plain HTTP GET fetcher; cannot render JavaScript or take screenshots.
pub struct HttpPageFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {e}"))?;
        Ok(Self {
            client,
            max_body_bytes: MAX_HTML_BYTES,
        })
    }

    pub fn with_body_limit(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str, options: FetchOptions) -> PageSnapshot {
        let url = normalize_url(url);
        if options.render {
            log::debug!("HTTP fetcher does not render, fetching {url} directly");
        }

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_millis(options.timeout_ms))
            .send()
            .await;

        let html = match response {
            Ok(resp) if resp.status().is_success() => {
                match read_capped(resp, self.max_body_bytes).await {
                    Ok(body) => {
                        log::info!("fetched {url} ({} bytes)", body.len());
                        body
                    }
                    Err(e) => {
                        log::warn!("failed to read body of {url}: {e}");
                        unreachable_placeholder(&e.to_string())
                    }
                }
            }
            Ok(resp) => {
                log::warn!("{url} returned {}", resp.status());
                format!("<!-- Website returned {} -->\n", resp.status().as_u16())
            }
            Err(e) => {
                log::warn!("failed to fetch {url}: {e}");
                unreachable_placeholder(&e.to_string())
            }
        };

        PageSnapshot {
            html,
            screenshot_base64: None,
        }
    }
}

async fn read_capped(mut resp: reqwest::Response, limit: usize) -> Result<String, reqwest::Error> {
    let mut body = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        let room = limit - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            log::debug!("page body truncated at {limit} bytes");
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

pub(crate) fn unreachable_placeholder(message: &str) -> String {
    format!("<!-- Unable to fetch website: {message} -->\n")
}

/// Prefix `https://` when no scheme is given
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}
