pub mod analysis;
pub mod commands;
pub mod error;
pub mod models;
pub mod server;

use commands::{
    analyze::Analyzer,
    completion::AnthropicProvider,
    fetcher::{HttpPageFetcher, PageFetcher},
    render::BrowserPageFetcher,
    settings::{load_effective_settings, settings_path, SETTINGS_PATH_ENV},
};
use std::sync::Arc;

pub const API_KEY_ENV: &str = "CLAUDE_API_KEY";

/// Load settings and secrets once, wire the collaborators, and serve.
pub async fn run() -> anyhow::Result<()> {
    let path = settings_path(std::env::var(SETTINGS_PATH_ENV).ok());
    let mut settings = load_effective_settings(&path).map_err(anyhow::Error::msg)?;
    log::info!("loaded settings from {}", path.display());

    settings.completion.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
    if settings.completion.api_key.is_none() {
        log::warn!("{API_KEY_ENV} is not set; analysis requests will fail");
    }

    let http = HttpPageFetcher::new().map_err(anyhow::Error::msg)?;
    let fetcher: Arc<dyn PageFetcher> = if settings.fetch.render {
        log::info!("rendering pages with headless Chromium");
        Arc::new(BrowserPageFetcher::new(http, settings.chrome_executable.clone()))
    } else {
        Arc::new(http)
    };
    let provider = AnthropicProvider::new(settings.completion.clone()).map_err(anyhow::Error::msg)?;
    let analyzer = Analyzer::new(fetcher, Arc::new(provider), settings);

    server::serve(Arc::new(analyzer)).await
}
