use crate::analysis::normalizer::normalize_with_profile;
use crate::analysis::page_signals::extract_signals;
use crate::analysis::prompt::build_audit_prompt;
use crate::commands::completion::CompletionProvider;
use crate::commands::fetcher::PageFetcher;
use crate::commands::settings::EffectiveSettings;
use crate::error::AnalysisError;
use crate::models::request::{AnalyzeRequest, PageSnapshot};
use crate::models::score_report::ScoreReport;
use base64::Engine;
use std::sync::Arc;

/// Immutable per-process state shared by every analysis request
pub struct Analyzer {
    fetcher: Arc<dyn PageFetcher>,
    provider: Arc<dyn CompletionProvider>,
    settings: EffectiveSettings,
}

impl Analyzer {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        provider: Arc<dyn CompletionProvider>,
        settings: EffectiveSettings,
    ) -> Self {
        Self {
            fetcher,
            provider,
            settings,
        }
    }

    pub fn settings(&self) -> &EffectiveSettings {
        &self.settings
    }

    /// Fetch, prompt, complete and normalize for a single request.
    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<ScoreReport, AnalysisError> {
        let started = std::time::Instant::now();
        let website = request
            .website()
            .ok_or_else(|| AnalysisError::InvalidRequest("website is required".to_string()))?;
        log::info!("analyzing {website} for '{}'", request.name().unwrap_or("anonymous"));

        let snapshot = self.fetcher.fetch(website, self.settings.fetch).await;
        let signals = extract_signals(&snapshot.html);
        log::debug!("page signals: {signals:?}");

        let prompt = build_audit_prompt(
            request,
            &signals,
            &snapshot.html,
            &self.settings.weights,
            self.settings.html_preview_chars,
        );
        let image = decode_screenshot(&snapshot);

        let raw = self
            .provider
            .complete(&prompt, image.as_deref())
            .await
            .inspect_err(|e| log::error!("{e}"))?;

        let report = normalize_with_profile(&raw, &self.settings.weights, self.settings.badge_profile)
            .inspect_err(|e| log::error!("{}", e.details()))?;

        log::info!(
            "analysis of {website} finished in {}ms (overall {})",
            started.elapsed().as_millis(),
            report.overall
        );
        Ok(report)
    }
}

/// Parse a raw request body.
pub fn parse_request(body: &[u8]) -> Result<AnalyzeRequest, AnalysisError> {
    let request: AnalyzeRequest = serde_json::from_slice(body)
        .map_err(|e| AnalysisError::InvalidRequest(format!("body is not a valid request: {e}")))?;

    if request.website().is_none() {
        return Err(AnalysisError::InvalidRequest("website is required".to_string()));
    }
    Ok(request)
}

fn decode_screenshot(snapshot: &PageSnapshot) -> Option<Vec<u8>> {
    let encoded = snapshot.screenshot_base64.as_deref()?;
    match base64::engine::general_purpose::STANDARD.decode(encoded.trim()) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!("dropping undecodable screenshot: {e}");
            None
        }
    }
}
