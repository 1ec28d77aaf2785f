use crate::error::AnalysisError;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Encoded screenshots at or above this size are not attached.
pub const MAX_IMAGE_BASE64_CHARS: usize = 500_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub api_base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout_secs: u64,
}

/// Hosted language model turning a prompt (and optional PNG) into text
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str, image: Option<&[u8]>) -> Result<String, AnalysisError>;
}

/// Anthropic Messages API client
pub struct AnthropicProvider {
    config: CompletionConfig,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(config: CompletionConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {e}"))?;

        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.api_base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    async fn complete(&self, prompt: &str, image: Option<&[u8]>) -> Result<String, AnalysisError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            AnalysisError::CompletionProviderUnavailable(
                "CLAUDE_API_KEY not configured in environment variables".to_string(),
            )
        })?;

        let body = build_request_body(&self.config, prompt, image);
        let started = std::time::Instant::now();
        log::info!("calling completion API (model {})", self.config.model);

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::CompletionProviderUnavailable(format!(
                        "API request timed out after {} seconds",
                        self.config.timeout_secs
                    ))
                } else {
                    AnalysisError::CompletionProviderUnavailable(format!("API request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AnalysisError::CompletionProviderUnavailable(format!(
                "API returned HTTP {status}: {}",
                detail.trim()
            )));
        }

        let payload: Value = response.json().await.map_err(|e| {
            AnalysisError::CompletionProviderUnavailable(format!("API response was not JSON: {e}"))
        })?;

        log::info!("completion received in {}ms", started.elapsed().as_millis());
        response_text(&payload)
    }
}

fn build_request_body(config: &CompletionConfig, prompt: &str, image: Option<&[u8]>) -> Value {
    let encoded = image
        .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes))
        .filter(|data| data.len() < MAX_IMAGE_BASE64_CHARS);

    let content = match encoded {
        Some(data) => json!([
            { "type": "text", "text": prompt },
            {
                "type": "image",
                "source": { "type": "base64", "media_type": "image/png", "data": data }
            }
        ]),
        None => json!(prompt),
    };

    json!({
        "model": config.model,
        "max_tokens": config.max_tokens,
        "temperature": config.temperature,
        "messages": [{ "role": "user", "content": content }]
    })
}

/// Concatenated text blocks of a Messages API response
fn response_text(payload: &Value) -> Result<String, AnalysisError> {
    let text: String = payload
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AnalysisError::CompletionProviderUnavailable(
            "API returned an empty completion".to_string(),
        ));
    }
    Ok(text)
}
