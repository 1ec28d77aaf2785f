/// Failures of a single analysis request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Completion provider unavailable: {0}")]
    CompletionProviderUnavailable(String),

    #[error("Completion did not contain a parseable JSON object")]
    MalformedCompletion { raw: String },
}

const EXCERPT_CHARS: usize = 200;

impl AnalysisError {
    /// Machine-readable detail string for the error response body
    pub fn details(&self) -> String {
        match self {
            AnalysisError::InvalidRequest(msg) => msg.clone(),
            AnalysisError::CompletionProviderUnavailable(msg) => {
                format!("Completion provider failed: {msg}")
            }
            AnalysisError::MalformedCompletion { raw } => format!(
                "Malformed completion: the provider responded but no JSON object could be parsed (excerpt: {:?})",
                excerpt(raw)
            ),
        }
    }

    pub fn tip(&self) -> &'static str {
        match self {
            AnalysisError::InvalidRequest(_) => {
                "Send a JSON body with at least a non-empty \"website\" field."
            }
            AnalysisError::CompletionProviderUnavailable(_) => {
                "Check that CLAUDE_API_KEY is set and the completion API is reachable."
            }
            AnalysisError::MalformedCompletion { .. } => {
                "The analysis service returned an unexpected format. Please try again."
            }
        }
    }
}

fn excerpt(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
