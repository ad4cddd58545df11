use billwatch_core::Retryable;
use thiserror::Error;

/// Status codes worth another attempt: rate limiting, server errors, overload.
pub const RETRYABLE_STATUS: [u16; 4] = [429, 500, 503, 529];

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Claude API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("invalid API key header: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
    #[error("response contained no {0} tool_use block")]
    MissingToolUse(String),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Retryable for ScoringError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Api { status, .. } if RETRYABLE_STATUS.contains(status))
    }
}
