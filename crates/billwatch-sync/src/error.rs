use std::path::PathBuf;

use billwatch_core::Retryable;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{op} returned status {status}: {message}")]
    Api {
        op: String,
        status: String,
        message: String,
    },
    #[error("no sessions found for {0}")]
    NoSession(String),
    #[error("dataset archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("HTML parse error: {0}")]
    Html(String),
}

impl Retryable for SourceError {
    /// Connection problems, timeouts, rate limiting, and server-side failures.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::Server { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_status_classification() {
        let err = |status| SourceError::Server {
            status,
            body: String::new(),
        };
        assert!(err(429).is_retryable());
        assert!(err(502).is_retryable());
        assert!(err(503).is_retryable());
        assert!(!err(404).is_retryable());
        assert!(!err(401).is_retryable());
    }

    #[test]
    fn api_status_is_not_retried() {
        let err = SourceError::Api {
            op: "getBill".into(),
            status: "ERROR".into(),
            message: "Unknown bill id".into(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "getBill returned status ERROR: Unknown bill id");
    }
}
