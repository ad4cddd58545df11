//! Bill scoring against the four local-control risk criteria via the
//! Anthropic Messages API, with retry/backoff and an optional full-text pass.

pub mod claude;
mod error;
pub mod prompt;
mod scorer;

pub use claude::ClaudeClient;
pub use error::ScoringError;
pub use scorer::{BillAnalyzer, ClaudeScorer, ScoreResponse, ScoringBackend, TextSource};
