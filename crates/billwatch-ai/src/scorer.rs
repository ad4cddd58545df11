//! Two-pass bill scoring.
//!
//! Pass one scores from the title, summary, and recent actions. When the
//! model asks for full text and the bill has a `text_url`, the page is fetched
//! and pass two re-scores with a digest of it; pass two replaces pass one.

use std::time::Duration;

use async_trait::async_trait;
use billwatch_core::{Analysis, BillRecord, Config, RetryPolicy, Severity};
use billwatch_sync::BillTextFetcher;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::ScoringError;
use crate::claude::{ChatRequest, ClaudeClient, Message};
use crate::prompt::{SCORE_TOOL_NAME, SYSTEM_PROMPT, build_prompt, score_tool};

pub const MAX_TOKENS: u32 = 512;

/// Input of the `score_bill` tool call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScoreResponse {
    pub pro_housing_production: Severity,
    pub densification: Severity,
    pub reduce_discretion: Severity,
    pub cost_to_cities: Severity,
    pub notes: String,
    pub comms_brief: String,
    pub fetch_full_text: bool,
}

impl ScoreResponse {
    fn into_analysis(self, bill: &BillRecord, model: &str, full_text_fetched: bool) -> Analysis {
        let mut analysis = Analysis {
            pro_housing_production: self.pro_housing_production,
            densification: self.densification,
            reduce_discretion: self.reduce_discretion,
            cost_to_cities: self.cost_to_cities,
            notes: self.notes.trim().to_string(),
            comms_brief: self.comms_brief.trim().to_string(),
            full_text_fetched,
            analyzed_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            status_at_analysis: bill.status.clone(),
            model: model.to_string(),
        };
        analysis.enforce_brief_threshold();
        analysis
    }
}

/// Anything that turns a prompt into a [`ScoreResponse`].
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    fn model(&self) -> &str;

    async fn score(&self, prompt: &str) -> Result<ScoreResponse, ScoringError>;
}

/// Source of full bill text for the second pass.
#[async_trait]
pub trait TextSource: Send + Sync {
    /// `None` when the page could not be fetched or held no bill text.
    async fn fetch_text(&self, url: &str) -> Option<String>;
}

#[async_trait]
impl TextSource for BillTextFetcher {
    async fn fetch_text(&self, url: &str) -> Option<String> {
        match BillTextFetcher::fetch_text(self, url).await {
            Ok(text) => text,
            Err(e) => {
                warn!(url, error = %e, "full text fetch failed");
                None
            }
        }
    }
}

// ── Claude backend ──

/// [`ScoringBackend`] over the Messages API with a forced `score_bill` call.
pub struct ClaudeScorer {
    client: ClaudeClient,
    model: String,
    retry: RetryPolicy,
}

impl ClaudeScorer {
    pub fn new(client: ClaudeClient, model: &str, retry: RetryPolicy) -> Self {
        Self {
            client,
            model: model.to_string(),
            retry,
        }
    }

    pub fn from_config(cfg: &Config, api_key: &str) -> Result<Self, ScoringError> {
        let client = ClaudeClient::new(api_key, cfg.http_timeout().max(Duration::from_secs(60)))?;
        Ok(Self::new(client, &cfg.analysis.model, cfg.scoring_retry()))
    }

    async fn score_once(&self, request: &ChatRequest) -> Result<ScoreResponse, ScoringError> {
        let response = self.client.chat(request).await?;
        let input = response
            .tool_input(SCORE_TOOL_NAME)
            .ok_or_else(|| ScoringError::MissingToolUse(SCORE_TOOL_NAME.into()))?;
        Ok(serde_json::from_value(input.clone())?)
    }
}

#[async_trait]
impl ScoringBackend for ClaudeScorer {
    fn model(&self) -> &str {
        &self.model
    }

    async fn score(&self, prompt: &str) -> Result<ScoreResponse, ScoringError> {
        let request = ChatRequest::new(&self.model, MAX_TOKENS)
            .system(SYSTEM_PROMPT)
            .message(Message::user(prompt))
            .forced_tool(score_tool());
        self.retry
            .run("claude", || self.score_once(&request))
            .await
    }
}

// ── Analyzer ──

pub struct BillAnalyzer<B, T> {
    backend: B,
    text: T,
    text_fetch_delay: Duration,
}

impl<B: ScoringBackend, T: TextSource> BillAnalyzer<B, T> {
    pub fn new(backend: B, text: T) -> Self {
        Self {
            backend,
            text,
            text_fetch_delay: Duration::from_secs(2),
        }
    }

    /// Pause before fetching full text.
    pub fn with_text_fetch_delay(mut self, delay: Duration) -> Self {
        self.text_fetch_delay = delay;
        self
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    /// Score `bill`, fetching its full text when the first pass asks for it.
    pub async fn analyze(&self, bill: &BillRecord) -> Result<Analysis, ScoringError> {
        let first = self.backend.score(&build_prompt(bill, None)).await?;
        debug!(
            bill = %bill.bill_number,
            fetch_full_text = first.fetch_full_text,
            "first pass scored"
        );

        if !first.fetch_full_text || bill.text_url.is_empty() {
            return Ok(first.into_analysis(bill, self.model(), false));
        }

        info!(bill = %bill.bill_number, url = %bill.text_url, "fetching full text");
        tokio::time::sleep(self.text_fetch_delay).await;
        let Some(text) = self.text.fetch_text(&bill.text_url).await else {
            info!(bill = %bill.bill_number, "no full text obtained, keeping first pass");
            return Ok(first.into_analysis(bill, self.model(), false));
        };

        let second = self.backend.score(&build_prompt(bill, Some(&text))).await?;
        Ok(second.into_analysis(bill, self.model(), true))
    }
}
