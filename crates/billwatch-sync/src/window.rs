//! Lookback window and keyword filter applied locally by every adapter.

use billwatch_core::Config;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchWindow {
    /// Earliest status date still of interest.
    pub since: NaiveDate,
    /// Reference day for "upcoming" hearings.
    pub today: NaiveDate,
    /// Lowercased keywords.
    pub keywords: Vec<String>,
}

impl FetchWindow {
    pub fn new(since: NaiveDate, today: NaiveDate, keywords: &[String]) -> Self {
        Self {
            since,
            today,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn from_config(cfg: &Config, today: NaiveDate) -> Self {
        Self::new(cfg.since(today), today, &cfg.keywords())
    }

    /// A `YYYY-MM-DD` date inside the window. Blank or unparseable dates pass.
    pub fn matches_date(&self, date: &str) -> bool {
        let head = date.get(..10).unwrap_or(date);
        match NaiveDate::parse_from_str(head, "%Y-%m-%d") {
            Ok(d) => d >= self.since,
            Err(_) => true,
        }
    }

    /// Any keyword occurs, case-insensitively, in any of `fields`.
    pub fn matches_keywords(&self, fields: &[&str]) -> bool {
        let haystacks: Vec<String> = fields.iter().map(|f| f.to_lowercase()).collect();
        self.keywords
            .iter()
            .any(|kw| haystacks.iter().any(|h| h.contains(kw.as_str())))
    }
}
