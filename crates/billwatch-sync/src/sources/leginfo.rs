//! leginfo.legislature.ca.gov search scraper. Last resort, opt-in only.
//!
//! The search form ignores most GET parameters and tends to return every bill
//! in the session, so results are keyword-filtered locally. Rows carry no
//! status date, which is why this source stays disabled unless configured.

use std::time::Duration;

use async_trait::async_trait;
use billwatch_core::bill::timestamp_now;
use billwatch_core::{BillRecord, normalize_bill_number};
use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};

use super::{BillSource, dedup_by_number};
use crate::html::{element_text, selector};
use crate::{FetchWindow, HttpClient, SourceError};

pub const LEGINFO_ORIGIN: &str = "https://leginfo.legislature.ca.gov";
const SEARCH_PATH: &str = "/faces/billSearchClient.xhtml";
/// Keywords searched per run.
const MAX_KEYWORDS: usize = 8;

pub struct LeginfoSource {
    http: HttpClient,
    enabled: bool,
    /// `"20252026"` form of the session label.
    session_year: String,
    origin: String,
    delay: Duration,
}

impl LeginfoSource {
    pub fn new(http: HttpClient, session: &str, enabled: bool) -> Self {
        Self {
            http,
            enabled,
            session_year: session.replace('-', ""),
            origin: LEGINFO_ORIGIN.into(),
            delay: Duration::from_secs(1),
        }
    }

    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = origin.trim_end_matches('/').to_string();
        self
    }

    /// Pause between keyword searches.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn search(&self, keyword: &str) -> Result<Vec<BillRecord>, SourceError> {
        let url = format!("{}{}", self.origin, SEARCH_PATH);
        let query = [
            ("keywords", keyword.to_string()),
            ("session_year", self.session_year.clone()),
        ];
        let html = self.http.get_text(&url, &query, &[]).await?;
        parse_search_results(&html, &self.session_year, &self.origin)
    }
}

fn query_value<'a>(href: &'a str, key: &str) -> Option<&'a str> {
    let (_, query) = href.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Parse bill rows from a search results page.
///
/// Each result is an anchor whose `href` contains `bill_id=`; the enclosing
/// table row supplies author, title, and status in cells 1–3.
pub fn parse_search_results(
    html: &str,
    session_year: &str,
    origin: &str,
) -> Result<Vec<BillRecord>, SourceError> {
    let doc = Html::parse_document(html);
    let links = selector("a[href*='bill_id=']")?;
    let cells = selector("td")?;

    let session = match (session_year.get(..4), session_year.get(4..)) {
        (Some(start), Some(end)) if !end.is_empty() => format!("{start}-{end}"),
        _ => session_year.to_string(),
    };
    let now = timestamp_now();

    let mut bills = Vec::new();
    for link in doc.select(&links) {
        let number = normalize_bill_number(&element_text(link, ""));
        if number.is_empty() {
            continue;
        }

        let href = link.value().attr("href").unwrap_or_default();
        let text_url = if href.starts_with('/') {
            format!("{origin}{href}")
        } else {
            href.to_string()
        };

        let row = link
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "tr");
        let columns: Vec<String> = row
            .map(|row| row.select(&cells).map(|td| element_text(td, "")).collect())
            .unwrap_or_default();
        let column = |i: usize| columns.get(i).cloned().unwrap_or_default();

        bills.push(BillRecord {
            source_id: query_value(href, "bill_id").unwrap_or(&number).to_string(),
            bill_number: number,
            session: session.clone(),
            author: column(1),
            title: column(2),
            status: column(3),
            last_updated: now.clone(),
            text_url,
            source: "leginfo".into(),
            ..Default::default()
        });
    }
    Ok(bills)
}

#[async_trait]
impl BillSource for LeginfoSource {
    fn name(&self) -> &'static str {
        "leginfo"
    }

    fn available(&self) -> bool {
        self.enabled
    }

    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<BillRecord>, SourceError> {
        let mut raw = Vec::new();
        let mut any_ok = false;
        let mut last_err = None;

        for keyword in window.keywords.iter().take(MAX_KEYWORDS) {
            match self.search(keyword).await {
                Ok(found) => {
                    debug!(keyword = %keyword, count = found.len(), "leginfo search");
                    any_ok = true;
                    raw.extend(found);
                }
                Err(e) => {
                    warn!(keyword = %keyword, error = %e, "leginfo search failed");
                    last_err = Some(e);
                }
            }
            tokio::time::sleep(self.delay).await;
        }

        if !any_ok && let Some(e) = last_err {
            return Err(e);
        }

        let raw = dedup_by_number(raw);
        let total = raw.len();
        let bills: Vec<BillRecord> = raw
            .into_iter()
            .filter(|b| window.matches_date(&b.status_date))
            .filter(|b| window.matches_keywords(&[format!("{} {}", b.title, b.status).as_str()]))
            .collect();
        info!(raw = total, kept = bills.len(), "leginfo results keyword-filtered");
        Ok(bills)
    }
}
