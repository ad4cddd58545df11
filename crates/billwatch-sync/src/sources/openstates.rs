//! OpenStates API v3: one paginated `/bills` search per keyword.

use std::time::Duration;

use async_trait::async_trait;
use billwatch_core::BillRecord;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{BillSource, dedup_by_number};
use crate::normalize::{OpenStatesBill, normalize_openstates};
use crate::{FetchWindow, HttpClient, SourceError};

pub const OPENSTATES_BASE_URL: &str = "https://v3.openstates.org";
const PER_PAGE: u32 = 20;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Page {
    results: Vec<Value>,
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Pagination {
    max_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { max_page: 1 }
    }
}

pub struct OpenStatesSource {
    http: HttpClient,
    api_key: String,
    base_url: String,
    delay: Duration,
}

impl OpenStatesSource {
    pub fn new(http: HttpClient, api_key: &str) -> Self {
        Self {
            http,
            api_key: api_key.trim().to_string(),
            base_url: OPENSTATES_BASE_URL.into(),
            delay: Duration::from_millis(300),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Pause between pages.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn page(&self, keyword: &str, since: &str, page: u32) -> Result<Page, SourceError> {
        let mut query = vec![
            ("jurisdiction", "ca".to_string()),
            ("updated_since", since.to_string()),
            ("q", keyword.to_string()),
            ("per_page", PER_PAGE.to_string()),
            ("page", page.to_string()),
        ];
        for include in ["abstracts", "actions", "sponsorships", "sources"] {
            query.push(("include", include.to_string()));
        }
        let url = format!("{}/bills", self.base_url);
        self.http
            .get_json(&url, &query, &[("X-API-KEY", self.api_key.as_str())])
            .await
    }
}

#[async_trait]
impl BillSource for OpenStatesSource {
    fn name(&self) -> &'static str {
        "openstates"
    }

    fn available(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// A failed page ends that keyword's pagination. The fetch as a whole only
    /// fails when no page succeeded for any keyword.
    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<BillRecord>, SourceError> {
        let since = window.since.format("%Y-%m-%dT00:00:00Z").to_string();
        let mut bills = Vec::new();
        let mut any_page_ok = false;
        let mut last_err = None;

        for keyword in &window.keywords {
            debug!(keyword = %keyword, since = %since, "OpenStates query");
            let mut page = 1;
            loop {
                let data = match self.page(keyword, &since, page).await {
                    Ok(data) => data,
                    Err(e) => {
                        warn!(keyword = %keyword, page, error = %e, "OpenStates page failed");
                        last_err = Some(e);
                        break;
                    }
                };
                any_page_ok = true;

                for raw in data.results {
                    match serde_json::from_value::<OpenStatesBill>(raw) {
                        Ok(raw) => bills.push(normalize_openstates(&raw)),
                        Err(e) => debug!(error = %e, "skipping unreadable OpenStates result"),
                    }
                }

                if page >= data.pagination.max_page {
                    break;
                }
                page += 1;
                tokio::time::sleep(self.delay).await;
            }
        }

        if !any_page_ok && let Some(e) = last_err {
            return Err(e);
        }

        let bills: Vec<BillRecord> = dedup_by_number(bills)
            .into_iter()
            .filter(|b| window.matches_date(&b.last_updated))
            .filter(|b| {
                let subjects = b.subjects.join(" ");
                window.matches_keywords(&[
                    b.title.as_str(),
                    b.status.as_str(),
                    b.summary.as_str(),
                    subjects.as_str(),
                ])
            })
            .collect();
        debug!(count = bills.len(), "OpenStates unique bills after filtering");
        Ok(bills)
    }
}
