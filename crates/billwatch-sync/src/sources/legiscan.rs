//! LegiScan API v1.
//!
//! Quota-conscious query plan: one `getSessionList`, one `getMasterList`, then
//! `getBill` only for master-list entries that pass the local date and keyword
//! filters.

use std::time::Duration;

use async_trait::async_trait;
use billwatch_core::BillRecord;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{BillSource, dedup_by_number};
use crate::normalize::{LegiScanBill, id_string, normalize_legiscan};
use crate::{FetchWindow, HttpClient, SourceError};

pub const LEGISCAN_BASE_URL: &str = "https://api.legiscan.com/";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Session {
    session_id: i64,
    session_name: String,
    active: i64,
    year_start: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MasterListEntry {
    bill_id: Value,
    title: Option<String>,
    last_action: Option<String>,
    status_date: Option<String>,
    last_action_date: Option<String>,
}

pub struct LegiScanSource {
    http: HttpClient,
    api_key: String,
    base_url: String,
    delay: Duration,
}

impl LegiScanSource {
    pub fn new(http: HttpClient, api_key: &str) -> Self {
        Self {
            http,
            api_key: api_key.trim().to_string(),
            base_url: LEGISCAN_BASE_URL.into(),
            delay: Duration::from_millis(200),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Pause between `getBill` calls.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn call(&self, op: &str, params: &[(&str, String)]) -> Result<Value, SourceError> {
        let mut query = vec![("key", self.api_key.clone()), ("op", op.to_string())];
        query.extend(params.iter().cloned());

        let data: Value = self.http.get_json(&self.base_url, &query, &[]).await?;
        let status = data.get("status").and_then(Value::as_str).unwrap_or_default();
        if status != "OK" {
            return Err(SourceError::Api {
                op: op.to_string(),
                status: status.to_string(),
                message: data["alert"]["message"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
            });
        }
        Ok(data)
    }

    async fn current_session(&self) -> Result<Session, SourceError> {
        let data = self.call("getSessionList", &[("state", "CA".into())]).await?;
        let sessions: Vec<Session> = serde_json::from_value(data["sessions"].clone())?;
        pick_session(sessions).ok_or_else(|| SourceError::NoSession("CA".into()))
    }
}

/// The active session, else the one starting latest.
fn pick_session(sessions: Vec<Session>) -> Option<Session> {
    if let Some(pos) = sessions.iter().position(|s| s.active == 1) {
        return sessions.into_iter().nth(pos);
    }
    sessions.into_iter().max_by_key(|s| s.year_start)
}

/// Master-list bill ids passing the window filters.
fn candidate_ids(masterlist: &serde_json::Map<String, Value>, window: &FetchWindow) -> Vec<String> {
    masterlist
        .iter()
        .filter(|(key, value)| key.as_str() != "session" && value.is_object())
        .filter_map(|(_, value)| serde_json::from_value::<MasterListEntry>(value.clone()).ok())
        .filter(|entry| {
            let date = entry
                .status_date
                .as_deref()
                .filter(|d| !d.is_empty())
                .or(entry.last_action_date.as_deref())
                .unwrap_or_default();
            window.matches_date(date)
        })
        .filter(|entry| {
            window.matches_keywords(&[
                entry.title.as_deref().unwrap_or_default(),
                entry.last_action.as_deref().unwrap_or_default(),
            ])
        })
        .map(|entry| id_string(&entry.bill_id))
        .filter(|id| !id.is_empty() && id != "0")
        .collect()
}

#[async_trait]
impl BillSource for LegiScanSource {
    fn name(&self) -> &'static str {
        "legiscan"
    }

    fn available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<BillRecord>, SourceError> {
        let session = self.current_session().await?;
        debug!(session_id = session.session_id, session = %session.session_name, "using LegiScan session");

        let data = self
            .call("getMasterList", &[("id", session.session_id.to_string())])
            .await?;
        let masterlist = data["masterlist"].as_object().cloned().unwrap_or_default();
        let candidates = candidate_ids(&masterlist, window);
        debug!(
            listed = masterlist.len().saturating_sub(1),
            candidates = candidates.len(),
            "LegiScan master list filtered"
        );

        let mut bills = Vec::new();
        for id in candidates {
            match self.call("getBill", &[("id", id.clone())]).await {
                Ok(data) => {
                    match serde_json::from_value::<LegiScanBill>(data["bill"].clone()) {
                        Ok(raw) => {
                            let bill = normalize_legiscan(&raw, &session.session_name, window.today);
                            if !bill.bill_number.is_empty() {
                                bills.push(bill);
                            }
                        }
                        Err(e) => warn!(bill_id = %id, error = %e, "unreadable LegiScan bill"),
                    }
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => warn!(bill_id = %id, error = %e, "LegiScan getBill failed"),
            }
        }

        Ok(dedup_by_number(bills))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billwatch_core::RetryPolicy;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn window() -> FetchWindow {
        FetchWindow::new(
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            &["housing".to_string()],
        )
    }

    fn http() -> HttpClient {
        HttpClient::new(Duration::from_secs(5), RetryPolicy::doubling(0, Duration::ZERO)).unwrap()
    }

    async fn mount_op(server: &MockServer, op: &str, extra: Option<(&str, &str)>, body: Value) {
        let mut mock = Mock::given(method("GET")).and(query_param("op", op));
        if let Some((k, v)) = extra {
            mock = mock.and(query_param(k, v));
        }
        mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn session_pick_prefers_active_then_latest() {
        let s = |id, active, year_start| Session {
            session_id: id,
            active,
            year_start,
            ..Default::default()
        };
        assert_eq!(pick_session(vec![s(1, 0, 2025), s(2, 1, 2023)]).unwrap().session_id, 2);
        assert_eq!(pick_session(vec![s(1, 0, 2023), s(2, 0, 2025)]).unwrap().session_id, 2);
        assert!(pick_session(vec![]).is_none());
    }

    #[test]
    fn masterlist_filtering() {
        let list = json!({
            "session": {"session_id": 2172},
            "0": {"bill_id": 11, "title": "Housing: ADUs", "status_date": "2026-03-05"},
            "1": {"bill_id": 12, "title": "Housing: old", "status_date": "2026-01-05"},
            "2": {"bill_id": 13, "title": "Fisheries", "last_action": "In HOUSING committee", "last_action_date": "2026-03-06"},
            "3": {"bill_id": 14, "title": "Insurance", "status_date": "2026-03-06"},
            "4": {"bill_id": 15, "title": "Housing element", "status_date": "not-a-date"}
        });
        let mut ids = candidate_ids(list.as_object().unwrap(), &window());
        ids.sort();
        assert_eq!(ids, vec!["11", "13", "15"]);
    }

    #[tokio::test]
    async fn fetches_filtered_bills() {
        let server = MockServer::start().await;
        mount_op(
            &server,
            "getSessionList",
            None,
            json!({"status": "OK", "sessions": [
                {"session_id": 2172, "session_name": "2025-2026 Regular Session", "active": 1, "year_start": 2025}
            ]}),
        )
        .await;
        mount_op(
            &server,
            "getMasterList",
            Some(("id", "2172")),
            json!({"status": "OK", "masterlist": {
                "session": {"session_id": 2172},
                "0": {"bill_id": 11, "title": "Housing: ADUs", "status_date": "2026-03-05"},
                "1": {"bill_id": 14, "title": "Insurance", "status_date": "2026-03-06"}
            }}),
        )
        .await;
        mount_op(
            &server,
            "getBill",
            Some(("id", "11")),
            json!({"status": "OK", "bill": {
                "bill_id": 11,
                "bill_number": "AB 11",
                "title": "Housing: ADUs",
                "last_action": "Introduced",
                "status_date": "2026-03-05"
            }}),
        )
        .await;

        let source = LegiScanSource::new(http(), "key")
            .with_base_url(&server.uri())
            .with_delay(Duration::ZERO);
        let bills = source.fetch(&window()).await.unwrap();

        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].bill_number, "AB11");
        assert_eq!(bills[0].session, "2025-2026 Regular Session");
        assert_eq!(bills[0].source_id, "11");
    }

    #[tokio::test]
    async fn non_ok_status_is_an_error() {
        let server = MockServer::start().await;
        mount_op(
            &server,
            "getSessionList",
            None,
            json!({"status": "ERROR", "alert": {"message": "Invalid API key"}}),
        )
        .await;

        let source = LegiScanSource::new(http(), "bad").with_base_url(&server.uri());
        let err = source.fetch(&window()).await.unwrap_err();
        assert!(matches!(err, SourceError::Api { .. }));
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[test]
    fn blank_key_is_unavailable() {
        assert!(!LegiScanSource::new(http(), "  ").available());
        assert!(LegiScanSource::new(http(), "abc").available());
    }
}
