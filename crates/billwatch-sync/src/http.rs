//! Shared HTTP GET helper with retry on transient failures.

use std::time::Duration;

use billwatch_core::{Config, RetryPolicy};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::SourceError;

const USER_AGENT: &str = concat!(
    "billwatch/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/billwatch/billwatch)"
);

/// GET-only client used by every provider adapter.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, retry })
    }

    /// Timeout and retry settings from the `http` config section.
    pub fn from_config(cfg: &Config) -> Result<Self, SourceError> {
        Self::new(cfg.http_timeout(), cfg.http_retry())
    }

    /// GET `url` and return the body of a 2xx response.
    ///
    /// Connection errors, timeouts, 429 and 5xx responses are retried per the
    /// client's policy; anything else fails on the first attempt.
    pub async fn get_text(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<String, SourceError> {
        self.retry
            .run(url, || self.get_once(url, query, headers))
            .await
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let body = self.get_text(url, query, headers).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_once(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<String, SourceError> {
        let mut req = self.client.get(url).query(query);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        debug!(url, "GET");
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(max_retries: u32) -> HttpClient {
        HttpClient::new(
            Duration::from_secs(5),
            RetryPolicy::doubling(max_retries, Duration::ZERO),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn sends_query_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bills"))
            .and(query_param("q", "zoning"))
            .and(header("X-API-KEY", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"ok\": true}"))
            .expect(1)
            .mount(&server)
            .await;

        let value: serde_json::Value = client(0)
            .get_json(
                &format!("{}/bills", server.uri()),
                &[("q", "zoning".to_string())],
                &[("X-API-KEY", "secret")],
            )
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn retries_server_errors_up_to_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let err = client(2)
            .get_text(&server.uri(), &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Server { status: 503, .. }));
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(2)
            .get_text(&server.uri(), &[], &[])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "server returned 404: nope");
    }
}
