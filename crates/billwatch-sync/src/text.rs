//! Full bill text from a record's `text_url`.

use tracing::debug;

use crate::html::extract_bill_text;
use crate::{HttpClient, SourceError};

/// Downloads a bill page and extracts its text or digest.
#[derive(Debug, Clone)]
pub struct BillTextFetcher {
    http: HttpClient,
}

impl BillTextFetcher {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// `Ok(None)` when the page loads but holds no recognisable bill text.
    pub async fn fetch_text(&self, url: &str) -> Result<Option<String>, SourceError> {
        let html = self.http.get_text(url, &[], &[]).await?;
        let text = extract_bill_text(&html)?;
        debug!(url, chars = text.as_ref().map_or(0, |t| t.len()), "extracted bill text");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billwatch_core::RetryPolicy;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_and_extracts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/faces/billTextClient.xhtml"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<div id=\"bill_all\"><p>SECTION 1.</p><p>Housing.</p></div>"),
            )
            .mount(&server)
            .await;

        let http =
            HttpClient::new(Duration::from_secs(5), RetryPolicy::doubling(0, Duration::ZERO)).unwrap();
        let text = BillTextFetcher::new(http)
            .fetch_text(&format!("{}/faces/billTextClient.xhtml", server.uri()))
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("SECTION 1.\nHousing."));
    }
}
