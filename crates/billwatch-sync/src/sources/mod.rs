//! Provider adapters and the fallback chain that tries them in order.

mod dataset;
mod legiscan;
mod leginfo;
mod openstates;

pub use dataset::DatasetSource;
pub use legiscan::LegiScanSource;
pub use leginfo::{LeginfoSource, parse_search_results};
pub use openstates::OpenStatesSource;

use std::collections::HashSet;

use async_trait::async_trait;
use billwatch_core::{BillRecord, Config};
use tracing::{info, warn};

use crate::{FetchWindow, HttpClient, SourceError};

/// One upstream bill provider.
#[async_trait]
pub trait BillSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the source has what it needs to run: a credential, an archive
    /// on disk, or an explicit opt-in.
    fn available(&self) -> bool;

    /// Bills in `window`, deduplicated by identifier.
    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<BillRecord>, SourceError>;
}

/// Keep the first record per identifier, dropping records without one.
pub(crate) fn dedup_by_number(bills: Vec<BillRecord>) -> Vec<BillRecord> {
    let mut seen = HashSet::new();
    bills
        .into_iter()
        .filter(|b| !b.bill_number.is_empty() && seen.insert(b.bill_number.clone()))
        .collect()
}

/// Priority-ordered fallback chain over [`BillSource`]s.
///
/// The first available source that returns `Ok` wins, even with zero bills.
/// Errors fall through to the next source.
pub struct Fetcher {
    sources: Vec<Box<dyn BillSource>>,
}

impl Fetcher {
    pub fn new(sources: Vec<Box<dyn BillSource>>) -> Self {
        Self { sources }
    }

    /// LegiScan API → OpenStates → LegiScan dataset archive → leginfo scraper.
    pub fn from_config(cfg: &Config, http: HttpClient) -> Self {
        let sources: Vec<Box<dyn BillSource>> = vec![
            Box::new(LegiScanSource::new(
                http.clone(),
                &cfg.data_source.legiscan_api_key,
            )),
            Box::new(OpenStatesSource::new(
                http.clone(),
                &cfg.data_source.openstates_api_key,
            )),
            Box::new(DatasetSource::from_config(cfg)),
            Box::new(LeginfoSource::new(
                http,
                &cfg.legislative.session,
                cfg.data_source.use_leginfo_fallback,
            )),
        ];
        Self::new(sources)
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn fetch(&self, window: &FetchWindow) -> Vec<BillRecord> {
        for source in &self.sources {
            let name = source.name();
            if !source.available() {
                info!(source = name, "source not configured, skipping");
                continue;
            }

            info!(source = name, "fetching bills");
            match source.fetch(window).await {
                Ok(bills) => {
                    info!(source = name, count = bills.len(), "fetch complete");
                    return bills;
                }
                Err(e) => warn!(source = name, error = %e, "fetch failed, trying next source"),
            }
        }

        warn!("no data source produced bills; stored bills left unchanged");
        Vec::new()
    }
}
