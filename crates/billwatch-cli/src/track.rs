//! `billwatch track`: fetch, merge, persist, report.

use anyhow::{Context, Result};
use billwatch_core::{BillRecord, Config, MergeOutcome, merge};
use billwatch_store::BillStore;
use billwatch_sync::{FetchWindow, Fetcher, HttpClient};
use tracing::info;

use crate::{demo, display};

pub async fn run(cfg: &Config, demo_mode: bool) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let fetched = if demo_mode {
        info!("demo mode: using sample bills");
        demo::sample_bills(today)
    } else {
        let window = FetchWindow::from_config(cfg, today);
        info!(
            since = %window.since,
            keywords = window.keywords.len(),
            "fetching bills"
        );
        let http = HttpClient::from_config(cfg).context("building HTTP client")?;
        Fetcher::from_config(cfg, http).fetch(&window).await
    };

    let store = BillStore::new(&cfg.paths.bills_file);
    let outcome = merge_into_store(&store, fetched)?;
    display::print_track_summary(&outcome);
    Ok(())
}

/// Merge `fetched` into the store file and save the result.
pub fn merge_into_store(store: &BillStore, fetched: Vec<BillRecord>) -> Result<MergeOutcome> {
    let stored = store
        .load_bills_or_empty()
        .with_context(|| format!("reading {}", store.path().display()))?;
    let fetched_len = fetched.len();

    let outcome = merge(fetched, &stored);
    store
        .save(&outcome.merged)
        .with_context(|| format!("writing {}", store.path().display()))?;

    info!(
        fetched = fetched_len,
        new = outcome.new.len(),
        changed = outcome.changed.len(),
        total = outcome.merged.len(),
        path = %store.path().display(),
        "store updated"
    );
    Ok(outcome)
}
