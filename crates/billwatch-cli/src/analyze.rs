//! `billwatch analyze`: screen stored bills and score the selection.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use billwatch_ai::{BillAnalyzer, ClaudeScorer, ScoringBackend, TextSource};
use billwatch_core::{BillMap, Config, ScreeningMode, bills_needing_analysis};
use billwatch_store::BillStore;
use billwatch_sync::{BillTextFetcher, HttpClient};
use tracing::{error, info};

use crate::display;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzeReport {
    pub selected: usize,
    pub scored: usize,
    pub failed: usize,
    pub total: usize,
}

pub async fn run(
    cfg: &Config,
    mode: ScreeningMode,
    summary_only: bool,
    api_key: Option<&str>,
) -> Result<()> {
    let store = BillStore::new(&cfg.paths.bills_file);

    if summary_only {
        let bills = load_required(&store)?;
        display::print_analysis_summary(&bills);
        return Ok(());
    }

    let Some(api_key) = api_key else {
        bail!("ANTHROPIC_API_KEY is not set; export it or pass --anthropic-api-key");
    };

    let scorer = ClaudeScorer::from_config(cfg, api_key).context("building Claude client")?;
    let http = HttpClient::from_config(cfg).context("building HTTP client")?;
    let analyzer = BillAnalyzer::new(scorer, BillTextFetcher::new(http))
        .with_text_fetch_delay(cfg.text_fetch_delay());

    let report = analyze_store(&store, &analyzer, &mode, cfg.rate_limit_delay()).await?;
    display::print_analyze_report(&report);
    display::print_analysis_summary(&load_required(&store)?);
    Ok(())
}

/// Stored bills, failing when the store has not been built yet.
pub fn load_required(store: &BillStore) -> Result<BillMap> {
    if !store.exists() {
        bail!(
            "no bill store at {}; run `billwatch track` first",
            store.path().display()
        );
    }
    let doc = store
        .load()
        .with_context(|| format!("reading {}", store.path().display()))?;
    if doc.bills.is_empty() {
        bail!(
            "bill store {} is empty; run `billwatch track` first",
            store.path().display()
        );
    }
    Ok(doc.bills)
}

/// Score every screened bill, saving the store after each success.
///
/// A failed bill is logged and skipped; its stored record is left as it was.
pub async fn analyze_store<B, T>(
    store: &BillStore,
    analyzer: &BillAnalyzer<B, T>,
    mode: &ScreeningMode,
    rate_limit_delay: Duration,
) -> Result<AnalyzeReport>
where
    B: ScoringBackend,
    T: TextSource,
{
    let mut bills = load_required(store)?;
    let selected = bills_needing_analysis(&bills, mode);
    let mut report = AnalyzeReport {
        selected: selected.len(),
        total: bills.len(),
        ..Default::default()
    };

    if selected.is_empty() {
        info!(total = report.total, "no bills need analysis");
        return Ok(report);
    }
    info!(
        selected = report.selected,
        total = report.total,
        model = analyzer.model(),
        "analyzing bills"
    );

    for (i, id) in selected.iter().enumerate() {
        let Some(bill) = bills.get(id) else { continue };
        info!(
            "[{}/{}] Analyzing {}: {}",
            i + 1,
            report.selected,
            id,
            bill.title
        );

        match analyzer.analyze(bill).await {
            Ok(analysis) => {
                info!(
                    bill = %id,
                    risk_count = analysis.risk_count(),
                    full_text = analysis.full_text_fetched,
                    "scored"
                );
                if let Some(bill) = bills.get_mut(id) {
                    bill.analysis = Some(analysis);
                }
                store
                    .save(&bills)
                    .with_context(|| format!("writing {}", store.path().display()))?;
                report.scored += 1;
            }
            Err(e) => {
                error!(bill = %id, error = %e, "analysis failed");
                report.failed += 1;
            }
        }

        if i + 1 < selected.len() {
            tokio::time::sleep(rate_limit_delay).await;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use billwatch_ai::{ScoreResponse, ScoringError};
    use billwatch_core::{Analysis, BillRecord, Severity};
    use tempfile::TempDir;

    /// Scores every bill "strong" on A except those whose title says "fail".
    struct Fake;

    #[async_trait]
    impl ScoringBackend for Fake {
        fn model(&self) -> &str {
            "fake"
        }

        async fn score(&self, prompt: &str) -> Result<ScoreResponse, ScoringError> {
            if prompt.contains("Title       : fail") {
                return Err(ScoringError::Api {
                    status: 400,
                    body: "bad".into(),
                });
            }
            Ok(ScoreResponse {
                pro_housing_production: Severity::Strong,
                notes: "scored".into(),
                ..Default::default()
            })
        }
    }

    struct NoText;

    #[async_trait]
    impl TextSource for NoText {
        async fn fetch_text(&self, _url: &str) -> Option<String> {
            None
        }
    }

    fn bill(id: &str, title: &str, status: &str) -> BillRecord {
        BillRecord {
            bill_number: id.into(),
            title: title.into(),
            status: status.into(),
            ..Default::default()
        }
    }

    fn seeded_store(tmp: &TempDir, bills: Vec<BillRecord>) -> BillStore {
        let store = BillStore::new(tmp.path().join("tracked.json"));
        let map: BillMap = bills
            .into_iter()
            .map(|b| (b.bill_number.clone(), b))
            .collect();
        store.save(&map).unwrap();
        store
    }

    fn analyzer() -> BillAnalyzer<Fake, NoText> {
        BillAnalyzer::new(Fake, NoText).with_text_fetch_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn failure_does_not_stop_the_run() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(
            &tmp,
            vec![
                bill("AB1", "Housing", "Introduced"),
                bill("AB2", "fail", "Introduced"),
                bill("AB3", "Zoning", "Introduced"),
            ],
        );

        let report = analyze_store(&store, &analyzer(), &ScreeningMode::Incremental, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(
            report,
            AnalyzeReport {
                selected: 3,
                scored: 2,
                failed: 1,
                total: 3
            }
        );

        let saved = store.load().unwrap().bills;
        assert!(saved["AB1"].analysis.is_some());
        assert!(saved["AB2"].analysis.is_none());
        let analysis = saved["AB3"].analysis.as_ref().unwrap();
        assert_eq!(analysis.status_at_analysis, "Introduced");
        assert_eq!(analysis.model, "fake");
    }

    #[tokio::test]
    async fn up_to_date_bills_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let mut scored = bill("AB1", "Housing", "Chaptered");
        scored.analysis = Some(Analysis {
            status_at_analysis: "Chaptered".into(),
            notes: "old".into(),
            ..Default::default()
        });
        let mut stale = bill("AB2", "Housing", "Passed Senate");
        stale.analysis = Some(Analysis {
            status_at_analysis: "In committee".into(),
            ..Default::default()
        });
        let store = seeded_store(&tmp, vec![scored, stale]);

        let report = analyze_store(&store, &analyzer(), &ScreeningMode::Incremental, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report.selected, 1);
        assert_eq!(report.scored, 1);

        let saved = store.load().unwrap().bills;
        assert_eq!(saved["AB1"].analysis.as_ref().unwrap().notes, "old");
        assert_eq!(
            saved["AB2"].analysis.as_ref().unwrap().status_at_analysis,
            "Passed Senate"
        );
    }

    #[tokio::test]
    async fn single_bill_by_loose_identifier() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(
            &tmp,
            vec![bill("AB1", "Housing", "x"), bill("SB2", "Zoning", "y")],
        );

        let mode = ScreeningMode::Single("sb 2".into());
        let report = analyze_store(&store, &analyzer(), &mode, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report.selected, 1);
        let saved = store.load().unwrap().bills;
        assert!(saved["SB2"].analysis.is_some());
        assert!(saved["AB1"].analysis.is_none());
    }

    #[tokio::test]
    async fn missing_store_names_track_command() {
        let tmp = TempDir::new().unwrap();
        let store = BillStore::new(tmp.path().join("absent.json"));
        let err = analyze_store(&store, &analyzer(), &ScreeningMode::Force, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("billwatch track"));
    }

    #[tokio::test]
    async fn missing_api_key_is_fatal_unless_summary_only() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp, vec![bill("AB1", "Housing", "x")]);
        let mut cfg = Config::default();
        cfg.paths.bills_file = store.path().to_path_buf();

        let err = run(&cfg, ScreeningMode::Incremental, false, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));

        run(&cfg, ScreeningMode::Incremental, true, None).await.unwrap();
    }
}
