//! LegiScan weekly dataset archive (`CA_<session>_<hash>.zip`).
//!
//! Each archive holds one `<session>/bill/<number>.json` per bill, wrapped as
//! `{"bill": {...}}` in the same shape as the `getBill` API response.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use billwatch_core::{BillRecord, Config};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{BillSource, dedup_by_number};
use crate::normalize::{LegiScanBill, normalize_legiscan};
use crate::{FetchWindow, SourceError};

#[derive(Deserialize)]
struct Wrapper {
    bill: Option<LegiScanBill>,
}

pub struct DatasetSource {
    /// Explicitly configured archive.
    explicit: Option<PathBuf>,
    /// Directory scanned for the newest `CA_*.zip`.
    dir: PathBuf,
    session: String,
}

impl DatasetSource {
    pub fn new(explicit: Option<PathBuf>, dir: PathBuf, session: &str) -> Self {
        Self {
            explicit,
            dir,
            session: session.to_string(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let explicit = cfg.data_source.legiscan_dataset_zip.trim();
        Self::new(
            (!explicit.is_empty()).then(|| PathBuf::from(explicit)),
            cfg.data_source.dataset_dir.clone(),
            &cfg.legislative.session,
        )
    }

    /// The configured archive if it exists, else the most recently modified
    /// `CA_*.zip` in the dataset directory.
    pub fn find_archive(&self) -> Option<PathBuf> {
        if let Some(path) = &self.explicit {
            if path.is_file() {
                return Some(path.clone());
            }
            warn!(path = %path.display(), "configured dataset archive not found");
        }

        std::fs::read_dir(&self.dir)
            .ok()?
            .filter_map(Result::ok)
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.starts_with("CA_") && name.ends_with(".zip")
            })
            .filter_map(|entry| {
                let modified = entry.metadata().ok()?.modified().ok()?;
                Some((modified, entry.path()))
            })
            .max_by_key(|(modified, _)| *modified)
            .map(|(_, path)| path)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SourceError + '_ {
    move |source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Read every bill entry in `archive` that passes the window filters.
fn read_archive(
    archive: &Path,
    session: &str,
    window: &FetchWindow,
) -> Result<Vec<BillRecord>, SourceError> {
    let file = File::open(archive).map_err(io_error(archive))?;
    let mut zip = zip::ZipArchive::new(file)?;

    let mut processed = 0usize;
    let mut bills = Vec::new();
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_string();
        if !name.contains("/bill/") || !name.ends_with(".json") {
            continue;
        }

        let mut text = String::new();
        if let Err(e) = entry.read_to_string(&mut text) {
            debug!(entry = %name, error = %e, "skipping unreadable archive entry");
            continue;
        }
        let raw = match serde_json::from_str::<Wrapper>(&text) {
            Ok(Wrapper { bill: Some(raw) }) => raw,
            Ok(_) => continue,
            Err(e) => {
                debug!(entry = %name, error = %e, "skipping unreadable archive entry");
                continue;
            }
        };
        processed += 1;

        let date = if raw.status_date.is_empty() {
            &raw.last_action_date
        } else {
            &raw.status_date
        };
        if !window.matches_date(date) {
            continue;
        }
        if !window.matches_keywords(&[
            raw.title.as_str(),
            raw.last_action.as_str(),
            raw.description.as_str(),
        ]) {
            continue;
        }

        let bill = normalize_legiscan(&raw, session, window.today);
        if !bill.bill_number.is_empty() {
            bills.push(bill);
        }
    }

    debug!(processed, matched = bills.len(), "dataset archive filtered");
    Ok(bills)
}

#[async_trait]
impl BillSource for DatasetSource {
    fn name(&self) -> &'static str {
        "legiscan-dataset"
    }

    fn available(&self) -> bool {
        self.find_archive().is_some()
    }

    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<BillRecord>, SourceError> {
        let archive = self.find_archive().ok_or_else(|| SourceError::Io {
            path: self.dir.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no CA_*.zip archive"),
        })?;
        debug!(archive = %archive.display(), "reading dataset archive");

        let session = self.session.clone();
        let window = window.clone();
        let bills = tokio::task::spawn_blocking(move || read_archive(&archive, &session, &window))
            .await
            .map_err(|e| SourceError::Io {
                path: self.dir.clone(),
                source: std::io::Error::other(e),
            })??;

        Ok(dedup_by_number(bills))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    fn window() -> FetchWindow {
        FetchWindow::new(
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            &["housing".to_string()],
        )
    }

    fn write_archive(path: &Path, entries: &[(&str, String)]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, body) in entries {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn bill_json(number: &str, title: &str, status_date: &str) -> String {
        json!({"bill": {
            "bill_id": 7,
            "bill_number": number,
            "title": title,
            "status_date": status_date,
            "last_action": "Introduced"
        }})
        .to_string()
    }

    #[tokio::test]
    async fn reads_matching_bill_entries() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("CA_2025-2026_abc.zip");
        write_archive(
            &archive,
            &[
                ("CA/2025-2026/bill/AB1.json", bill_json("AB1", "Housing: ADUs", "2026-03-05")),
                ("CA/2025-2026/bill/AB2.json", bill_json("AB2", "Housing: old", "2025-12-01")),
                ("CA/2025-2026/bill/SB3.json", bill_json("SB3", "Fisheries", "2026-03-05")),
                ("CA/2025-2026/bill/BAD.json", "{not json".to_string()),
                ("CA/2025-2026/people/P1.json", "{}".to_string()),
            ],
        );

        let source = DatasetSource::new(None, tmp.path().to_path_buf(), "2025-2026");
        assert!(source.available());
        let bills = source.fetch(&window()).await.unwrap();

        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].bill_number, "AB1");
        assert_eq!(bills[0].session, "2025-2026");
        assert_eq!(bills[0].source, "legiscan");
    }

    #[test]
    fn explicit_path_wins_and_missing_falls_back() {
        let tmp = TempDir::new().unwrap();
        let discovered = tmp.path().join("CA_2025-2026_x.zip");
        write_archive(&discovered, &[]);
        let explicit = tmp.path().join("manual.zip");
        write_archive(&explicit, &[]);

        let source = DatasetSource::new(Some(explicit.clone()), tmp.path().to_path_buf(), "");
        assert_eq!(source.find_archive(), Some(explicit));

        let source = DatasetSource::new(
            Some(tmp.path().join("missing.zip")),
            tmp.path().to_path_buf(),
            "",
        );
        assert_eq!(source.find_archive(), Some(discovered));
    }

    #[test]
    fn empty_directory_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "x").unwrap();
        let source = DatasetSource::new(None, tmp.path().to_path_buf(), "");
        assert!(!source.available());

        let source = DatasetSource::new(None, tmp.path().join("absent"), "");
        assert!(!source.available());
    }
}
