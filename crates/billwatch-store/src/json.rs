//! File-backed bill store.
//!
//! The whole mapping is rewritten on every save. Writes go to a temporary file
//! in the destination directory which is then renamed over the target, so a
//! crash mid-write leaves the previous document intact.

use std::io::Write;
use std::path::{Path, PathBuf};

use billwatch_core::bill::timestamp_now;
use billwatch_core::{BillMap, BillRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::StoreError;

pub const SCHEMA_VERSION: &str = "1.0";
const AGENT: &str = "legislative_tracker";
const DESCRIPTION: &str = "California housing-related bills tracked for local-control risk";

/// On-disk layout of the store file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreDocument {
    pub last_updated: Option<String>,
    pub agent: String,
    pub schema_version: String,
    pub description: String,
    pub total_bills: usize,
    pub bills: BillMap,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            last_updated: None,
            agent: AGENT.into(),
            schema_version: SCHEMA_VERSION.into(),
            description: DESCRIPTION.into(),
            total_bills: 0,
            bills: BillMap::new(),
        }
    }
}

impl StoreDocument {
    pub fn with_bills(bills: BillMap) -> Self {
        Self {
            total_bills: bills.len(),
            bills,
            ..Default::default()
        }
    }
}

/// Handle on the store file at a fixed path.
#[derive(Debug, Clone)]
pub struct BillStore {
    path: PathBuf,
}

impl BillStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the document.
    ///
    /// A missing file is [`StoreError::Missing`]. Bills are decoded one entry
    /// at a time: an entry whose analysis cannot be read keeps the bill and
    /// drops the analysis, and an entry that cannot be read at all is skipped.
    /// Either way a copy of the file is kept at [`BillStore::corrupt_path`]
    /// before anything is lost. A file that is not a JSON object is moved to
    /// that path and the store starts empty.
    pub fn load(&self) -> Result<StoreDocument, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::Missing(self.path.clone()));
        }
        let text = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        let mut raw = match serde_json::from_str::<Map<String, Value>>(&text) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "store file unreadable, moving aside and starting empty"
                );
                self.move_aside()?;
                return Ok(StoreDocument::default());
            }
        };

        let bill_entries = raw.remove("bills");
        let mut doc = match serde_json::from_value::<StoreDocument>(Value::Object(raw)) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "store header unreadable, using defaults");
                StoreDocument::default()
            }
        };

        let mut lossy = false;
        match bill_entries {
            Some(Value::Object(entries)) => {
                for (key, entry) in entries {
                    match decode_bill(&key, entry) {
                        Decoded::Intact(bill) => {
                            doc.bills.insert(key, bill);
                        }
                        Decoded::WithoutAnalysis(bill) => {
                            lossy = true;
                            doc.bills.insert(key, bill);
                        }
                        Decoded::Unreadable => lossy = true,
                    }
                }
            }
            None | Some(Value::Null) => {}
            Some(other) => {
                warn!(path = %self.path.display(), found = %kind(&other), "store bills is not an object");
                lossy = true;
            }
        }
        if lossy {
            self.back_up()?;
        }

        debug!(path = %self.path.display(), bills = doc.bills.len(), "loaded store");
        Ok(doc)
    }

    /// Where an unreadable or partly unreadable store file is preserved.
    pub fn corrupt_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".corrupt");
        self.path.with_file_name(name)
    }

    fn move_aside(&self) -> Result<(), StoreError> {
        let target = self.corrupt_path();
        std::fs::rename(&self.path, &target).map_err(|source| StoreError::Io {
            path: target.clone(),
            source,
        })?;
        warn!(path = %target.display(), "unreadable store preserved");
        Ok(())
    }

    fn back_up(&self) -> Result<(), StoreError> {
        let target = self.corrupt_path();
        std::fs::copy(&self.path, &target).map_err(|source| StoreError::Io {
            path: target.clone(),
            source,
        })?;
        warn!(path = %target.display(), "store with unreadable entries preserved");
        Ok(())
    }

    /// Load the bill mapping, treating a missing file as empty.
    pub fn load_bills_or_empty(&self) -> Result<BillMap, StoreError> {
        match self.load() {
            Ok(doc) => Ok(doc.bills),
            Err(StoreError::Missing(_)) => Ok(BillMap::new()),
            Err(e) => Err(e),
        }
    }

    /// Write `bills` as the full document, stamping `last_updated` and `total_bills`.
    pub fn save(&self, bills: &BillMap) -> Result<(), StoreError> {
        let doc = StoreDocument {
            last_updated: Some(timestamp_now()),
            ..StoreDocument::with_bills(bills.clone())
        };
        self.write_document(&doc)
    }

    fn write_document(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        std::fs::create_dir_all(&dir).map_err(io_err)?;

        let json = serde_json::to_string_pretty(doc)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| StoreError::Persist {
            path: self.path.clone(),
            source: e.error,
        })?;

        debug!(path = %self.path.display(), bills = doc.total_bills, "saved store");
        Ok(())
    }
}

// ── Per-entry decoding ──

enum Decoded {
    Intact(BillRecord),
    WithoutAnalysis(BillRecord),
    Unreadable,
}

fn decode_bill(key: &str, entry: Value) -> Decoded {
    let err = match BillRecord::deserialize(&entry) {
        Ok(bill) => return Decoded::Intact(bill),
        Err(e) => e,
    };
    if let Value::Object(mut fields) = entry
        && fields.remove("analysis").is_some()
        && let Ok(bill) = serde_json::from_value::<BillRecord>(Value::Object(fields))
    {
        warn!(bill = key, error = %err, "dropping unreadable analysis, bill will be re-scored");
        return Decoded::WithoutAnalysis(bill);
    }
    warn!(bill = key, error = %err, "skipping unreadable bill record");
    Decoded::Unreadable
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
