//! Merge freshly fetched bills into the persisted mapping.
//!
//! The fetch window is a sliding keyword/date filter, not the full universe of
//! tracked bills, so the merge never drops a stored record: it starts from the
//! stored mapping and overwrites only the keys present in the fetch.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::info;

use crate::bill::{BillRecord, timestamp_now, truncate_chars};

/// Identifier → record, ordered by identifier for stable output.
pub type BillMap = BTreeMap<String, BillRecord>;

/// A tracked bill whose status moved since the last run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedBill {
    #[serde(flatten)]
    pub bill: BillRecord,
    #[serde(rename = "_prev_status")]
    pub prev_status: String,
}

/// Result of [`merge`].
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Identifiers not previously stored.
    pub new: Vec<BillRecord>,
    /// Previously stored identifiers whose non-empty status differs.
    pub changed: Vec<ChangedBill>,
    /// The full updated mapping.
    pub merged: BillMap,
}

/// Merge `fetched` into `stored`, stamping new records with the current time.
pub fn merge(fetched: Vec<BillRecord>, stored: &BillMap) -> MergeOutcome {
    merge_at(fetched, stored, &timestamp_now())
}

/// Merge with an explicit `first_seen` stamp for records seen for the first time.
pub fn merge_at(fetched: Vec<BillRecord>, stored: &BillMap, now: &str) -> MergeOutcome {
    let mut new = Vec::new();
    let mut changed = Vec::new();
    let mut merged = stored.clone();
    let mut classified: HashSet<String> = HashSet::new();

    for mut bill in fetched {
        if bill.bill_number.is_empty() {
            continue;
        }
        let key = bill.bill_number.clone();
        let previous = stored.get(&key);

        bill.first_seen = previous
            .map(|p| p.first_seen.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| now.to_string());

        // Analysis belongs to the store, not to the provider payload.
        if bill.analysis.is_none() {
            bill.analysis = previous.and_then(|p| p.analysis.clone());
        }

        if classified.insert(key.clone()) {
            match previous {
                None => {
                    info!(bill = %key, title = truncate_chars(&bill.title, 70), "[NEW]");
                    new.push(bill.clone());
                }
                Some(prev) if !bill.status.is_empty() && bill.status != prev.status => {
                    info!(
                        bill = %key,
                        from = %prev.status,
                        to = %bill.status,
                        "[CHANGED]"
                    );
                    changed.push(ChangedBill {
                        bill: bill.clone(),
                        prev_status: prev.status.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        merged.insert(key, bill);
    }

    MergeOutcome {
        new,
        changed,
        merged,
    }
}
