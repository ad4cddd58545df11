//! Decide which stored bills need (re-)scoring.

use tracing::{debug, warn};

use crate::bill_number::same_bill;
use crate::merge::BillMap;

/// How the analyzer picks its work list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScreeningMode {
    /// Unscored bills plus bills whose status moved since they were scored.
    #[default]
    Incremental,
    /// Every stored bill.
    Force,
    /// One bill, matched on normalised identifier. Takes precedence over force.
    Single(String),
}

impl ScreeningMode {
    pub fn from_flags(force: bool, bill: Option<String>) -> Self {
        match bill {
            Some(target) => Self::Single(target),
            None if force => Self::Force,
            None => Self::Incremental,
        }
    }
}

/// Identifiers of the bills to score, in store order.
pub fn bills_needing_analysis(bills: &BillMap, mode: &ScreeningMode) -> Vec<String> {
    match mode {
        ScreeningMode::Single(target) => {
            let found: Vec<String> = bills
                .keys()
                .filter(|key| same_bill(key, target))
                .cloned()
                .collect();
            if found.is_empty() {
                warn!(bill = %target, "bill not found in store");
            }
            found
        }
        ScreeningMode::Force => bills.keys().cloned().collect(),
        ScreeningMode::Incremental => bills
            .iter()
            .filter(|(key, bill)| match &bill.analysis {
                None => true,
                Some(analysis) if analysis.status_at_analysis != bill.status => {
                    debug!(
                        bill = %key,
                        scored_at = %analysis.status_at_analysis,
                        now = %bill.status,
                        "status changed since analysis"
                    );
                    true
                }
                Some(_) => false,
            })
            .map(|(key, _)| key.clone())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bill::{Analysis, BillRecord};

    fn store() -> BillMap {
        let scored = |number: &str, status: &str, scored_at: &str| BillRecord {
            bill_number: number.into(),
            status: status.into(),
            analysis: Some(Analysis {
                status_at_analysis: scored_at.into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let unscored = BillRecord {
            bill_number: "AB3".into(),
            status: "Introduced".into(),
            ..Default::default()
        };
        [
            scored("AB1", "Introduced", "Introduced"),
            scored("AB2", "Passed Committee", "Introduced"),
            unscored,
        ]
        .into_iter()
        .map(|b| (b.bill_number.clone(), b))
        .collect()
    }

    #[test]
    fn incremental_selects_unscored_and_stale() {
        let picked = bills_needing_analysis(&store(), &ScreeningMode::Incremental);
        assert_eq!(picked, vec!["AB2".to_string(), "AB3".to_string()]);
    }

    #[test]
    fn force_selects_everything() {
        let picked = bills_needing_analysis(&store(), &ScreeningMode::Force);
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn single_matches_spaced_identifier() {
        let picked = bills_needing_analysis(&store(), &ScreeningMode::Single("ab 1".into()));
        assert_eq!(picked, vec!["AB1".to_string()]);
    }

    #[test]
    fn single_unknown_is_empty() {
        let picked = bills_needing_analysis(&store(), &ScreeningMode::Single("SB999".into()));
        assert!(picked.is_empty());
    }

    #[test]
    fn single_takes_precedence_over_force() {
        assert_eq!(
            ScreeningMode::from_flags(true, Some("AB 1".into())),
            ScreeningMode::Single("AB 1".into())
        );
        assert_eq!(ScreeningMode::from_flags(true, None), ScreeningMode::Force);
        assert_eq!(
            ScreeningMode::from_flags(false, None),
            ScreeningMode::Incremental
        );
    }
}
