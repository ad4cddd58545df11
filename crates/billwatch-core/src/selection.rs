//! Pick the bills worth surfacing in a periodic digest.

use chrono::{Duration, NaiveDate};

use crate::bill::{BillRecord, Hearing};
use crate::merge::BillMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestLimits {
    /// Bills first seen within this many days count as new.
    pub lookback_days: i64,
    /// Hearings within this many days of today are listed.
    pub hearing_lookahead: i64,
    pub max_watch: usize,
    pub max_new: usize,
}

impl Default for DigestLimits {
    fn default() -> Self {
        Self {
            lookback_days: 14,
            hearing_lookahead: 7,
            max_watch: 3,
            max_new: 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Digest<'a> {
    /// Two or more significant criteria, hearing-imminent bills first.
    pub watch_list: Vec<&'a BillRecord>,
    /// Recently discovered bills with at least one significant criterion.
    pub new_bills: Vec<&'a BillRecord>,
    /// Hearings in the lookahead window, by date.
    pub upcoming_hearings: Vec<(&'a Hearing, &'a BillRecord)>,
}

/// `day` moved by `days`, saturating at the calendar bounds.
pub fn offset_day(day: NaiveDate, days: i64) -> NaiveDate {
    let bound = if days < 0 {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    };
    Duration::try_days(days)
        .and_then(|d| day.checked_add_signed(d))
        .unwrap_or(bound)
}

fn parse_day(s: &str) -> Option<NaiveDate> {
    let head = s.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

pub fn select_bills<'a>(bills: &'a BillMap, limits: &DigestLimits, today: NaiveDate) -> Digest<'a> {
    let horizon = offset_day(today, limits.hearing_lookahead);
    let cutoff = offset_day(today, limits.lookback_days.saturating_neg());

    let mut upcoming_hearings: Vec<(&Hearing, &BillRecord)> = bills
        .values()
        .flat_map(|bill| bill.upcoming_hearings.iter().map(move |h| (h, bill)))
        .filter(|(h, _)| parse_day(&h.date).is_some_and(|d| d >= today && d <= horizon))
        .collect();
    upcoming_hearings.sort_by(|a, b| a.0.date.cmp(&b.0.date));

    let has_hearing = |bill: &BillRecord| {
        upcoming_hearings
            .iter()
            .any(|(_, b)| std::ptr::eq(*b, bill))
    };

    let mut watch_list: Vec<&BillRecord> =
        bills.values().filter(|b| b.risk_count() >= 2).collect();
    watch_list.sort_by_key(|b| {
        (
            std::cmp::Reverse(has_hearing(b)),
            std::cmp::Reverse(b.risk_count()),
            std::cmp::Reverse(b.strong_count()),
        )
    });
    watch_list.truncate(limits.max_watch);

    let mut new_bills: Vec<&BillRecord> = bills
        .values()
        .filter(|b| b.risk_count() >= 1)
        .filter(|b| parse_day(&b.first_seen).is_some_and(|d| d >= cutoff))
        .collect();
    new_bills.truncate(limits.max_new);

    Digest {
        watch_list,
        new_bills,
        upcoming_hearings,
    }
}
