//! Terminal output for the track, analyze, and digest commands.
//!
//! Bills render as vertical cards: a `=== AB1234 ===` header, the title, then
//! labelled rows padded to a fixed column.

use std::cmp::Reverse;

use billwatch_core::bill::truncate_chars;
use billwatch_core::{
    Analysis, BillMap, BillRecord, Criterion, Digest, DigestLimits, MergeOutcome, Severity,
    bill_sort_key,
};
use chrono::NaiveDate;

use crate::analyze::AnalyzeReport;

const LABEL_WIDTH: usize = 26;
const MAX_NOTES_CHARS: usize = 300;
const MAX_LISTED: usize = 20;

// ── Public API ──

pub fn print_track_summary(outcome: &MergeOutcome) {
    println!("=== Track summary ===");
    row("New bills", outcome.new.len());
    row("Changed bills", outcome.changed.len());
    row("Total tracked", outcome.merged.len());
    println!();

    if !outcome.new.is_empty() {
        println!("New");
        for bill in &outcome.new {
            println!("  {:<10} {}", bill.bill_number, bill.title);
        }
        println!();
    }

    if !outcome.changed.is_empty() {
        println!("Changed");
        for changed in &outcome.changed {
            println!(
                "  {:<10} {} -> {}",
                changed.bill.bill_number, changed.prev_status, changed.bill.status
            );
        }
        println!();
    }
}

pub fn print_analyze_report(report: &AnalyzeReport) {
    println!("=== Analysis run ===");
    row("Selected", report.selected);
    row("Scored", report.scored);
    row("Failed", report.failed);
    row("Total in store", report.total);
    println!();
}

/// Scored/unscored counts followed by cards for the riskiest bills.
pub fn print_analysis_summary(bills: &BillMap) {
    let scored = bills.values().filter(|b| b.analysis.is_some()).count();
    let high = bills.values().filter(|b| b.risk_count() >= 2).count();

    println!("=== Analysis summary ===");
    row("Bills tracked", bills.len());
    row("Scored", scored);
    row("Unscored", bills.len() - scored);
    row("2+ significant criteria", high);
    println!();

    for bill in ranked_by_risk(bills)
        .into_iter()
        .filter(|b| b.risk_count() >= 1)
        .take(MAX_LISTED)
    {
        print_bill_card(bill);
    }
}

pub fn print_digest(digest: &Digest<'_>, limits: &DigestLimits, today: NaiveDate) {
    println!("=== Digest for {today} ===");
    println!();

    println!("Watch list");
    if digest.watch_list.is_empty() {
        println!("  (none)");
    }
    for bill in &digest.watch_list {
        println!("  {:<10} {}  {}", bill.bill_number, risk_line(bill), bill.title);
    }
    println!();

    println!("New in the last {} days", limits.lookback_days);
    if digest.new_bills.is_empty() {
        println!("  (none)");
    }
    for bill in &digest.new_bills {
        println!("  {:<10} {}  {}", bill.bill_number, risk_line(bill), bill.title);
    }
    println!();

    println!("Hearings in the next {} days", limits.hearing_lookahead);
    if digest.upcoming_hearings.is_empty() {
        println!("  (none)");
    }
    for (hearing, bill) in &digest.upcoming_hearings {
        println!(
            "  {} {:<10} {} ({})",
            hearing.date, bill.bill_number, hearing.committee, hearing.location
        );
    }
    println!();

    for bill in &digest.watch_list {
        print_bill_card(bill);
    }
}

// ── Cards ──

fn print_bill_card(bill: &BillRecord) {
    println!("=== {} ===", bill.bill_number);
    if !bill.title.is_empty() {
        println!("{}", bill.title);
    }
    println!();

    field("Author", &bill.author);
    field("Status", &bill.status);
    field("Status date", &bill.status_date);
    field("Text", &bill.text_url);

    if let Some(analysis) = &bill.analysis {
        print_analysis(analysis);
    }
    println!();
}

fn print_analysis(analysis: &Analysis) {
    for criterion in Criterion::ALL {
        field(criterion.label(), severity_cell(analysis.score(criterion)));
    }
    field("Notes", truncate_chars(&analysis.notes, MAX_NOTES_CHARS));
    if analysis.full_text_fetched {
        field("Full text", "yes");
    }
    field("Analyzed", &analysis.analyzed_date);
    if !analysis.comms_brief.is_empty() {
        println!("  Comms brief");
        for line in analysis.comms_brief.lines() {
            println!("    {line}");
        }
    }
}

// ── Helpers ──

fn row(label: &str, value: usize) {
    println!("  {:<LABEL_WIDTH$} {}", label, value);
}

fn field(label: &str, value: &str) {
    if !value.is_empty() {
        println!("  {:<LABEL_WIDTH$} {}", label, value);
    }
}

fn severity_cell(severity: Severity) -> &'static str {
    match severity {
        Severity::None => "-",
        other => other.as_str(),
    }
}

/// Compact `A:strong B:- C:moderate D:-` line; `unscored` without analysis.
fn risk_line(bill: &BillRecord) -> String {
    let Some(analysis) = &bill.analysis else {
        return "unscored".into();
    };
    Criterion::ALL
        .iter()
        .zip(["A", "B", "C", "D"])
        .map(|(&c, letter)| format!("{letter}:{}", severity_cell(analysis.score(c))))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Most significant criteria first, then most strong, then bill order.
fn ranked_by_risk(bills: &BillMap) -> Vec<&BillRecord> {
    let mut ranked: Vec<&BillRecord> = bills.values().collect();
    ranked.sort_by_key(|b| {
        (
            Reverse(b.risk_count()),
            Reverse(b.strong_count()),
            bill_sort_key(&b.bill_number),
        )
    });
    ranked
}
