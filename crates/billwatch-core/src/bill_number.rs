//! Bill-number normalisation for California legislative identifiers.
//!
//! Providers disagree on spacing and case ("AB 1234", "ab1234", "AB1234").
//! The store keys every record by the compact uppercase form, and listings
//! sort by a zero-padded key so that AB2 precedes AB10.
//!
//! # California numbering conventions
//!
//! - AB / SB: Assembly and Senate bills
//! - ACA / SCA: constitutional amendments
//! - AJR / SJR, ACR / SCR, HR / SR: resolutions

/// Strip all whitespace and uppercase: `" ab 12 "` → `"AB12"`.
pub fn normalize_bill_number(s: &str) -> String {
    s.split_whitespace()
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Whether two identifiers refer to the same bill after normalisation.
pub fn same_bill(a: &str, b: &str) -> bool {
    normalize_bill_number(a) == normalize_bill_number(b)
}

/// Lexicographically-sortable key for a bill number.
///
/// Input: `"AB2"`, `"AB 10"`, `"SCA1"`
/// Output: `"AB.00002"`, `"AB.00010"`, `"SCA.00001"`
///
/// 1. Leading ASCII letters → chamber/type prefix
/// 2. Following ASCII digits → number, zero-padded to 5 digits
/// 3. Anything after the digits is appended verbatim
pub fn bill_sort_key(s: &str) -> String {
    let compact = normalize_bill_number(s);
    if compact.is_empty() {
        return String::new();
    }

    let prefix_end = compact
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(compact.len());
    let prefix = &compact[..prefix_end];

    let rest = &compact[prefix_end..];
    let digit_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let number: u64 = rest[..digit_end].parse().unwrap_or(0);

    format!("{}.{:05}{}", prefix, number, &rest[digit_end..])
}
