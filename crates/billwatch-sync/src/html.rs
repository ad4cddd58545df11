//! HTML helpers for leginfo.legislature.ca.gov pages.

use scraper::{ElementRef, Html, Selector};

use crate::SourceError;

/// Containers that hold bill text or the legislative digest, best first.
const TEXT_SELECTORS: [&str; 5] = [
    "#bill_all",
    ".bill-digest",
    "#bill_digest",
    "div.bill-text",
    "div#content",
];

/// Minimum length for the largest-`<div>` fallback.
const MIN_FALLBACK_CHARS: usize = 200;

pub(crate) fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Html(format!("bad selector {css:?}: {e:?}")))
}

/// Text nodes trimmed and joined one per line, blanks dropped.
pub(crate) fn element_text(el: ElementRef<'_>, separator: &str) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Extract the bill text from a leginfo bill page.
///
/// Returns `None` when no known container matches and no `<div>` carries
/// more than a trivial amount of text.
pub fn extract_bill_text(html: &str) -> Result<Option<String>, SourceError> {
    let doc = Html::parse_document(html);

    for css in TEXT_SELECTORS {
        if let Some(el) = doc.select(&selector(css)?).next() {
            return Ok(Some(element_text(el, "\n")));
        }
    }

    let best = doc
        .select(&selector("div")?)
        .max_by_key(|div| div.text().map(str::len).sum::<usize>());
    Ok(best
        .map(|div| element_text(div, "\n"))
        .filter(|text| text.chars().count() > MIN_FALLBACK_CHARS))
}
