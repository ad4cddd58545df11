//! Canonical bill record shared by every stage of the pipeline.
//!
//! Each provider's raw schema is mapped into [`BillRecord`] by the sync layer;
//! the analyzer attaches an [`Analysis`] once a bill has been scored. Every
//! field carries a serde default so that partially-populated store files and
//! sparse provider payloads deserialize without error.

use serde::{Deserialize, Deserializer, Serialize};

/// Maximum characters kept from a provider's bill description.
pub const SUMMARY_MAX_CHARS: usize = 600;

/// Ordered risk severity assigned to each scoring criterion.
///
/// Variant order is significant: `None < Indirect < Moderate < Strong`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    None,
    Indirect,
    Moderate,
    Strong,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::None,
        Severity::Indirect,
        Severity::Moderate,
        Severity::Strong,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Indirect => "indirect",
            Self::Moderate => "moderate",
            Self::Strong => "strong",
        }
    }

    /// Moderate or strong — the threshold for watch lists and comms briefs.
    pub fn is_significant(self) -> bool {
        self >= Severity::Moderate
    }
}

/// The four local-control risk criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    LocalControlOverride,
    RemovesDiscretionaryReview,
    MandatesDevelopment,
    InfrastructureBurden,
}

impl Criterion {
    pub const ALL: [Criterion; 4] = [
        Criterion::LocalControlOverride,
        Criterion::RemovesDiscretionaryReview,
        Criterion::MandatesDevelopment,
        Criterion::InfrastructureBurden,
    ];

    /// Field name used in the store file and the scoring tool schema.
    pub fn key(&self) -> &'static str {
        match self {
            Self::LocalControlOverride => "pro_housing_production",
            Self::RemovesDiscretionaryReview => "densification",
            Self::MandatesDevelopment => "reduce_discretion",
            Self::InfrastructureBurden => "cost_to_cities",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::LocalControlOverride => "A: Local Control Override",
            Self::RemovesDiscretionaryReview => "B: Removes Discretionary Review",
            Self::MandatesDevelopment => "C: Mandates Development",
            Self::InfrastructureBurden => "D: Infrastructure & Capacity Burden",
        }
    }
}

/// Scoring result attached to a bill after analysis.
///
/// The criterion field names predate the current criteria labels and are kept
/// for compatibility with existing store files; see [`Criterion::key`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analysis {
    #[serde(deserialize_with = "nullable")]
    pub pro_housing_production: Severity,
    #[serde(deserialize_with = "nullable")]
    pub densification: Severity,
    #[serde(deserialize_with = "nullable")]
    pub reduce_discretion: Severity,
    #[serde(deserialize_with = "nullable")]
    pub cost_to_cities: Severity,
    #[serde(deserialize_with = "nullable")]
    pub notes: String,
    /// Non-empty only when two or more criteria are moderate or strong.
    #[serde(deserialize_with = "nullable")]
    pub comms_brief: String,
    #[serde(deserialize_with = "nullable")]
    pub full_text_fetched: bool,
    /// `YYYY-MM-DD`.
    #[serde(deserialize_with = "nullable")]
    pub analyzed_date: String,
    /// Bill status at scoring time; a mismatch with the current status
    /// queues the bill for re-analysis.
    #[serde(deserialize_with = "nullable")]
    pub status_at_analysis: String,
    #[serde(deserialize_with = "nullable")]
    pub model: String,
}

impl Analysis {
    pub fn score(&self, criterion: Criterion) -> Severity {
        match criterion {
            Criterion::LocalControlOverride => self.pro_housing_production,
            Criterion::RemovesDiscretionaryReview => self.densification,
            Criterion::MandatesDevelopment => self.reduce_discretion,
            Criterion::InfrastructureBurden => self.cost_to_cities,
        }
    }

    /// Number of criteria scored moderate or strong.
    pub fn risk_count(&self) -> usize {
        Criterion::ALL
            .iter()
            .filter(|&&c| self.score(c).is_significant())
            .count()
    }

    /// Number of criteria scored strong.
    pub fn strong_count(&self) -> usize {
        Criterion::ALL
            .iter()
            .filter(|&&c| self.score(c) == Severity::Strong)
            .count()
    }

    /// Clear the comms brief unless at least two criteria are significant.
    pub fn enforce_brief_threshold(&mut self) {
        if self.risk_count() < 2 {
            self.comms_brief.clear();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hearing {
    /// `YYYY-MM-DD`.
    #[serde(deserialize_with = "nullable")]
    pub date: String,
    #[serde(deserialize_with = "nullable")]
    pub committee: String,
    #[serde(deserialize_with = "nullable")]
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    #[serde(deserialize_with = "nullable")]
    pub date: String,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    /// "Assembly", "Senate", or the provider's organisation name.
    #[serde(deserialize_with = "nullable")]
    pub chamber: String,
}

/// One piece of legislation tracked over time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillRecord {
    /// Canonical identifier, e.g. `"AB1234"`.
    #[serde(deserialize_with = "nullable")]
    pub bill_number: String,
    #[serde(deserialize_with = "nullable")]
    pub session: String,
    #[serde(deserialize_with = "nullable")]
    pub title: String,
    #[serde(deserialize_with = "nullable")]
    pub author: String,
    /// Free-text latest action.
    #[serde(deserialize_with = "nullable")]
    pub status: String,
    #[serde(deserialize_with = "nullable")]
    pub status_date: String,
    #[serde(deserialize_with = "nullable")]
    pub introduced_date: String,
    #[serde(deserialize_with = "nullable")]
    pub last_updated: String,
    #[serde(deserialize_with = "nullable")]
    pub text_url: String,
    #[serde(deserialize_with = "nullable")]
    pub summary: String,
    #[serde(deserialize_with = "nullable")]
    pub subjects: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub committees: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub upcoming_hearings: Vec<Hearing>,
    #[serde(deserialize_with = "nullable")]
    pub actions: Vec<Action>,
    /// Provider that produced this record ("legiscan", "openstates", ...).
    #[serde(deserialize_with = "nullable")]
    pub source: String,
    #[serde(deserialize_with = "nullable")]
    pub source_id: String,
    /// ISO 8601 timestamp string. Set once on first merge.
    #[serde(deserialize_with = "nullable")]
    pub first_seen: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
}

impl BillRecord {
    /// Risk count of the attached analysis, or 0 if unscored.
    pub fn risk_count(&self) -> usize {
        self.analysis.as_ref().map_or(0, Analysis::risk_count)
    }

    pub fn strong_count(&self) -> usize {
        self.analysis.as_ref().map_or(0, Analysis::strong_count)
    }
}

/// Treat an explicit JSON `null` as the field's default.
///
/// Combine with `#[serde(default)]` so absent and null fields read the same.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Truncate to at most `max_chars` characters (not bytes).
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Local wall-clock timestamp in the store's `first_seen` format.
pub fn timestamp_now() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
