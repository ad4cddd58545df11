//! Provider payloads → [`BillRecord`].
//!
//! The raw types mirror only the fields we read. Every field is defaulted and
//! JSON `null` is treated as absent, so a sparse or partially-null payload
//! still normalizes.

use billwatch_core::bill::{
    Action, BillRecord, Hearing, SUMMARY_MAX_CHARS, nullable, truncate_chars,
};
use billwatch_core::normalize_bill_number;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

/// Most recent actions kept on a record.
pub const MAX_ACTIONS: usize = 10;

/// Render a JSON scalar id (`123` or `"123"`) as a string.
pub(crate) fn id_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !name.is_empty() && !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}

// ── LegiScan ──

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegiScanBill {
    pub bill_id: Value,
    #[serde(deserialize_with = "nullable")]
    pub bill_number: String,
    #[serde(deserialize_with = "nullable")]
    pub title: String,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    #[serde(deserialize_with = "nullable")]
    pub state_link: String,
    #[serde(deserialize_with = "nullable")]
    pub status_date: String,
    #[serde(deserialize_with = "nullable")]
    pub last_action: String,
    #[serde(deserialize_with = "nullable")]
    pub last_action_date: String,
    pub status: Value,
    /// Object with `session_name`.
    pub session: Value,
    /// Object with `name`, or `[]` when the bill is not in committee.
    pub committee: Value,
    #[serde(deserialize_with = "nullable")]
    pub sponsors: Vec<LegiScanSponsor>,
    #[serde(deserialize_with = "nullable")]
    pub texts: Vec<LegiScanText>,
    #[serde(deserialize_with = "nullable")]
    pub history: Vec<LegiScanHistory>,
    #[serde(deserialize_with = "nullable")]
    pub referrals: Vec<LegiScanReferral>,
    #[serde(deserialize_with = "nullable")]
    pub calendar: Vec<LegiScanEvent>,
    #[serde(deserialize_with = "nullable")]
    pub subjects: Vec<LegiScanSubject>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegiScanSponsor {
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    pub sponsor_type_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegiScanText {
    #[serde(deserialize_with = "nullable")]
    pub state_link: String,
    #[serde(deserialize_with = "nullable")]
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegiScanHistory {
    #[serde(deserialize_with = "nullable")]
    pub date: String,
    #[serde(deserialize_with = "nullable")]
    pub action: String,
    #[serde(deserialize_with = "nullable")]
    pub chamber: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegiScanReferral {
    #[serde(deserialize_with = "nullable")]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegiScanEvent {
    #[serde(deserialize_with = "nullable")]
    pub date: String,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    #[serde(deserialize_with = "nullable")]
    pub location: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegiScanSubject {
    #[serde(deserialize_with = "nullable")]
    pub subject_name: String,
}

/// Label for LegiScan's numeric progress code.
pub fn legiscan_status_label(code: i64) -> &'static str {
    match code {
        1 => "Introduced",
        2 => "Engrossed",
        3 => "Enrolled",
        4 => "Passed",
        5 => "Vetoed",
        6 => "Failed",
        7 => "Override",
        8 => "Chaptered",
        9 => "Refer",
        10 => "Report Pass",
        11 => "Report DNP",
        12 => "Draft",
        _ => "",
    }
}

fn chamber_name(code: &str) -> String {
    match code {
        "H" => "Assembly".into(),
        "S" => "Senate".into(),
        other => other.to_string(),
    }
}

/// Map a LegiScan `getBill` object (also the dataset archive format).
///
/// `session_name` overrides the payload's own session when non-empty.
/// Calendar events before `today` are dropped.
pub fn normalize_legiscan(raw: &LegiScanBill, session_name: &str, today: NaiveDate) -> BillRecord {
    let author = raw
        .sponsors
        .iter()
        .find(|s| s.sponsor_type_id == Some(1))
        .or_else(|| raw.sponsors.first())
        .map(|s| s.name.clone())
        .unwrap_or_default();

    let mut text_url = raw.state_link.clone();
    if text_url.is_empty()
        && let Some(last) = raw.texts.last()
    {
        text_url = if last.state_link.is_empty() {
            last.url.clone()
        } else {
            last.state_link.clone()
        };
    }

    let skip = raw.history.len().saturating_sub(MAX_ACTIONS);
    let actions = raw.history[skip..]
        .iter()
        .map(|h| Action {
            date: h.date.clone(),
            description: h.action.clone(),
            chamber: chamber_name(&h.chamber),
        })
        .collect();
    let introduced_date = raw
        .history
        .first()
        .map(|h| h.date.clone())
        .unwrap_or_default();

    let mut committees = Vec::new();
    if let Some(name) = raw.committee.get("name").and_then(Value::as_str) {
        push_unique(&mut committees, name);
    }
    for referral in &raw.referrals {
        push_unique(&mut committees, &referral.name);
    }

    let upcoming_hearings = raw
        .calendar
        .iter()
        .filter(|event| {
            NaiveDate::parse_from_str(&event.date, "%Y-%m-%d").is_ok_and(|d| d >= today)
        })
        .map(|event| Hearing {
            date: event.date.clone(),
            committee: event.description.clone(),
            location: event.location.clone(),
        })
        .collect();

    let status = if raw.last_action.is_empty() {
        legiscan_status_label(raw.status.as_i64().unwrap_or(0)).to_string()
    } else {
        raw.last_action.clone()
    };

    let session = if session_name.is_empty() {
        raw.session
            .get("session_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    } else {
        session_name.to_string()
    };

    BillRecord {
        bill_number: normalize_bill_number(&raw.bill_number),
        session,
        title: raw.title.clone(),
        author,
        status,
        status_date: raw.status_date.clone(),
        introduced_date,
        last_updated: raw.status_date.clone(),
        text_url,
        summary: truncate_chars(&raw.description, SUMMARY_MAX_CHARS).to_string(),
        subjects: raw
            .subjects
            .iter()
            .map(|s| s.subject_name.clone())
            .filter(|s| !s.is_empty())
            .collect(),
        committees,
        upcoming_hearings,
        actions,
        source: "legiscan".into(),
        source_id: id_string(&raw.bill_id),
        ..Default::default()
    }
}

// ── OpenStates ──

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpenStatesBill {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub identifier: String,
    #[serde(deserialize_with = "nullable")]
    pub session: String,
    #[serde(deserialize_with = "nullable")]
    pub title: String,
    #[serde(deserialize_with = "nullable")]
    pub latest_action_description: String,
    #[serde(deserialize_with = "nullable")]
    pub latest_action_date: String,
    #[serde(deserialize_with = "nullable")]
    pub created_at: String,
    #[serde(deserialize_with = "nullable")]
    pub updated_at: String,
    #[serde(deserialize_with = "nullable")]
    pub subject: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub sponsorships: Vec<OpenStatesSponsorship>,
    #[serde(deserialize_with = "nullable")]
    pub actions: Vec<OpenStatesAction>,
    #[serde(deserialize_with = "nullable")]
    pub sources: Vec<OpenStatesLink>,
    #[serde(deserialize_with = "nullable")]
    pub abstracts: Vec<OpenStatesAbstract>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpenStatesSponsorship {
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub primary: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpenStatesAction {
    #[serde(deserialize_with = "nullable")]
    pub date: String,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    /// Object with `name`.
    pub organization: Value,
    #[serde(deserialize_with = "nullable")]
    pub related_entities: Vec<OpenStatesEntity>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpenStatesEntity {
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub kind: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpenStatesLink {
    #[serde(deserialize_with = "nullable")]
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpenStatesAbstract {
    #[serde(rename = "abstract", deserialize_with = "nullable")]
    pub text: String,
}

/// Map an OpenStates v3 `/bills` result. OpenStates carries no calendar, so
/// `upcoming_hearings` is always empty.
pub fn normalize_openstates(raw: &OpenStatesBill) -> BillRecord {
    let author = raw
        .sponsorships
        .iter()
        .find(|s| s.primary)
        .or_else(|| raw.sponsorships.first())
        .map(|s| s.name.clone())
        .unwrap_or_default();

    let skip = raw.actions.len().saturating_sub(MAX_ACTIONS);
    let actions = raw.actions[skip..]
        .iter()
        .map(|a| Action {
            date: a.date.clone(),
            description: a.description.clone(),
            chamber: a
                .organization
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
        .collect();

    let mut committees = Vec::new();
    for entity in raw.actions.iter().flat_map(|a| &a.related_entities) {
        if entity.kind == "committee" {
            push_unique(&mut committees, &entity.name);
        }
    }

    let summary = raw
        .abstracts
        .first()
        .map(|a| truncate_chars(&a.text, SUMMARY_MAX_CHARS).to_string())
        .unwrap_or_default();

    BillRecord {
        bill_number: normalize_bill_number(&raw.identifier),
        session: raw.session.clone(),
        title: raw.title.clone(),
        author,
        status: raw.latest_action_description.clone(),
        status_date: raw.latest_action_date.clone(),
        introduced_date: truncate_chars(&raw.created_at, 10).to_string(),
        last_updated: raw.updated_at.clone(),
        text_url: raw.sources.first().map(|s| s.url.clone()).unwrap_or_default(),
        summary,
        subjects: raw.subject.clone(),
        committees,
        upcoming_hearings: Vec::new(),
        actions,
        source: "openstates".into(),
        source_id: raw.id.clone(),
        ..Default::default()
    }
}
