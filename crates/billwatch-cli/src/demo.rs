//! Built-in sample bills for `track --demo`.

use billwatch_core::{Action, BillRecord, Hearing};
use chrono::{Duration, NaiveDate};

const LEGINFO_BILL: &str =
    "https://leginfo.legislature.ca.gov/faces/billNavClient.xhtml?bill_id=202520260";

fn day(today: NaiveDate, offset: i64) -> String {
    (today + Duration::days(offset))
        .format("%Y-%m-%d")
        .to_string()
}

struct Sample {
    number: &'static str,
    title: &'static str,
    author: &'static str,
    status: &'static str,
    summary: &'static str,
    subjects: &'static [&'static str],
    committee: &'static str,
    /// Days until the next hearing.
    hearing_in: Option<i64>,
    /// Days since the latest action.
    acted_days_ago: i64,
}

const SAMPLES: &[Sample] = &[
    Sample {
        number: "AB1893",
        title: "Housing Accountability Act: builder's remedy",
        author: "Wicks",
        status: "Referred to Com. on H. & C.D.",
        summary: "Revises the conditions under which a local agency may disapprove a housing \
                  development project that does not conform to its general plan, and requires \
                  approval of qualifying projects where the housing element is out of compliance.",
        subjects: &["Housing", "Land Use"],
        committee: "Assembly Housing and Community Development",
        hearing_in: Some(4),
        acted_days_ago: 3,
    },
    Sample {
        number: "SB423",
        title: "Land use: streamlined housing approvals: multifamily housing developments",
        author: "Wiener",
        status: "From committee: Do pass and re-refer to Com. on APPR.",
        summary: "Extends ministerial, streamlined approval for multifamily housing developments \
                  in jurisdictions that have not met regional housing need allocations, and \
                  exempts qualifying projects from CEQA review.",
        subjects: &["Housing", "CEQA", "Zoning"],
        committee: "Senate Appropriations",
        hearing_in: Some(9),
        acted_days_ago: 6,
    },
    Sample {
        number: "AB2011",
        title: "Affordable Housing and High Road Jobs Act",
        author: "Wicks",
        status: "Introduced",
        summary: "Makes housing a permitted use on commercially zoned parcels along \
                  commercial corridors.",
        subjects: &["Housing", "Zoning"],
        committee: "",
        hearing_in: None,
        acted_days_ago: 10,
    },
    Sample {
        number: "SB1123",
        title: "Accessory dwelling units: impact fees",
        author: "Caballero",
        status: "In committee: Set, first hearing.",
        summary: "Prohibits a local agency from imposing impact fees on accessory dwelling units \
                  of less than 750 square feet.",
        subjects: &["Accessory Dwelling Units", "Fees"],
        committee: "Senate Local Government",
        hearing_in: Some(2),
        acted_days_ago: 1,
    },
    Sample {
        number: "AB3093",
        title: "Land use: housing element: extremely low income and acutely low income households",
        author: "Ward",
        status: "Chaptered by Secretary of State",
        summary: "",
        subjects: &["Housing"],
        committee: "",
        hearing_in: None,
        acted_days_ago: 20,
    },
];

/// Sample housing bills with dates relative to `today`.
pub fn sample_bills(today: NaiveDate) -> Vec<BillRecord> {
    SAMPLES
        .iter()
        .map(|s| {
            let status_date = day(today, -s.acted_days_ago);
            let chamber = if s.number.starts_with("SB") {
                "Senate"
            } else {
                "Assembly"
            };
            let upcoming_hearings = s
                .hearing_in
                .map(|offset| Hearing {
                    date: day(today, offset),
                    committee: s.committee.into(),
                    location: "1021 O Street, Sacramento".into(),
                })
                .into_iter()
                .collect();

            BillRecord {
                bill_number: s.number.into(),
                session: "2025-2026".into(),
                title: s.title.into(),
                author: s.author.into(),
                status: s.status.into(),
                status_date: status_date.clone(),
                introduced_date: day(today, -60),
                last_updated: status_date.clone(),
                text_url: format!("{LEGINFO_BILL}{}", s.number),
                summary: s.summary.into(),
                subjects: s.subjects.iter().map(|subject| subject.to_string()).collect(),
                committees: (!s.committee.is_empty())
                    .then(|| s.committee.to_string())
                    .into_iter()
                    .collect(),
                upcoming_hearings,
                actions: vec![
                    Action {
                        date: day(today, -60),
                        description: "Introduced. Read first time.".into(),
                        chamber: chamber.into(),
                    },
                    Action {
                        date: status_date,
                        description: s.status.into(),
                        chamber: chamber.into(),
                    },
                ],
                source: "demo".into(),
                source_id: s.number.into(),
                ..Default::default()
            }
        })
        .collect()
}
