//! Scoring prompt, the `score_bill` tool contract, and per-bill message text.

use billwatch_core::bill::truncate_chars;
use billwatch_core::{BillRecord, Criterion};
use serde_json::{Map, Value, json};

use crate::claude::ToolDefinition;

pub const SCORE_TOOL_NAME: &str = "score_bill";

/// Characters of full bill text included in the second pass.
pub const FULL_TEXT_MAX_CHARS: usize = 4000;
pub const TRUNCATION_MARKER: &str = "\n[... text truncated ...]";

/// Summaries shorter than this get a hint that full text may be worth fetching.
const SHORT_SUMMARY_CHARS: usize = 100;
const RECENT_ACTIONS: usize = 5;

pub const SYSTEM_PROMPT: &str = "\
You are a California policy analyst assessing legislation for its RISK TO LOCAL CONTROL:
how far each bill undermines the authority of cities and counties over their own
planning, zoning, and land use decisions.

RISK CRITERIA:

A. Local Control Override
   Does the bill preempt, override, or restrict city/county zoning and land use authority?
   STRONG: explicit state preemption; cities must approve projects regardless of local zoning
   MODERATE: conditional or partial limitation on local authority
   INDIRECT: implied erosion of local discretion (compliance pressure, unfunded mandates)
   NONE: no impact on local zoning or planning authority

B. Removes Discretionary Review
   Does the bill strip CEQA review, design review, public hearings, conditional use
   permits, or similar local deliberation?
   STRONG: mandates ministerial approval, eliminates CEQA, or removes hearing rights
   MODERATE: significantly limits conditions cities may apply or removes review categories
   INDIRECT: reduces review scope or compresses timelines without full elimination
   NONE: no impact on local review authority

C. Mandates Development
   Does the bill force cities to approve density, housing types, or volumes beyond
   what local deliberation would choose?
   STRONG: explicit mandates, builder's remedy provisions, required density increases, quotas
   MODERATE: incentives or requirements that effectively override local preference
   INDIRECT: some pressure toward higher density without an explicit mandate
   NONE: no mandate on what or how much cities must approve

D. Infrastructure & Capacity Burden
   Does the bill restrict impact fees or improvement conditions, shift capacity costs to
   existing residents, or mandate development beyond existing infrastructure capacity?
   STRONG: eliminates or caps impact fees, or mandates approval without capacity review
   MODERATE: limits infrastructure conditions, or imposes significant unfunded obligations
   INDIRECT: some cost pressure without explicit restriction
   NONE: no meaningful infrastructure or capacity burden

SCORING SCALE:
  \"strong\"   explicit and central to the bill
  \"moderate\" significant, but secondary to the bill's main purpose
  \"indirect\" implied or likely, not explicit in the bill language
  \"none\"     no relevant risk identified

Be accurate. A bill with no local mandates (a state program, an insurance regulation,
a workforce bill) scores \"none\" on every criterion. Not every bill is a threat.

COMMS BRIEF: when 2 or more criteria score \"strong\" or \"moderate\", write a plain-text
comms_brief with no markdown headers:

[One sentence: what the bill does mechanically, from a local control perspective.]
- [Specific local control risk 1]
- [Specific local control risk 2]
- [Specific local control risk 3]
Recommended: [oppose, seek amendments, monitor, testify, ...]

Otherwise comms_brief is an empty string.
";

fn criterion_description(criterion: Criterion) -> &'static str {
    match criterion {
        Criterion::LocalControlOverride => {
            "Risk score for Criterion A: Local Control Override. strong=explicit state \
             preemption, moderate=partial limitation, indirect=implied erosion, none=no impact."
        }
        Criterion::RemovesDiscretionaryReview => {
            "Risk score for Criterion B: Removes Discretionary Review. strong=ministerial or \
             by-right mandate, moderate=limits conditions or review scope, indirect=compresses \
             timelines or scope, none=no impact."
        }
        Criterion::MandatesDevelopment => {
            "Risk score for Criterion C: Mandates Development. strong=explicit mandate, \
             builder's remedy or quota, moderate=incentive that effectively overrides local \
             preference, indirect=pressure without mandate, none=no mandate."
        }
        Criterion::InfrastructureBurden => {
            "Risk score for Criterion D: Infrastructure & Capacity Burden. strong=fee \
             elimination or improvement restriction, moderate=limits infrastructure conditions \
             or unfunded compliance burden, indirect=minor capacity pressure, none=no burden."
        }
    }
}

/// The forced tool whose input is the structured scoring result.
pub fn score_tool() -> ToolDefinition {
    let mut properties = Map::new();
    for criterion in Criterion::ALL {
        properties.insert(
            criterion.key().into(),
            json!({
                "type": "string",
                "enum": ["strong", "moderate", "indirect", "none"],
                "description": criterion_description(criterion),
            }),
        );
    }
    properties.insert(
        "notes".into(),
        json!({
            "type": "string",
            "description": "1-2 sentence technical summary naming the mechanism or language \
                            behind each score other than 'none'.",
        }),
    );
    properties.insert(
        "comms_brief".into(),
        json!({
            "type": "string",
            "description": "Plain-text brief in the format from the instructions when 2+ \
                            criteria are strong or moderate; otherwise an empty string.",
        }),
    );
    properties.insert(
        "fetch_full_text".into(),
        json!({
            "type": "boolean",
            "description": "True if the summary is too short or ambiguous to score confidently \
                            and the full bill text would materially change the analysis.",
        }),
    );

    let required: Vec<Value> = properties.keys().cloned().map(Value::String).collect();
    ToolDefinition {
        name: SCORE_TOOL_NAME.into(),
        description: "Record the local-control risk scores for a California legislative bill. \
                      Call this tool once with the final assessment for all four criteria."
            .into(),
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
    }
}

/// User message for one bill. `full_text` switches to the second-pass form.
pub fn build_prompt(bill: &BillRecord, full_text: Option<&str>) -> String {
    let summary = if bill.summary.is_empty() {
        "(no summary available)"
    } else {
        bill.summary.as_str()
    };

    let mut lines = vec![
        "Analyze this California legislative bill:".to_string(),
        String::new(),
        format!("Bill Number : {}", bill.bill_number),
        format!("Title       : {}", bill.title),
        format!("Author      : {}", bill.author),
        format!("Status      : {}", bill.status),
        format!("Session     : {}", bill.session),
        String::new(),
        "Summary:".to_string(),
        summary.to_string(),
    ];

    if !bill.actions.is_empty() {
        lines.push(String::new());
        lines.push("Recent Actions:".to_string());
        let skip = bill.actions.len().saturating_sub(RECENT_ACTIONS);
        for action in &bill.actions[skip..] {
            lines.push(format!(
                "  {} [{}] {}",
                action.date, action.chamber, action.description
            ));
        }
    }

    match full_text {
        Some(text) => {
            let mut digest = truncate_chars(text, FULL_TEXT_MAX_CHARS).to_string();
            if digest.len() < text.len() {
                digest.push_str(TRUNCATION_MARKER);
            }
            lines.push(String::new());
            lines.push("Full Bill Text (digest):".to_string());
            lines.push(digest);
        }
        None => {
            let summary_len = bill.summary.chars().count();
            if summary_len < SHORT_SUMMARY_CHARS {
                lines.push(String::new());
                lines.push(format!(
                    "NOTE: Summary is very short ({summary_len} chars). Consider requesting \
                     full text if the title suggests the bill may be relevant."
                ));
            }
        }
    }

    lines.push(String::new());
    lines.push(
        "Score this bill on all four criteria and provide concise notes. \
         Use the score_bill tool to record your assessment."
            .to_string(),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use billwatch_core::Action;

    fn bill() -> BillRecord {
        BillRecord {
            bill_number: "AB1234".into(),
            title: "Housing: streamlined approvals".into(),
            author: "Wicks".into(),
            status: "In committee".into(),
            session: "2025-2026".into(),
            ..Default::default()
        }
    }

    #[test]
    fn tool_requires_every_property() {
        let tool = score_tool();
        let schema = &tool.input_schema;
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required.len(), 7);
        for criterion in Criterion::ALL {
            assert!(required.contains(&criterion.key()));
            assert_eq!(schema["properties"][criterion.key()]["enum"][0], "strong");
        }
        assert!(required.contains(&"fetch_full_text"));
        assert_eq!(schema["properties"]["fetch_full_text"]["type"], "boolean");
    }

    #[test]
    fn first_pass_flags_short_summary() {
        let prompt = build_prompt(&bill(), None);
        assert!(prompt.contains("Bill Number : AB1234"));
        assert!(prompt.contains("(no summary available)"));
        assert!(prompt.contains("Summary is very short (0 chars)"));
        assert!(!prompt.contains("Full Bill Text"));
        assert!(prompt.ends_with("Use the score_bill tool to record your assessment."));
    }

    #[test]
    fn long_summary_has_no_hint() {
        let mut b = bill();
        b.summary = "x".repeat(150);
        assert!(!build_prompt(&b, None).contains("NOTE:"));
    }

    #[test]
    fn only_last_five_actions() {
        let mut b = bill();
        b.actions = (1..=7)
            .map(|i| Action {
                date: format!("2026-03-0{i}"),
                description: format!("step {i}"),
                chamber: "Assembly".into(),
            })
            .collect();
        let prompt = build_prompt(&b, None);
        assert!(!prompt.contains("step 2"));
        assert!(prompt.contains("  2026-03-03 [Assembly] step 3"));
        assert!(prompt.contains("step 7"));
    }

    #[test]
    fn second_pass_truncates_text() {
        let text = "y".repeat(FULL_TEXT_MAX_CHARS + 10);
        let prompt = build_prompt(&bill(), Some(&text));
        assert!(prompt.contains("Full Bill Text (digest):"));
        assert!(prompt.contains(TRUNCATION_MARKER));
        assert!(!prompt.contains("NOTE:"));

        let prompt = build_prompt(&bill(), Some("short text"));
        assert!(prompt.contains("short text"));
        assert!(!prompt.contains("truncated"));
    }
}
