use super::super::domain::{IdentityRecord, SCALE_MAX};
use super::super::responses::ResponseStore;
use super::super::scoring::ScoreSheet;
use serde::Serialize;

pub const SHARE_SUBJECT: &str = "SDG-X assessment results";

/// Mail composition payload; delivery is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareDraft {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Human-readable summary for print, mail or clipboard export.
pub fn build_summary_text(identity: &IdentityRecord, scores: &ScoreSheet) -> String {
    let mut text = String::new();

    let municipality = identity.municipality_name.trim();
    if municipality.is_empty() {
        text.push_str("SDG-X assessment\n");
    } else {
        text.push_str(&format!("SDG-X assessment for {municipality}\n"));
    }
    let email = identity.official_email.trim();
    if !email.is_empty() {
        text.push_str(&format!("Contact: {email}\n"));
    }

    let global = match (scores.global_score, scores.global_band()) {
        (Some(score), Some(band)) => format!("{score:.2}/{SCALE_MAX} ({})", band.label()),
        _ => scores.global_score_label(),
    };
    text.push_str(&format!("Global index: {global}\n"));

    if scores.is_empty() {
        text.push_str("No indicator has been scored yet.\n");
        return text;
    }

    text.push_str("\nIndicator averages\n");
    for score in &scores.indicator_scores {
        text.push_str(&format!(
            "- {}: {:.2}/{SCALE_MAX} ({}, {} answers)\n",
            score.indicator.label(),
            score.average,
            score.band().label(),
            score.sample_count
        ));
    }

    let weak = scores.underperforming();
    if !weak.is_empty() {
        let labels: Vec<String> = weak.iter().map(|score| score.indicator.label()).collect();
        text.push_str(&format!("\nBelow moderate: {}\n", labels.join(", ")));
    }

    text
}

/// Draft a results e-mail: the summary followed by the raw answers.
pub fn share_draft(
    recipient: &str,
    identity: &IdentityRecord,
    scores: &ScoreSheet,
    responses: &ResponseStore,
) -> ShareDraft {
    let mut body = String::from("Hello,\n\nHere are our SDG-X results:\n\n");
    body.push_str(&build_summary_text(identity, scores));

    let answers = serde_json::to_string(responses).unwrap_or_else(|_| "{}".to_string());
    body.push_str(&format!("\nAnswer details: {answers}\n"));

    ShareDraft {
        recipient: recipient.to_string(),
        subject: SHARE_SUBJECT.to_string(),
        body,
    }
}
