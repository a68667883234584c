use super::super::catalog::QuestionCatalog;
use super::super::domain::{AnswerValue, IndicatorId, QuestionId, ScoreBand};
use super::super::responses::ResponseStore;
use super::super::scoring::ScoreSheet;
use serde::Serialize;
use std::cmp::Ordering;

pub const DEFAULT_RECOMMENDATION: &str = "Take corrective action.";
pub const NO_ACTION_MESSAGE: &str = "No priority action detected.";

/// Corrective action suggested by a weak answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub question_id: QuestionId,
    pub answer: AnswerValue,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityEntry {
    pub indicator: IndicatorId,
    pub indicator_label: String,
    pub average: f64,
    pub band: ScoreBand,
    pub band_label: &'static str,
}

/// Backing data for the priorities stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityReport {
    pub indicators: Vec<PriorityEntry>,
    pub recommendations: Vec<Recommendation>,
}

impl PriorityReport {
    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty() && self.recommendations.is_empty()
    }
}

/// Every answered question scored 1 or 2 yields one recommendation, in question order.
pub fn recommendations(catalog: &QuestionCatalog, responses: &ResponseStore) -> Vec<Recommendation> {
    responses
        .iter()
        .filter(|(_, answer)| answer.needs_action())
        .filter_map(|(question_id, answer)| {
            let question = catalog.get(question_id)?;
            Some(Recommendation {
                question_id,
                answer,
                text: question
                    .recommendation
                    .clone()
                    .unwrap_or_else(|| DEFAULT_RECOMMENDATION.to_string()),
            })
        })
        .collect()
}

/// Critical and low indicators, weakest first, with the matching recommendations.
pub fn priority_report(
    catalog: &QuestionCatalog,
    responses: &ResponseStore,
    scores: &ScoreSheet,
) -> PriorityReport {
    let mut indicators: Vec<PriorityEntry> = scores
        .underperforming()
        .into_iter()
        .map(|score| {
            let band = score.band();
            PriorityEntry {
                indicator: score.indicator,
                indicator_label: score.indicator.label(),
                average: score.average,
                band,
                band_label: band.label(),
            }
        })
        .collect();

    indicators.sort_by(|a, b| {
        a.average
            .partial_cmp(&b.average)
            .unwrap_or(Ordering::Equal)
            .then(a.indicator.cmp(&b.indicator))
    });

    PriorityReport {
        indicators,
        recommendations: recommendations(catalog, responses),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::scoring::compute_scores;

    fn answer(raw: u8) -> AnswerValue {
        AnswerValue::new(raw).expect("valid answer")
    }

    #[test]
    fn weak_answers_use_question_text_or_default() {
        let catalog = QuestionCatalog::standard();
        let mut responses = ResponseStore::new();
        for (id, raw) in [(4, 1), (9, 2), (11, 3), (21, 0)] {
            responses
                .record(&catalog, QuestionId(id), answer(raw))
                .expect("answer accepted");
        }

        let found = recommendations(&catalog, &responses);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].question_id, QuestionId(4));
        assert!(found[0].text.contains("remote metering"));
        assert_eq!(found[1].question_id, QuestionId(9));
        assert_eq!(found[1].text, DEFAULT_RECOMMENDATION);
    }

    #[test]
    fn priorities_sorted_weakest_first() {
        let catalog = QuestionCatalog::standard();
        let mut responses = ResponseStore::new();
        // Q19 and Q20 both feed SDG 16, Q17 feeds SDG 9 alone.
        for (id, raw) in [(19, 2), (20, 2), (17, 1), (13, 4)] {
            responses
                .record(&catalog, QuestionId(id), answer(raw))
                .expect("answer accepted");
        }
        let scores = compute_scores(&catalog, &responses);

        let report = priority_report(&catalog, &responses, &scores);

        let order: Vec<u8> = report
            .indicators
            .iter()
            .map(|entry| entry.indicator.get())
            .collect();
        assert_eq!(order, vec![9, 16]);
        assert_eq!(report.indicators[0].band, ScoreBand::Critical);
        assert_eq!(report.recommendations.len(), 3);
    }

    #[test]
    fn strong_answers_produce_empty_report() {
        let catalog = QuestionCatalog::standard();
        let mut responses = ResponseStore::new();
        responses
            .record(&catalog, QuestionId(1), answer(4))
            .expect("answer accepted");
        let scores = compute_scores(&catalog, &responses);

        assert!(priority_report(&catalog, &responses, &scores).is_empty());
    }
}
