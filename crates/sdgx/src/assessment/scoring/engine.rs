use super::super::catalog::QuestionCatalog;
use super::super::domain::{IndicatorId, ScoreBand};
use super::super::responses::ResponseStore;
use serde::Serialize;
use std::collections::BTreeMap;

/// Average maturity for one indicator, rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorScore {
    pub indicator: IndicatorId,
    pub average: f64,
    pub sample_count: usize,
}

impl IndicatorScore {
    pub fn band(&self) -> ScoreBand {
        ScoreBand::classify(self.average)
    }
}

/// Derived scores for a set of responses. Recomputed on demand, never persisted.
///
/// `global_score` is `None` when no indicator received a scored answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreSheet {
    pub indicator_scores: Vec<IndicatorScore>,
    pub global_score: Option<f64>,
}

impl ScoreSheet {
    pub fn is_empty(&self) -> bool {
        self.indicator_scores.is_empty()
    }

    pub fn get(&self, indicator: IndicatorId) -> Option<&IndicatorScore> {
        self.indicator_scores
            .iter()
            .find(|score| score.indicator == indicator)
    }

    pub fn global_band(&self) -> Option<ScoreBand> {
        self.global_score.map(ScoreBand::classify)
    }

    /// Indicators banded critical or low.
    pub fn underperforming(&self) -> Vec<&IndicatorScore> {
        self.indicator_scores
            .iter()
            .filter(|score| score.band().is_underperforming())
            .collect()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    sum: u32,
    count: usize,
}

/// Aggregate responses into per-indicator averages and a global score.
///
/// Each scored answer counts once for every indicator tagged on its question. The
/// global score weights indicators equally, whatever their number of answers.
pub fn compute_scores(catalog: &QuestionCatalog, responses: &ResponseStore) -> ScoreSheet {
    let mut tallies: BTreeMap<IndicatorId, Tally> = BTreeMap::new();

    for question in catalog.questions() {
        let Some(value) = responses.get(question.id) else {
            continue;
        };
        if !value.is_scored() {
            continue;
        }

        for indicator in &question.indicators {
            let tally = tallies.entry(*indicator).or_default();
            tally.sum += u32::from(value.get());
            tally.count += 1;
        }
    }

    let averages: Vec<(IndicatorId, f64, usize)> = tallies
        .into_iter()
        .map(|(indicator, tally)| {
            (
                indicator,
                f64::from(tally.sum) / tally.count as f64,
                tally.count,
            )
        })
        .collect();

    let global_score = if averages.is_empty() {
        None
    } else {
        let total: f64 = averages.iter().map(|(_, average, _)| average).sum();
        Some(round2(total / averages.len() as f64))
    };

    let indicator_scores = averages
        .into_iter()
        .map(|(indicator, average, sample_count)| IndicatorScore {
            indicator,
            average: round2(average),
            sample_count,
        })
        .collect();

    ScoreSheet {
        indicator_scores,
        global_score,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
