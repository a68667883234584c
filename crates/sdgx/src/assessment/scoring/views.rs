use super::super::domain::{IndicatorId, ScoreBand, SCALE_MAX};
use super::engine::{IndicatorScore, ScoreSheet};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct IndicatorScoreView {
    pub indicator: IndicatorId,
    pub indicator_label: String,
    pub average: f64,
    pub sample_count: usize,
    pub band: ScoreBand,
    pub band_label: &'static str,
    pub color: &'static str,
}

/// Shape consumed by the chart renderer and the results page.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreSummary {
    pub indicator_scores: Vec<IndicatorScoreView>,
    pub global_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_band: Option<ScoreBand>,
    pub scale_max: u8,
    pub underperforming: Vec<IndicatorId>,
}

impl IndicatorScore {
    pub fn to_view(&self) -> IndicatorScoreView {
        let band = self.band();
        IndicatorScoreView {
            indicator: self.indicator,
            indicator_label: self.indicator.label(),
            average: self.average,
            sample_count: self.sample_count,
            band,
            band_label: band.label(),
            color: band.color(),
        }
    }
}

impl ScoreSheet {
    pub fn summary(&self) -> ScoreSummary {
        ScoreSummary {
            indicator_scores: self
                .indicator_scores
                .iter()
                .map(IndicatorScore::to_view)
                .collect(),
            global_score: self.global_score,
            global_band: self.global_band(),
            scale_max: SCALE_MAX,
            underperforming: self
                .underperforming()
                .into_iter()
                .map(|score| score.indicator)
                .collect(),
        }
    }

    /// Global score formatted for display, `n/a` when nothing was scored.
    pub fn global_score_label(&self) -> String {
        match self.global_score {
            Some(score) => format!("{score:.2}"),
            None => "n/a".to_string(),
        }
    }
}
