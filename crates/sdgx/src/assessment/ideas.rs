use super::domain::IndicatorId;
use super::scoring::ScoreSheet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Suggestion from a resident aimed at a weak indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitizenIdea {
    pub target_indicator: IndicatorId,
    pub text: String,
    pub submitted_at: DateTime<Utc>,
}

/// Append-only list of ideas, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CitizenIdeaBoard {
    ideas: Vec<CitizenIdea>,
}

impl CitizenIdeaBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indicators an idea may target: those below the moderate band.
    pub fn eligible_targets(scores: &ScoreSheet) -> Vec<IndicatorId> {
        scores
            .underperforming()
            .into_iter()
            .map(|score| score.indicator)
            .collect()
    }

    pub fn submit(
        &mut self,
        scores: &ScoreSheet,
        target: IndicatorId,
        text: &str,
        submitted_at: DateTime<Utc>,
    ) -> Result<&CitizenIdea, IdeaError> {
        let eligible = Self::eligible_targets(scores);
        if eligible.is_empty() {
            return Err(IdeaError::NoUnderperformingIndicators);
        }
        if !eligible.contains(&target) {
            return Err(IdeaError::TargetNotEligible(target));
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(IdeaError::EmptyText);
        }

        self.ideas.insert(
            0,
            CitizenIdea {
                target_indicator: target,
                text: text.to_string(),
                submitted_at,
            },
        );
        Ok(&self.ideas[0])
    }

    pub fn ideas(&self) -> &[CitizenIdea] {
        &self.ideas
    }

    pub fn len(&self) -> usize {
        self.ideas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ideas.is_empty()
    }

    pub fn clear(&mut self) {
        self.ideas.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdeaError {
    #[error("no indicator is below the moderate band; ideas are closed")]
    NoUnderperformingIndicators,
    #[error("{0} is not below the moderate band")]
    TargetNotEligible(IndicatorId),
    #[error("idea text must not be empty")]
    EmptyText,
}
