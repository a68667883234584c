use super::catalog::QuestionCatalog;
use super::domain::{AnswerValue, QuestionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Answers selected so far, keyed by question. Source of truth for scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseStore {
    answers: BTreeMap<QuestionId, AnswerValue>,
}

impl ResponseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer after checking it against the catalog.
    ///
    /// Returns the previous answer for the question, if any.
    pub fn record(
        &mut self,
        catalog: &QuestionCatalog,
        question_id: QuestionId,
        value: AnswerValue,
    ) -> Result<Option<AnswerValue>, ResponseError> {
        let question = catalog
            .get(question_id)
            .ok_or(ResponseError::UnknownQuestion(question_id))?;

        if !question.accepts(value) {
            return Err(ResponseError::InvalidOption {
                question: question_id,
                value: value.get(),
            });
        }

        Ok(self.answers.insert(question_id, value))
    }

    pub fn remove(&mut self, question_id: QuestionId) -> Option<AnswerValue> {
        self.answers.remove(&question_id)
    }

    pub fn get(&self, question_id: QuestionId) -> Option<AnswerValue> {
        self.answers.get(&question_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, AnswerValue)> + '_ {
        self.answers.iter().map(|(id, value)| (*id, *value))
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Answers that feed aggregation (the `0` sentinel excluded).
    pub fn scored_count(&self) -> usize {
        self.answers.values().filter(|value| value.is_scored()).count()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    /// Drop restored entries the catalog no longer knows or no longer offers.
    ///
    /// Returns the ids that were discarded.
    pub fn retain_known(&mut self, catalog: &QuestionCatalog) -> Vec<QuestionId> {
        let mut discarded = Vec::new();
        self.answers.retain(|id, value| {
            let keep = catalog
                .get(*id)
                .is_some_and(|question| question.accepts(*value));
            if !keep {
                discarded.push(*id);
            }
            keep
        });
        discarded
    }
}

impl FromIterator<(QuestionId, AnswerValue)> for ResponseStore {
    fn from_iter<T: IntoIterator<Item = (QuestionId, AnswerValue)>>(iter: T) -> Self {
        Self {
            answers: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    #[error("question {0} is not part of the catalog")]
    UnknownQuestion(QuestionId),
    #[error("question {question} does not offer answer value {value}")]
    InvalidOption { question: QuestionId, value: u8 },
}
