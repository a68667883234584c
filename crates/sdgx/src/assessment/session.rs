use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::catalog::QuestionCatalog;
use super::domain::{AnswerValue, IdentityRecord, IndicatorId, QuestionId, Stage};
use super::gate::{AccessGate, GateContext, GateNotice, GatePolicy};
use super::ideas::{CitizenIdea, CitizenIdeaBoard, IdeaError};
use super::report::{self, PriorityReport, ShareDraft};
use super::responses::{ResponseError, ResponseStore};
use super::scoring::{compute_scores, views::ScoreSummary, ScoreSheet};
use super::store::{AssessmentStore, StorageKey};

/// One municipality's assessment: owned state plus an injected store.
///
/// Every mutation recomputes the score cache and then persists the touched key.
/// Persistence failures are logged and never roll back the in-memory change.
pub struct AssessmentSession<S> {
    catalog: Arc<QuestionCatalog>,
    store: Arc<S>,
    responses: ResponseStore,
    identity: IdentityRecord,
    ideas: CitizenIdeaBoard,
    gate: AccessGate,
    scores: ScoreSheet,
}

impl<S> AssessmentSession<S>
where
    S: AssessmentStore + 'static,
{
    /// Start a session, restoring whatever the store holds.
    ///
    /// Absent or unreadable keys fall back to empty defaults.
    pub fn restore(catalog: Arc<QuestionCatalog>, store: Arc<S>, policy: GatePolicy) -> Self {
        let mut responses: ResponseStore = load_or_default(store.as_ref(), StorageKey::Responses);
        let discarded = responses.retain_known(&catalog);
        if !discarded.is_empty() {
            warn!(count = discarded.len(), "dropped stored answers unknown to the catalog");
        }

        let identity = load_or_default(store.as_ref(), StorageKey::Identity);
        let ideas = load_or_default(store.as_ref(), StorageKey::Ideas);
        let scores = compute_scores(&catalog, &responses);

        let mut session = Self {
            catalog,
            store,
            responses,
            identity,
            ideas,
            gate: AccessGate::new(policy),
            scores,
        };
        let context = GateContext {
            identity: &session.identity,
            scored_answers: session.responses.scored_count(),
        };
        session.gate.enter(context);

        info!(
            answers = session.responses.len(),
            ideas = session.ideas.len(),
            identity_complete = session.identity.is_complete(),
            stage = ?session.gate.current(),
            "assessment session restored"
        );
        session
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn responses(&self) -> &ResponseStore {
        &self.responses
    }

    pub fn identity(&self) -> &IdentityRecord {
        &self.identity
    }

    pub fn ideas(&self) -> &CitizenIdeaBoard {
        &self.ideas
    }

    pub fn scores(&self) -> &ScoreSheet {
        &self.scores
    }

    pub fn stage(&self) -> Stage {
        self.gate.current()
    }

    pub fn reachable_stages(&self) -> Vec<Stage> {
        self.gate.reachable(self.context())
    }

    pub fn select_answer(
        &mut self,
        question_id: QuestionId,
        value: AnswerValue,
    ) -> Result<&ScoreSheet, SessionError> {
        self.ensure_reachable(Stage::Questionnaire)?;
        self.responses.record(&self.catalog, question_id, value)?;
        debug!(question = %question_id, value = value.get(), "answer recorded");
        self.after_responses_changed();
        Ok(&self.scores)
    }

    pub fn clear_answer(&mut self, question_id: QuestionId) -> Result<&ScoreSheet, SessionError> {
        self.ensure_reachable(Stage::Questionnaire)?;
        if self.responses.remove(question_id).is_some() {
            debug!(question = %question_id, "answer cleared");
            self.after_responses_changed();
        }
        Ok(&self.scores)
    }

    /// Replace the identity record. Returns a notice if the current stage had to be left.
    pub fn update_identity(&mut self, identity: IdentityRecord) -> Option<GateNotice> {
        self.identity = identity;
        self.persist(StorageKey::Identity, &self.identity);

        let context = GateContext {
            identity: &self.identity,
            scored_answers: self.responses.scored_count(),
        };
        let notice = self.gate.enforce(context);
        if let Some(notice) = &notice {
            info!(stage = ?self.gate.current(), %notice, "stage no longer reachable after identity change");
        }
        notice
    }

    /// Attempt a stage transition. A refused transition leaves the stage unchanged.
    pub fn navigate(&mut self, target: Stage) -> Result<Stage, GateNotice> {
        let context = GateContext {
            identity: &self.identity,
            scored_answers: self.responses.scored_count(),
        };
        match self.gate.navigate(target, context) {
            Ok(stage) => {
                debug!(?stage, "stage entered");
                Ok(stage)
            }
            Err(notice) => {
                info!(current = ?self.gate.current(), %notice, "stage transition refused");
                Err(notice)
            }
        }
    }

    pub fn idea_targets(&self) -> Vec<IndicatorId> {
        CitizenIdeaBoard::eligible_targets(&self.scores)
    }

    pub fn submit_idea(
        &mut self,
        target: IndicatorId,
        text: &str,
        submitted_at: DateTime<Utc>,
    ) -> Result<CitizenIdea, SessionError> {
        self.ensure_reachable(Stage::CitizenIdeas)?;
        let idea = self
            .ideas
            .submit(&self.scores, target, text, submitted_at)?
            .clone();
        info!(indicator = %target, total = self.ideas.len(), "citizen idea submitted");
        self.persist(StorageKey::Ideas, &self.ideas);
        Ok(idea)
    }

    /// Clear answers, identity, ideas and derived scores, and return to the entry stage.
    pub fn reset(&mut self) {
        self.responses.clear();
        self.identity = IdentityRecord::default();
        self.ideas.clear();
        self.scores = ScoreSheet::default();
        self.gate.reset();

        for key in StorageKey::all() {
            if let Err(err) = self.store.clear(key) {
                warn!(key = key.as_str(), error = %err, "failed to clear persisted state");
            }
        }
        info!(stage = ?self.gate.current(), "assessment reset");
    }

    pub fn summary(&self) -> ScoreSummary {
        self.scores.summary()
    }

    pub fn priorities(&self) -> PriorityReport {
        report::priority_report(&self.catalog, &self.responses, &self.scores)
    }

    pub fn summary_text(&self) -> String {
        report::build_summary_text(&self.identity, &self.scores)
    }

    pub fn share_draft(&self, recipient: &str) -> ShareDraft {
        report::share_draft(recipient, &self.identity, &self.scores, &self.responses)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            stage: self.gate.current(),
            reachable_stages: self.reachable_stages(),
            identity: self.identity.clone(),
            identity_complete: self.identity.is_complete(),
            answers: self.responses.clone(),
            scores: self.summary(),
            idea_targets: self.idea_targets(),
            ideas: self.ideas.ideas().to_vec(),
        }
    }

    fn context(&self) -> GateContext<'_> {
        GateContext {
            identity: &self.identity,
            scored_answers: self.responses.scored_count(),
        }
    }

    fn ensure_reachable(&self, stage: Stage) -> Result<(), GateNotice> {
        self.gate.evaluate(stage, self.context())
    }

    fn after_responses_changed(&mut self) {
        self.scores = compute_scores(&self.catalog, &self.responses);
        self.persist(StorageKey::Responses, &self.responses);

        let context = GateContext {
            identity: &self.identity,
            scored_answers: self.responses.scored_count(),
        };
        if let Some(notice) = self.gate.enforce(context) {
            info!(stage = ?self.gate.current(), %notice, "stage no longer reachable after answer change");
        }
    }

    fn persist<T: Serialize>(&self, key: StorageKey, value: &T) {
        let result = serde_json::to_value(value)
            .map_err(|err| err.to_string())
            .and_then(|json| self.store.save(key, &json).map_err(|err| err.to_string()));

        if let Err(error) = result {
            warn!(key = key.as_str(), %error, "failed to persist assessment state");
        }
    }
}

fn load_or_default<S, T>(store: &S, key: StorageKey) -> T
where
    S: AssessmentStore + ?Sized,
    T: DeserializeOwned + Default,
{
    match store.load(key) {
        Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|err| {
            warn!(key = key.as_str(), error = %err, "stored state has the wrong shape, using defaults");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(err) => {
            warn!(key = key.as_str(), error = %err, "stored state unreadable, using defaults");
            T::default()
        }
    }
}

/// Serializable view of the whole session for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub stage: Stage,
    pub reachable_stages: Vec<Stage>,
    pub identity: IdentityRecord,
    pub identity_complete: bool,
    pub answers: ResponseStore,
    pub scores: ScoreSummary,
    pub idea_targets: Vec<IndicatorId>,
    pub ideas: Vec<CitizenIdea>,
}

/// Error raised by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Gate(#[from] GateNotice),
    #[error(transparent)]
    Response(#[from] ResponseError),
    #[error(transparent)]
    Idea(#[from] IdeaError),
}
