//! Municipal SDG self-assessment: questionnaire, scoring, stage gating and citizen ideas.
//!
//! `AssessmentSession` ties the pieces together over an injected `AssessmentStore`;
//! `assessment_router` exposes the session over HTTP.

pub mod catalog;
pub mod domain;
pub mod gate;
pub mod ideas;
pub mod report;
pub mod responses;
pub mod router;
pub mod scoring;
pub mod session;
pub mod store;

#[cfg(test)]
mod tests;

pub use catalog::{AnswerOption, CatalogError, Question, QuestionCatalog};
pub use domain::{
    AnswerValue, IdentityRecord, IndicatorId, QuestionId, ScoreBand, Stage, INDICATOR_COUNT,
    SCALE_MAX,
};
pub use gate::{AccessGate, GateContext, GateNotice, GatePolicy};
pub use ideas::{CitizenIdea, CitizenIdeaBoard, IdeaError};
pub use responses::{ResponseError, ResponseStore};
pub use router::{assessment_router, SharedSession};
pub use scoring::{compute_scores, IndicatorScore, ScoreSheet};
pub use session::{AssessmentSession, SessionError, SessionSnapshot};
pub use store::{AssessmentStore, JsonFileStore, MemoryStore, StorageKey, StoreError};
