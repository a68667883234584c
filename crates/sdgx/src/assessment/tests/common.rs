use std::collections::BTreeSet;
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::assessment::catalog::{AnswerOption, Question, QuestionCatalog};
use crate::assessment::domain::{AnswerValue, IdentityRecord, IndicatorId, QuestionId};
use crate::assessment::gate::GatePolicy;
use crate::assessment::router::{assessment_router, SharedSession};
use crate::assessment::session::AssessmentSession;
use crate::assessment::store::{AssessmentStore, MemoryStore, StorageKey, StoreError};

pub(super) fn indicator(raw: u8) -> IndicatorId {
    IndicatorId::new(raw).expect("valid indicator")
}

pub(super) fn answer(raw: u8) -> AnswerValue {
    AnswerValue::new(raw).expect("valid answer")
}

fn question(id: u32, indicators: &[u8], recommendation: Option<&str>) -> Question {
    Question {
        id: QuestionId(id),
        text: format!("Question {id}"),
        indicators: indicators
            .iter()
            .map(|raw| indicator(*raw))
            .collect::<BTreeSet<_>>(),
        options: [
            (0, "Not applicable"),
            (1, "Not started"),
            (2, "Planned"),
            (3, "In progress"),
            (4, "Achieved"),
        ]
        .into_iter()
        .map(|(value, label)| AnswerOption {
            value: answer(value),
            label: label.to_string(),
        })
        .collect(),
        recommendation: recommendation.map(str::to_string),
    }
}

/// Q1 feeds SDG 6; Q2 feeds SDG 6 and SDG 13.
pub(super) fn catalog() -> Arc<QuestionCatalog> {
    Arc::new(
        QuestionCatalog::new(vec![
            question(1, &[6], None),
            question(2, &[6, 13], Some("Insulate school buildings.")),
        ])
        .expect("valid catalog"),
    )
}

pub(super) fn complete_identity() -> IdentityRecord {
    IdentityRecord {
        municipality_name: "Annecy".to_string(),
        official_email: "odd@annecy.fr".to_string(),
        ..IdentityRecord::default()
    }
}

pub(super) fn session_with<S>(store: Arc<S>) -> AssessmentSession<S>
where
    S: AssessmentStore + 'static,
{
    AssessmentSession::restore(catalog(), store, GatePolicy::default())
}

pub(super) fn memory_session() -> (AssessmentSession<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (session_with(store.clone()), store)
}

/// Session with a complete identity and Q1=4, Q2=2 answered.
pub(super) fn scored_session() -> (AssessmentSession<MemoryStore>, Arc<MemoryStore>) {
    let (mut session, store) = memory_session();
    session.update_identity(complete_identity());
    session
        .select_answer(QuestionId(1), answer(4))
        .expect("answer accepted");
    session
        .select_answer(QuestionId(2), answer(2))
        .expect("answer accepted");
    (session, store)
}

pub(super) fn shared(session: AssessmentSession<MemoryStore>) -> SharedSession<MemoryStore> {
    Arc::new(Mutex::new(session))
}

pub(super) fn router_for(session: SharedSession<MemoryStore>) -> axum::Router {
    assessment_router(session)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Loads nothing and rejects every write.
#[derive(Debug, Default)]
pub(super) struct FailingStore;

impl AssessmentStore for FailingStore {
    fn load(&self, _key: StorageKey) -> Result<Option<Value>, StoreError> {
        Ok(None)
    }

    fn save(&self, _key: StorageKey, _value: &Value) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("quota exceeded".to_string()))
    }

    fn clear(&self, _key: StorageKey) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("quota exceeded".to_string()))
    }
}

/// Every key reads back as unparseable.
#[derive(Debug, Default)]
pub(super) struct CorruptStore;

impl AssessmentStore for CorruptStore {
    fn load(&self, key: StorageKey) -> Result<Option<Value>, StoreError> {
        let source = serde_json::from_str::<Value>("{oops").expect_err("invalid json");
        Err(StoreError::Corrupt {
            key: key.as_str(),
            source,
        })
    }

    fn save(&self, _key: StorageKey, _value: &Value) -> Result<(), StoreError> {
        Ok(())
    }

    fn clear(&self, _key: StorageKey) -> Result<(), StoreError> {
        Ok(())
    }
}
