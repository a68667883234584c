use super::common::*;
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::assessment::domain::{IdentityRecord, QuestionId, Stage};
use crate::assessment::gate::{GateNotice, GatePolicy};
use crate::assessment::session::AssessmentSession;
use crate::assessment::ideas::IdeaError;
use crate::assessment::responses::ResponseError;
use crate::assessment::session::SessionError;
use crate::assessment::store::{AssessmentStore, MemoryStore, StorageKey};

#[test]
fn answering_requires_complete_identity() {
    let (mut session, store) = memory_session();

    let error = session
        .select_answer(QuestionId(1), answer(3))
        .expect_err("identity missing");

    assert!(matches!(
        error,
        SessionError::Gate(GateNotice::IdentityIncomplete {
            target: Stage::Questionnaire,
            ..
        })
    ));
    assert!(session.responses().is_empty());
    assert!(store.load(StorageKey::Responses).expect("load").is_none());
}

#[test]
fn answers_recompute_scores_and_persist() {
    let (session, store) = scored_session();

    let scores = session.scores();
    assert_eq!(scores.get(indicator(6)).map(|s| s.average), Some(3.0));
    assert_eq!(scores.get(indicator(13)).map(|s| s.average), Some(2.0));
    assert_eq!(scores.global_score, Some(2.5));

    assert_eq!(
        store.load(StorageKey::Responses).expect("load"),
        Some(json!({ "1": 4, "2": 2 }))
    );
}

#[test]
fn reanswering_replaces_previous_value() {
    let (mut session, _) = scored_session();

    session
        .select_answer(QuestionId(2), answer(4))
        .expect("answer accepted");

    assert_eq!(session.responses().get(QuestionId(2)), Some(answer(4)));
    assert_eq!(session.scores().global_score, Some(4.0));
}

#[test]
fn not_applicable_answer_is_kept_but_not_scored() {
    let (mut session, _) = memory_session();
    session.update_identity(complete_identity());

    let scores = session
        .select_answer(QuestionId(1), answer(0))
        .expect("answer accepted");

    assert!(scores.is_empty());
    assert_eq!(scores.global_score, None);
    assert_eq!(session.responses().len(), 1);
}

#[test]
fn unknown_question_is_rejected() {
    let (mut session, _) = memory_session();
    session.update_identity(complete_identity());

    let error = session
        .select_answer(QuestionId(42), answer(2))
        .expect_err("unknown question");

    assert!(matches!(
        error,
        SessionError::Response(ResponseError::UnknownQuestion(QuestionId(42)))
    ));
}

#[test]
fn clearing_an_answer_recomputes_scores() {
    let (mut session, store) = scored_session();

    let scores = session
        .clear_answer(QuestionId(2))
        .expect("identity still complete");

    assert!(scores.get(indicator(13)).is_none());
    assert_eq!(scores.global_score, Some(4.0));
    assert_eq!(
        store.load(StorageKey::Responses).expect("load"),
        Some(json!({ "1": 4 }))
    );
}

#[test]
fn restore_picks_up_persisted_state() {
    let (original, store) = scored_session();

    let restored = session_with(store);

    assert_eq!(restored.responses(), original.responses());
    assert_eq!(restored.identity(), original.identity());
    assert_eq!(restored.scores(), original.scores());
    assert_eq!(restored.stage(), Stage::Welcome);
}

#[test]
fn restore_falls_back_to_defaults_on_unreadable_state() {
    let session = session_with(Arc::new(CorruptStore));

    assert!(session.responses().is_empty());
    assert_eq!(session.identity(), &IdentityRecord::default());
    assert!(session.ideas().is_empty());
    assert!(session.scores().is_empty());
}

#[test]
fn restore_ignores_wrong_shape_and_unknown_questions() {
    let store = Arc::new(MemoryStore::new());
    store
        .save(StorageKey::Responses, &json!({ "1": 3, "99": 4 }))
        .expect("save");
    store
        .save(StorageKey::Identity, &json!(42))
        .expect("save");

    let session = session_with(store);

    assert_eq!(session.responses().len(), 1);
    assert_eq!(session.responses().get(QuestionId(1)), Some(answer(3)));
    assert_eq!(session.identity(), &IdentityRecord::default());
}

#[test]
fn persistence_failure_keeps_in_memory_change() {
    let mut session = session_with(Arc::new(FailingStore));
    assert!(session.update_identity(complete_identity()).is_none());

    let scores = session
        .select_answer(QuestionId(1), answer(2))
        .expect("write failure is not surfaced");

    assert_eq!(scores.global_score, Some(2.0));
    assert_eq!(session.responses().get(QuestionId(1)), Some(answer(2)));
}

#[test]
fn navigation_refusal_keeps_current_stage() {
    let (mut session, _) = memory_session();
    session.navigate(Stage::About).expect("ungated stage");

    let notice = session
        .navigate(Stage::Results)
        .expect_err("identity missing");

    assert_eq!(notice.target(), Stage::Results);
    assert_eq!(session.stage(), Stage::About);
}

#[test]
fn clearing_identity_leaves_gated_stage() {
    let (mut session, _) = scored_session();
    session.navigate(Stage::Results).expect("reachable");

    let notice = session
        .update_identity(IdentityRecord {
            official_email: "odd@annecy.fr".to_string(),
            ..IdentityRecord::default()
        })
        .expect("stage demoted");

    assert_eq!(notice.target(), Stage::Results);
    assert_eq!(session.stage(), Stage::Identity);
    assert_eq!(
        session.reachable_stages(),
        vec![Stage::Welcome, Stage::About, Stage::Identity, Stage::Contact]
    );
}

#[test]
fn ideas_only_target_underperforming_indicators() {
    let (mut session, store) = scored_session();
    let at = Utc
        .with_ymd_and_hms(2025, 5, 2, 18, 30, 0)
        .single()
        .expect("valid timestamp");

    assert_eq!(session.idea_targets(), vec![indicator(13)]);

    let rejected = session
        .submit_idea(indicator(6), "More fountains", at)
        .expect_err("SDG 6 is moderate");
    assert!(matches!(
        rejected,
        SessionError::Idea(IdeaError::TargetNotEligible(target)) if target == indicator(6)
    ));

    let idea = session
        .submit_idea(indicator(13), "Bike lanes to the station", at)
        .expect("idea accepted");
    assert_eq!(idea.target_indicator, indicator(13));
    assert_eq!(session.ideas().len(), 1);

    let stored = store
        .load(StorageKey::Ideas)
        .expect("load")
        .expect("ideas persisted");
    assert_eq!(stored[0]["text"], "Bike lanes to the station");
    assert_eq!(stored[0]["target_indicator"], 13);
}

#[test]
fn ideas_require_identity() {
    let (mut session, _) = memory_session();

    let error = session
        .submit_idea(indicator(13), "Idea", Utc::now())
        .expect_err("gated");

    assert!(matches!(error, SessionError::Gate(_)));
}

#[test]
fn reset_clears_state_and_storage() {
    let (mut session, store) = scored_session();
    session
        .submit_idea(indicator(13), "Shared compost bins", Utc::now())
        .expect("idea accepted");
    session.navigate(Stage::Priorities).expect("reachable");

    session.reset();

    assert!(session.responses().is_empty());
    assert!(session.ideas().is_empty());
    assert!(session.scores().is_empty());
    assert_eq!(session.identity(), &IdentityRecord::default());
    assert_eq!(session.stage(), Stage::Welcome);
    for key in StorageKey::all() {
        assert!(store.load(key).expect("load").is_none(), "{key:?} cleared");
    }
}

#[test]
fn reset_survives_storage_failure() {
    let mut session = session_with(Arc::new(FailingStore));
    session.update_identity(complete_identity());
    session
        .select_answer(QuestionId(1), answer(1))
        .expect("answer accepted");

    session.reset();

    assert!(session.responses().is_empty());
    assert_eq!(session.stage(), Stage::Welcome);
}

#[test]
fn priorities_and_share_draft_reflect_answers() {
    let (session, _) = scored_session();

    let priorities = session.priorities();
    assert_eq!(priorities.indicators.len(), 1);
    assert_eq!(priorities.indicators[0].indicator, indicator(13));
    assert_eq!(priorities.recommendations.len(), 1);
    assert_eq!(priorities.recommendations[0].text, "Insulate school buildings.");

    let draft = session.share_draft("prefecture@example.org");
    assert_eq!(draft.subject, "SDG-X assessment results");
    assert!(draft.body.contains("SDG-X assessment for Annecy"));
    assert!(draft.body.contains(r#"{"1":4,"2":2}"#));
}

#[test]
fn snapshot_lists_reachable_stages_and_targets() {
    let (session, _) = scored_session();

    let snapshot = session.snapshot();

    assert_eq!(snapshot.stage, Stage::Welcome);
    assert!(snapshot.identity_complete);
    assert_eq!(snapshot.reachable_stages, Stage::ordered().to_vec());
    assert_eq!(snapshot.idea_targets, vec![indicator(13)]);
    assert_eq!(snapshot.scores.global_score, Some(2.5));
}

#[test]
fn gated_entry_stage_is_only_entered_with_identity() {
    let policy = GatePolicy {
        entry_stage: Stage::Questionnaire,
        results_require_answers: false,
    };

    let store = Arc::new(MemoryStore::new());
    let fresh = AssessmentSession::restore(catalog(), store.clone(), policy);
    assert_eq!(fresh.stage(), Stage::Identity);
    assert!(fresh.reachable_stages().contains(&fresh.stage()));

    let mut seeded = AssessmentSession::restore(catalog(), store.clone(), policy);
    seeded.update_identity(complete_identity());
    let restored = AssessmentSession::restore(catalog(), store, policy);
    assert_eq!(restored.stage(), Stage::Questionnaire);

    seeded.reset();
    assert_eq!(seeded.stage(), Stage::Identity);
}
