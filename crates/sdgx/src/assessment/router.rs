use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use super::catalog::Question;
use super::domain::{AnswerValue, IdentityRecord, IndicatorId, QuestionId, Stage};
use super::gate::GateNotice;
use super::report::{self, Recommendation};
use super::responses::{ResponseError, ResponseStore};
use super::scoring::{compute_scores, views::ScoreSummary};
use super::session::{AssessmentSession, SessionError};
use super::store::AssessmentStore;

/// Session shared between request handlers.
pub type SharedSession<S> = Arc<Mutex<AssessmentSession<S>>>;

/// Router builder exposing the questionnaire, scoring and session endpoints.
pub fn assessment_router<S>(session: SharedSession<S>) -> Router
where
    S: AssessmentStore + 'static,
{
    Router::new()
        .route("/api/v1/catalog", get(catalog_handler::<S>))
        .route("/api/v1/scores", post(score_handler::<S>))
        .route("/api/v1/session", get(snapshot_handler::<S>))
        .route(
            "/api/v1/session/answers/:question_id",
            put(answer_handler::<S>).delete(clear_answer_handler::<S>),
        )
        .route("/api/v1/session/identity", put(identity_handler::<S>))
        .route("/api/v1/session/navigate", post(navigate_handler::<S>))
        .route("/api/v1/session/ideas", post(idea_handler::<S>))
        .route("/api/v1/session/priorities", get(priorities_handler::<S>))
        .route("/api/v1/session/summary", get(summary_handler::<S>))
        .route("/api/v1/session/share", post(share_handler::<S>))
        .route("/api/v1/session/export.csv", get(export_handler::<S>))
        .route("/api/v1/session/reset", post(reset_handler::<S>))
        .with_state(session)
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub answers: BTreeMap<QuestionId, AnswerValue>,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub scores: ScoreSummary,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub value: AnswerValue,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub stage: Stage,
}

#[derive(Debug, Deserialize)]
pub struct IdeaRequest {
    pub target_indicator: IndicatorId,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub recipient: String,
}

pub(crate) async fn catalog_handler<S>(State(session): State<SharedSession<S>>) -> Response
where
    S: AssessmentStore + 'static,
{
    let session = session.lock().await;
    let questions: Vec<Question> = session.catalog().questions().to_vec();
    (StatusCode::OK, Json(questions)).into_response()
}

/// Stateless scoring of a posted answer map against the session catalog.
pub(crate) async fn score_handler<S>(
    State(session): State<SharedSession<S>>,
    Json(request): Json<ScoreRequest>,
) -> Response
where
    S: AssessmentStore + 'static,
{
    let session = session.lock().await;
    let catalog = session.catalog();

    let mut responses = ResponseStore::new();
    for (question_id, value) in request.answers {
        if let Err(error) = responses.record(catalog, question_id, value) {
            return response_error(&error);
        }
    }

    let scores = compute_scores(catalog, &responses);
    let body = ScoreResponse {
        scores: scores.summary(),
        recommendations: report::recommendations(catalog, &responses),
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub(crate) async fn snapshot_handler<S>(State(session): State<SharedSession<S>>) -> Response
where
    S: AssessmentStore + 'static,
{
    let session = session.lock().await;
    (StatusCode::OK, Json(session.snapshot())).into_response()
}

pub(crate) async fn answer_handler<S>(
    State(session): State<SharedSession<S>>,
    Path(question_id): Path<u32>,
    Json(request): Json<AnswerRequest>,
) -> Response
where
    S: AssessmentStore + 'static,
{
    let mut session = session.lock().await;
    match session.select_answer(QuestionId(question_id), request.value) {
        Ok(scores) => (StatusCode::OK, Json(scores.summary())).into_response(),
        Err(error) => session_error(error),
    }
}

pub(crate) async fn clear_answer_handler<S>(
    State(session): State<SharedSession<S>>,
    Path(question_id): Path<u32>,
) -> Response
where
    S: AssessmentStore + 'static,
{
    let mut session = session.lock().await;
    match session.clear_answer(QuestionId(question_id)) {
        Ok(scores) => (StatusCode::OK, Json(scores.summary())).into_response(),
        Err(error) => session_error(error),
    }
}

pub(crate) async fn identity_handler<S>(
    State(session): State<SharedSession<S>>,
    Json(identity): Json<IdentityRecord>,
) -> Response
where
    S: AssessmentStore + 'static,
{
    let mut session = session.lock().await;
    let notice = session.update_identity(identity);
    let payload = json!({
        "snapshot": session.snapshot(),
        "notice": notice.map(|notice| notice.to_string()),
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn navigate_handler<S>(
    State(session): State<SharedSession<S>>,
    Json(request): Json<NavigateRequest>,
) -> Response
where
    S: AssessmentStore + 'static,
{
    let mut session = session.lock().await;
    match session.navigate(request.stage) {
        Ok(stage) => {
            let payload = json!({
                "stage": stage,
                "reachable_stages": session.reachable_stages(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(notice) => {
            let current = session.stage();
            gate_refusal(&notice, current)
        }
    }
}

pub(crate) async fn idea_handler<S>(
    State(session): State<SharedSession<S>>,
    Json(request): Json<IdeaRequest>,
) -> Response
where
    S: AssessmentStore + 'static,
{
    let mut session = session.lock().await;
    match session.submit_idea(request.target_indicator, &request.text, Utc::now()) {
        Ok(idea) => (StatusCode::CREATED, Json(idea)).into_response(),
        Err(error) => session_error(error),
    }
}

pub(crate) async fn priorities_handler<S>(State(session): State<SharedSession<S>>) -> Response
where
    S: AssessmentStore + 'static,
{
    let session = session.lock().await;
    (StatusCode::OK, Json(session.priorities())).into_response()
}

pub(crate) async fn summary_handler<S>(State(session): State<SharedSession<S>>) -> Response
where
    S: AssessmentStore + 'static,
{
    let session = session.lock().await;
    let payload = json!({
        "text": session.summary_text(),
        "scores": session.summary(),
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn share_handler<S>(
    State(session): State<SharedSession<S>>,
    Json(request): Json<ShareRequest>,
) -> Response
where
    S: AssessmentStore + 'static,
{
    let session = session.lock().await;
    (StatusCode::OK, Json(session.share_draft(&request.recipient))).into_response()
}

pub(crate) async fn export_handler<S>(State(session): State<SharedSession<S>>) -> Response
where
    S: AssessmentStore + 'static,
{
    let session = session.lock().await;
    let mut buffer = Vec::new();
    match report::write_scores_csv(session.scores(), &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            buffer,
        )
            .into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn reset_handler<S>(State(session): State<SharedSession<S>>) -> Response
where
    S: AssessmentStore + 'static,
{
    let mut session = session.lock().await;
    session.reset();
    (StatusCode::OK, Json(session.snapshot())).into_response()
}

fn session_error(error: SessionError) -> Response {
    match error {
        SessionError::Gate(notice) => {
            let payload = json!({
                "error": notice.to_string(),
                "notice": notice,
            });
            (StatusCode::FORBIDDEN, Json(payload)).into_response()
        }
        SessionError::Response(error) => response_error(&error),
        SessionError::Idea(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
    }
}

fn response_error(error: &ResponseError) -> Response {
    let status = match error {
        ResponseError::UnknownQuestion(_) => StatusCode::NOT_FOUND,
        ResponseError::InvalidOption { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

fn gate_refusal(notice: &GateNotice, current: Stage) -> Response {
    let payload = json!({
        "error": notice.to_string(),
        "notice": notice,
        "stage": current,
    });
    (StatusCode::FORBIDDEN, Json(payload)).into_response()
}
