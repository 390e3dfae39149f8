//! Task API handlers
//!
//! Bodies are parsed by hand rather than through `Json<T>` so that malformed
//! input always maps to a 400 with the shared [`ErrorBody`] shape: a fixed
//! message for broken JSON, serde's description for mistyped fields.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::error::Category;
use taskrank_core::api::{
    self, AnalyzeRequest, AnalyzeResponse, ErrorBody, GraphRequest, GraphResponse,
    SuggestResponse, TaskDraft,
};
use taskrank_core::feedback::{self, FeedbackReport, FeedbackSubmission};
use taskrank_core::{CoreError, Strategy, ValidationError};
use tracing::{error, info, warn};

use super::AppState;

pub type ApiError = (StatusCode, Json<ErrorBody>);

const INVALID_JSON: &str = "Invalid JSON in request body";

fn bad_request(body: ErrorBody) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(body))
}

fn validation_failed(err: ValidationError) -> ApiError {
    warn!("Rejected request: {}", err);
    bad_request(ErrorBody::new(err.to_string()))
}

/// Client-facing message for a body that failed to deserialize.
///
/// Syntax errors get a fixed message; well-formed JSON with a mistyped or
/// missing field reports serde's description, which names the position.
fn json_error_message(err: &serde_json::Error) -> String {
    match err.classify() {
        Category::Data => format!("Invalid field in request body: {err}"),
        Category::Syntax | Category::Eof | Category::Io => INVALID_JSON.to_string(),
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!("Malformed request body: {}", e);
        bad_request(ErrorBody::new(json_error_message(&e)))
    })
}

fn parse_batch(body: &[u8]) -> Result<AnalyzeRequest, String> {
    api::parse_batch(body).map_err(|e| match e {
        CoreError::Json(inner) => {
            warn!("Malformed request body: {}", inner);
            json_error_message(&inner)
        }
        other => other.to_string(),
    })
}

/// Score and rank a batch
///
/// POST /api/tasks/analyze/
pub async fn analyze_tasks(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let request = parse_batch(&body).map_err(|e| bad_request(ErrorBody::new(e)))?;
    api::analyze(request, state.today(), state.default_strategy)
        .map(Json)
        .map_err(validation_failed)
}

/// Top suggestions from a JSON body
///
/// POST /api/tasks/suggest/
pub async fn suggest_tasks(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SuggestResponse>, ApiError> {
    let request = parse_batch(&body).map_err(|e| bad_request(ErrorBody::for_suggest(e)))?;
    run_suggest(&state, request)
}

#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    pub strategy: Option<String>,
    /// JSON-encoded task array
    pub tasks: Option<String>,
}

/// Top suggestions from query parameters
///
/// GET /api/tasks/suggest/?strategy=..&tasks=[..]
pub async fn suggest_tasks_query(
    State(state): State<AppState>,
    Query(query): Query<SuggestQuery>,
) -> Result<Json<SuggestResponse>, ApiError> {
    let tasks: Vec<TaskDraft> = match query.tasks.as_deref() {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw).map_err(|e| {
            let message = match e.classify() {
                Category::Data => format!("Invalid field in tasks parameter: {e}"),
                _ => "Invalid JSON in tasks parameter".to_string(),
            };
            bad_request(ErrorBody::for_suggest(message))
        })?,
        _ => Vec::new(),
    };
    run_suggest(
        &state,
        AnalyzeRequest {
            tasks,
            strategy: query.strategy,
        },
    )
}

fn run_suggest(state: &AppState, request: AnalyzeRequest) -> Result<Json<SuggestResponse>, ApiError> {
    api::suggest(
        request,
        state.today(),
        state.default_strategy,
        state.suggest_count,
    )
    .map(Json)
    .map_err(|e| bad_request(ErrorBody::for_suggest(e.to_string())))
}

/// Dependency graph of a batch
///
/// POST /api/tasks/graph/
pub async fn dependency_graph(body: Bytes) -> Result<Json<GraphResponse>, ApiError> {
    let tasks = parse_batch(&body)
        .map_err(|e| bad_request(ErrorBody::new(e)))?
        .tasks;
    Ok(Json(api::dependency_graph(GraphRequest { tasks })))
}

/// Record feedback on a scored task
///
/// POST /api/tasks/feedback/
pub async fn submit_feedback(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let submission: FeedbackSubmission = parse_body(&body)?;
    let record = submission
        .into_record(Utc::now())
        .map_err(validation_failed)?;
    info!(
        "Feedback received: task={} strategy={} helpful={}",
        record.task_id, record.strategy, record.was_helpful
    );

    state.feedback.record(record).map_err(|e| {
        error!("Feedback store failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new(e.to_string())))
    })?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "status": "recorded" })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub strategy: Option<String>,
}

/// Feedback statistics and suggested weights
///
/// GET /api/tasks/feedback/stats/?strategy=..
pub async fn feedback_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<FeedbackReport>, ApiError> {
    let strategy = match query.strategy.as_deref() {
        Some(name) => name.parse::<Strategy>().map_err(validation_failed)?,
        None => state.default_strategy,
    };
    feedback::report(state.feedback.as_ref(), strategy)
        .map(Json)
        .map_err(|e| {
            error!("Feedback stats failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new(e.to_string())))
        })
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
