//! JSON-over-HTTP front end.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use taskrank_core::{Config, FeedbackSink, MemoryFeedbackSink, Strategy};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub mod handlers;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub feedback: Arc<dyn FeedbackSink>,
    pub default_strategy: Strategy,
    pub suggest_count: usize,
    /// Fixed scoring date; the local date when unset
    pub fixed_today: Option<NaiveDate>,
}

impl AppState {
    pub fn from_config(config: &Config, fixed_today: Option<NaiveDate>) -> Self {
        Self {
            feedback: Arc::new(MemoryFeedbackSink::new()),
            default_strategy: config.scoring.default_strategy,
            suggest_count: config.scoring.suggest_count,
            fixed_today,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.fixed_today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Build the application router.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/api/tasks/analyze/", post(handlers::analyze_tasks))
        .route(
            "/api/tasks/suggest/",
            get(handlers::suggest_tasks_query).post(handlers::suggest_tasks),
        )
        .route("/api/tasks/graph/", post(handlers::dependency_graph))
        .route("/api/tasks/feedback/", post(handlers::submit_feedback))
        .route("/api/tasks/feedback/stats/", get(handlers::feedback_stats))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
