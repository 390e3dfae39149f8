//! # taskrank Core Library
//!
//! Scores and ranks a batch of tasks by one of several heuristic strategies,
//! and checks the batch's dependency graph for cycles. Every call is a pure
//! function of its input plus the caller-supplied "today" date; nothing is
//! persisted.
//!
//! ## Architecture
//!
//! - **Task model**: [`Task`] records and batch validation
//! - **Scoring**: [`ScoringEngine`] with four [`Strategy`] variants
//! - **Graph**: [`graph::analyze`] builds nodes/edges and finds cycles
//! - **API**: JSON request/response shapes shared by the CLI and HTTP server
//! - **Feedback**: [`FeedbackSink`] abstraction and feedback statistics
//! - **Config**: TOML configuration under `~/.config/taskrank/`

pub mod api;
pub mod config;
pub mod error;
pub mod feedback;
pub mod graph;
pub mod scoring;
pub mod task;

pub use config::Config;
pub use error::{ConfigError, CoreError, FeedbackError, Result, TaskIssue, ValidationError};
pub use feedback::{FeedbackRecord, FeedbackSink, FeedbackStats, MemoryFeedbackSink};
pub use graph::{DependencyGraph, GraphEdge, GraphNode};
pub use scoring::{urgency_score, ScoringEngine, Strategy};
pub use task::{ScoredTask, Task};
