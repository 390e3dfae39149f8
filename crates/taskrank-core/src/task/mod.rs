//! Task model for scoring batches.
//!
//! A [`Task`] is the fully-formed record the scoring engine and the graph
//! analyzer work on: its id is already assigned and its due date is already a
//! calendar date. Wire-level drafts with optional ids and raw date strings live
//! in [`crate::api`].

pub mod validate;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use validate::validate_batch;

/// Effort assumed when `estimated_hours` is absent.
pub const DEFAULT_ESTIMATED_HOURS: f64 = 8.0;
/// Importance assumed when `importance` is absent.
pub const DEFAULT_IMPORTANCE: i64 = 5;
/// Accepted importance range (inclusive).
pub const IMPORTANCE_RANGE: std::ops::RangeInclusive<i64> = 1..=10;

/// One task inside an analysis batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier, unique within the batch
    pub id: i64,
    /// Task title (must be non-empty)
    #[serde(default)]
    pub title: String,
    /// Calendar due date
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Estimated effort in hours (defaults to 8)
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    /// Importance rating 1-10 (defaults to 5)
    #[serde(default)]
    pub importance: Option<i64>,
    /// Ids of tasks this task depends on
    #[serde(default)]
    pub dependencies: Vec<i64>,
}

impl Task {
    /// Create a task with defaults for every optional field.
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            due_date: None,
            estimated_hours: None,
            importance: None,
            dependencies: Vec::new(),
        }
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    pub fn with_importance(mut self, importance: i64) -> Self {
        self.importance = Some(importance);
        self
    }

    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = i64>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    /// Estimated hours with the default applied.
    pub fn hours(&self) -> f64 {
        self.estimated_hours.unwrap_or(DEFAULT_ESTIMATED_HOURS)
    }

    /// Importance with the default applied.
    pub fn importance_or_default(&self) -> i64 {
        self.importance.unwrap_or(DEFAULT_IMPORTANCE)
    }

    /// Whole days from `today` until the due date (negative when overdue).
    pub fn days_until_due(&self, today: NaiveDate) -> Option<i64> {
        self.due_date.map(|due| (due - today).num_days())
    }

    /// Whether this task lists `id` among its dependencies.
    pub fn depends_on(&self, id: i64) -> bool {
        self.dependencies.contains(&id)
    }
}

/// A task together with its computed priority.
///
/// Serializes flat: the task fields followed by `priority_score` and
/// `explanation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTask {
    #[serde(flatten)]
    pub task: Task,
    /// Score rounded to two decimals
    pub priority_score: f64,
    pub explanation: String,
}
