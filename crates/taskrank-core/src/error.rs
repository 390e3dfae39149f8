//! Core error types for taskrank-core.
//!
//! This module defines the error hierarchy using thiserror. Validation
//! failures are aggregated per batch so that a caller sees every problem in
//! one response instead of fixing tasks one at a time.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for taskrank-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Feedback sink errors
    #[error("Feedback error: {0}")]
    Feedback(#[from] FeedbackError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Home/config directory could not be resolved or created
    #[error("Configuration directory unavailable: {0}")]
    DirUnavailable(String),
}

/// One problem found while validating a task batch.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TaskIssue {
    /// Position of the task in the submitted batch
    pub index: usize,
    /// Task id, when one was supplied
    pub task_id: Option<i64>,
    /// Offending field name
    pub field: &'static str,
    pub message: String,
}

impl TaskIssue {
    pub fn new(
        index: usize,
        task_id: Option<i64>,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            index,
            task_id,
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for TaskIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.task_id {
            Some(id) => write!(f, "task #{} (id {}): {}", self.index, id, self.message),
            None => write!(f, "task #{}: {}", self.index, self.message),
        }
    }
}

fn join_issues(issues: &[TaskIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// One or more tasks in a batch failed validation
    #[error("{} invalid task field(s): {}", .0.len(), join_issues(.0))]
    InvalidTasks(Vec<TaskIssue>),

    /// Strategy name outside the closed set
    #[error("Unknown strategy '{0}'. Expected one of: smart_balance, fastest_wins, high_impact, deadline_driven")]
    UnknownStrategy(String),

    /// A request that needs at least one task carried none
    #[error("No tasks provided. Please provide tasks in the request.")]
    NoTasks,

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    /// Issues attached to a batch failure, empty for the other variants.
    pub fn issues(&self) -> &[TaskIssue] {
        match self {
            ValidationError::InvalidTasks(issues) => issues,
            _ => &[],
        }
    }
}

/// Feedback sink errors.
#[derive(Error, Debug)]
pub enum FeedbackError {
    /// The sink could not accept the write
    #[error("Feedback sink unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_tasks_message_lists_every_issue() {
        let err = ValidationError::InvalidTasks(vec![
            TaskIssue::new(0, None, "title", "title must not be empty"),
            TaskIssue::new(2, Some(7), "importance", "importance must be between 1 and 10, got 11"),
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("2 invalid task field(s)"));
        assert!(msg.contains("task #0: title must not be empty"));
        assert!(msg.contains("task #2 (id 7): importance must be between 1 and 10, got 11"));
        assert_eq!(err.issues().len(), 2);
    }

    #[test]
    fn json_errors_convert_into_core_error() {
        let err: CoreError = serde_json::from_str::<u32>("\"x\"").unwrap_err().into();
        assert!(matches!(err, CoreError::Json(_)));
        assert!(err.to_string().starts_with("JSON error: invalid type"));
    }
}
