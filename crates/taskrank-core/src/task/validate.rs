//! Batch validation for tasks.

use std::collections::HashMap;

use super::{Task, IMPORTANCE_RANGE};
use crate::error::{TaskIssue, ValidationError};

/// Check every task in the batch and report all problems at once.
///
/// A batch is rejected as a whole: callers never receive partial results.
pub fn validate_batch(tasks: &[Task]) -> Result<(), ValidationError> {
    let mut issues = Vec::new();
    let mut seen: HashMap<i64, usize> = HashMap::with_capacity(tasks.len());

    for (index, task) in tasks.iter().enumerate() {
        issues.extend(validate_task(index, task));

        if let Some(first) = seen.insert(task.id, index) {
            issues.push(TaskIssue::new(
                index,
                Some(task.id),
                "id",
                format!("duplicate id {} (first used by task #{})", task.id, first),
            ));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::InvalidTasks(issues))
    }
}

/// Field checks for a single task.
pub(crate) fn validate_task(index: usize, task: &Task) -> Vec<TaskIssue> {
    let mut issues = Vec::new();
    let id = Some(task.id);

    if task.title.trim().is_empty() {
        issues.push(TaskIssue::new(index, id, "title", "title must not be empty"));
    }

    if let Some(importance) = task.importance {
        if !IMPORTANCE_RANGE.contains(&importance) {
            issues.push(TaskIssue::new(
                index,
                id,
                "importance",
                format!("importance must be between 1 and 10, got {importance}"),
            ));
        }
    }

    if let Some(hours) = task.estimated_hours {
        if !hours.is_finite() {
            issues.push(TaskIssue::new(
                index,
                id,
                "estimated_hours",
                "estimated hours must be a finite number",
            ));
        } else if hours < 0.0 {
            issues.push(TaskIssue::new(
                index,
                id,
                "estimated_hours",
                format!("estimated hours must be non-negative, got {hours}"),
            ));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_batch_passes() {
        let tasks = vec![
            Task::new(1, "A").with_importance(10).with_hours(0.0),
            Task::new(2, "B").with_importance(1).with_dependencies([1, 99]),
        ];
        assert!(validate_batch(&tasks).is_ok());
    }

    #[test]
    fn empty_batch_passes() {
        assert!(validate_batch(&[]).is_ok());
    }

    #[test]
    fn empty_and_blank_titles_fail() {
        let tasks = vec![Task::new(1, ""), Task::new(2, "   ")];
        let err = validate_batch(&tasks).unwrap_err();
        let issues = err.issues();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.field == "title"));
    }

    #[test]
    fn importance_out_of_range_fails() {
        for bad in [0, 11, -3] {
            let err = validate_batch(&[Task::new(1, "A").with_importance(bad)]).unwrap_err();
            assert_eq!(err.issues()[0].field, "importance");
        }
    }

    #[test]
    fn negative_or_nan_hours_fail() {
        let err = validate_batch(&[Task::new(1, "A").with_hours(-5.0)]).unwrap_err();
        assert_eq!(err.issues()[0].field, "estimated_hours");
        let err = validate_batch(&[Task::new(1, "A").with_hours(f64::NAN)]).unwrap_err();
        assert!(err.issues()[0].message.contains("finite"));
    }

    #[test]
    fn duplicate_ids_fail() {
        let err = validate_batch(&[Task::new(4, "A"), Task::new(4, "B")]).unwrap_err();
        let issue = &err.issues()[0];
        assert_eq!(issue.index, 1);
        assert_eq!(issue.field, "id");
    }

    #[test]
    fn all_issues_are_aggregated() {
        let tasks = vec![
            Task::new(1, "").with_importance(12),
            Task::new(2, "ok"),
            Task::new(3, "B").with_hours(-1.0),
        ];
        let err = validate_batch(&tasks).unwrap_err();
        assert_eq!(err.issues().len(), 3);
    }
}
