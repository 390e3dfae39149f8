//! JSON request/response shapes and the request-handling flow.
//!
//! Both front ends (CLI and HTTP server) go through these functions so the
//! wire format stays identical:
//!
//! - analyze: `{tasks, strategy?}` -> `{tasks, strategy, count, warning?}`
//! - suggest: `{tasks, strategy?}` -> `{suggestions, strategy, count}`
//! - graph: `{tasks}` -> `{graph, has_circular, cycle}`
//!
//! Drafts may omit `id`; missing ids are filled in per request by
//! [`assign_ids`]. Nothing here keeps state between calls.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TaskIssue, ValidationError};
use crate::graph::{self, DependencyGraph};
use crate::scoring::{ScoringEngine, Strategy};
use crate::task::{validate_batch, ScoredTask, Task};

/// Suffix added to explanations of tasks that sit on a dependency cycle.
pub const CIRCULAR_WARNING_SUFFIX: &str = " [WARNING: part of circular dependency]";

/// Task as submitted by a client: id optional, due date still a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub importance: Option<i64>,
    #[serde(default)]
    pub dependencies: Vec<i64>,
}

impl TaskDraft {
    /// Convert into a [`Task`] with the given id, reporting an unparseable
    /// due date as an issue.
    fn into_task(self, index: usize, id: i64) -> (Task, Option<TaskIssue>) {
        let mut issue = None;
        let due_date = match self.due_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    issue = Some(TaskIssue::new(
                        index,
                        Some(id),
                        "due_date",
                        format!("invalid date format: {raw}. Expected YYYY-MM-DD"),
                    ));
                    None
                }
            },
        };

        let task = Task {
            id,
            title: self.title.unwrap_or_default(),
            due_date,
            estimated_hours: self.estimated_hours,
            importance: self.importance,
            dependencies: self.dependencies,
        };
        (task, issue)
    }
}

/// Fill in missing ids.
///
/// Drafts without an id receive consecutive integers above the largest
/// supplied id, in input order; with no supplied ids numbering starts at 1.
/// Once the top of the id space is used up, the lowest unused positive ids
/// are handed out instead.
pub fn assign_ids(drafts: &[TaskDraft]) -> Vec<i64> {
    let supplied: HashSet<i64> = drafts.iter().filter_map(|d| d.id).collect();
    let mut above = supplied.iter().max().map_or(Some(1), |max| max.checked_add(1));
    let mut gap: i64 = 1;

    drafts
        .iter()
        .map(|draft| {
            draft.id.unwrap_or_else(|| {
                if let Some(id) = above {
                    above = id.checked_add(1);
                    return id;
                }
                while supplied.contains(&gap) {
                    gap += 1;
                }
                gap += 1;
                gap - 1
            })
        })
        .collect()
}

/// Turn drafts into validated tasks, aggregating every problem found.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTasks`] when any draft has a bad date,
/// a missing or empty title, out-of-range values, or a duplicate id.
pub fn build_tasks(drafts: Vec<TaskDraft>) -> Result<Vec<Task>, ValidationError> {
    let ids = assign_ids(&drafts);
    let mut issues = Vec::new();
    let tasks: Vec<Task> = drafts
        .into_iter()
        .zip(ids)
        .enumerate()
        .map(|(index, (draft, id))| {
            let (task, issue) = draft.into_task(index, id);
            issues.extend(issue);
            task
        })
        .collect();

    if let Err(err) = validate_batch(&tasks) {
        issues.extend(err.issues().iter().cloned());
    }

    if issues.is_empty() {
        Ok(tasks)
    } else {
        issues.sort_by_key(|issue| issue.index);
        Err(ValidationError::InvalidTasks(issues))
    }
}

/// Turn drafts into tasks for graph analysis only.
///
/// Graph requests need ids and dependencies, nothing else, so no field is
/// validated. Missing titles become `"Task <id>"`.
pub fn build_graph_tasks(drafts: Vec<TaskDraft>) -> Vec<Task> {
    let ids = assign_ids(&drafts);
    drafts
        .into_iter()
        .zip(ids)
        .enumerate()
        .map(|(index, (mut draft, id))| {
            if draft.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
                draft.title = Some(format!("Task {id}"));
            }
            draft.into_task(index, id).0
        })
        .collect()
}

/// Body of analyze and suggest requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub tasks: Vec<TaskDraft>,
    #[serde(default)]
    pub strategy: Option<String>,
}

/// Parse a request body that is either `{tasks, strategy?}` or a bare task
/// array.
///
/// The shape is picked from the first non-blank byte so that a type error
/// inside a task reports its own position rather than a generic mismatch.
///
/// # Errors
///
/// Returns [`CoreError::Json`](crate::error::CoreError::Json) for malformed JSON or mistyped fields.
pub fn parse_batch(body: &[u8]) -> Result<AnalyzeRequest> {
    let first = body.iter().find(|b| !b.is_ascii_whitespace());
    let request = if first == Some(&b'[') {
        AnalyzeRequest {
            tasks: serde_json::from_slice(body)?,
            strategy: None,
        }
    } else {
        serde_json::from_slice(body)?
    };
    Ok(request)
}

/// Resolve a requested strategy name.
///
/// An unrecognised name falls back to [`Strategy::default`] with a warning;
/// no name at all means `default_strategy`.
pub fn resolve_strategy(requested: Option<&str>, default_strategy: Strategy) -> Strategy {
    match requested {
        Some(name) => name.parse().unwrap_or_else(|err| {
            warn!(requested = name, "{err}; using {}", Strategy::default());
            Strategy::default()
        }),
        None => default_strategy,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub tasks: Vec<ScoredTask>,
    pub strategy: Strategy,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub suggestions: Vec<ScoredTask>,
    pub strategy: Strategy,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphRequest {
    #[serde(default)]
    pub tasks: Vec<TaskDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphResponse {
    pub graph: DependencyGraph,
    pub has_circular: bool,
    pub cycle: Vec<i64>,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<ScoredTask>>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            suggestions: None,
        }
    }

    /// Error body for suggest requests, which also carry an empty list.
    pub fn for_suggest(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            suggestions: Some(Vec::new()),
        }
    }
}

/// Warning text attached to analyze responses when a cycle exists.
pub fn circular_warning(cycle: &[i64]) -> String {
    format!("Warning: Circular dependency detected involving tasks: {cycle:?}")
}

/// Score a batch and annotate tasks on dependency cycles.
///
/// `default_strategy` applies when the request names none; an unknown name
/// falls back to `smart_balance`.
pub fn analyze(
    request: AnalyzeRequest,
    today: NaiveDate,
    default_strategy: Strategy,
) -> Result<AnalyzeResponse, ValidationError> {
    let strategy = resolve_strategy(request.strategy.as_deref(), default_strategy);
    let tasks = build_tasks(request.tasks)?;
    info!(count = tasks.len(), strategy = %strategy, "analyzing tasks");

    let graph = graph::analyze(&tasks);
    let mut scored = ScoringEngine::new(today).score(&tasks, strategy)?;

    let warning = if graph.has_circular() {
        warn!(cycle = ?graph.cycle, "circular dependency detected");
        for entry in scored.iter_mut().filter(|s| graph.is_circular(s.task.id)) {
            entry.explanation.push_str(CIRCULAR_WARNING_SUFFIX);
        }
        Some(circular_warning(&graph.cycle))
    } else {
        None
    };

    Ok(AnalyzeResponse {
        count: scored.len(),
        tasks: scored,
        strategy,
        warning,
    })
}

/// The top `count` tasks of [`analyze`].
///
/// # Errors
///
/// Besides validation failures, an empty batch is rejected with
/// [`ValidationError::NoTasks`].
pub fn suggest(
    request: AnalyzeRequest,
    today: NaiveDate,
    default_strategy: Strategy,
    count: usize,
) -> Result<SuggestResponse, ValidationError> {
    if request.tasks.is_empty() {
        return Err(ValidationError::NoTasks);
    }
    let analyzed = analyze(request, today, default_strategy)?;
    let mut suggestions = analyzed.tasks;
    suggestions.truncate(count);
    Ok(SuggestResponse {
        count: suggestions.len(),
        suggestions,
        strategy: analyzed.strategy,
    })
}

/// Build the dependency graph response for a batch.
pub fn dependency_graph(request: GraphRequest) -> GraphResponse {
    let tasks = build_graph_tasks(request.tasks);
    let graph = graph::analyze(&tasks);
    if graph.has_circular() {
        warn!(cycle = ?graph.cycle, "circular dependency detected");
    }
    GraphResponse {
        has_circular: graph.has_circular(),
        cycle: graph.cycle.clone(),
        graph,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 28).unwrap()
    }

    fn drafts(value: serde_json::Value) -> Vec<TaskDraft> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn assign_ids_continues_after_largest_supplied_id() {
        let d = drafts(json!([{"title": "a"}, {"id": 7, "title": "b"}, {"title": "c"}]));
        assert_eq!(assign_ids(&d), vec![8, 7, 9]);
        let d = drafts(json!([{"title": "a"}, {"title": "b"}]));
        assert_eq!(assign_ids(&d), vec![1, 2]);
    }

    #[test]
    fn build_tasks_reports_bad_dates_and_fields_together() {
        let d = drafts(json!([
            {"title": "a", "due_date": "2025-13-40"},
            {"importance": 5},
            {"title": "ok", "due_date": "2025-12-01"}
        ]));
        let err = build_tasks(d).unwrap_err();
        let fields: Vec<&str> = err.issues().iter().map(|i| i.field).collect();
        assert_eq!(fields, vec!["due_date", "title"]);
    }

    #[test]
    fn null_or_blank_due_date_means_none() {
        let d = drafts(json!([{"title": "a", "due_date": null}, {"title": "b", "due_date": ""}]));
        let tasks = build_tasks(d).unwrap();
        assert!(tasks.iter().all(|t| t.due_date.is_none()));
    }

    #[test]
    fn analyze_echoes_strategy_and_count() {
        let request = AnalyzeRequest {
            tasks: drafts(json!([{"id": 1, "title": "A"}, {"id": 2, "title": "B"}])),
            strategy: Some("high_impact".into()),
        };
        let response = analyze(request, today(), Strategy::SmartBalance).unwrap();
        assert_eq!(response.strategy, Strategy::HighImpact);
        assert_eq!(response.count, 2);
        assert!(response.warning.is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["strategy"], "high_impact");
        assert!(json.get("warning").is_none());
    }

    #[test]
    fn analyze_falls_back_to_smart_balance_for_unknown_strategy() {
        let request = AnalyzeRequest {
            tasks: drafts(json!([{"id": 1, "title": "A", "importance": 8}])),
            strategy: Some("invalid_strategy".into()),
        };
        let response = analyze(request, today(), Strategy::HighImpact).unwrap();
        assert_eq!(response.strategy, Strategy::SmartBalance);
        assert!(response.tasks[0].explanation.starts_with("Smart Balance:"));
    }

    #[test]
    fn resolve_strategy_prefers_request_then_default() {
        assert_eq!(resolve_strategy(Some("fastest_wins"), Strategy::HighImpact), Strategy::FastestWins);
        assert_eq!(resolve_strategy(None, Strategy::HighImpact), Strategy::HighImpact);
        assert_eq!(resolve_strategy(Some("coin_flip"), Strategy::HighImpact), Strategy::SmartBalance);
    }

    #[test]
    fn analyze_warns_and_annotates_on_cycle() {
        let request = AnalyzeRequest {
            tasks: drafts(json!([
                {"id": 1, "title": "A", "dependencies": [2]},
                {"id": 2, "title": "B", "dependencies": [1]},
                {"id": 3, "title": "C"}
            ])),
            strategy: None,
        };
        let response = analyze(request, today(), Strategy::SmartBalance).unwrap();
        assert_eq!(
            response.warning.as_deref(),
            Some("Warning: Circular dependency detected involving tasks: [1, 2, 1]")
        );
        for scored in &response.tasks {
            let flagged = scored.explanation.ends_with(CIRCULAR_WARNING_SUFFIX);
            assert_eq!(flagged, scored.task.id != 3);
        }
    }

    #[test]
    fn suggest_limits_and_rejects_empty() {
        let request = AnalyzeRequest {
            tasks: drafts(json!([
                {"title": "a", "importance": 1},
                {"title": "b", "importance": 9},
                {"title": "c", "importance": 5},
                {"title": "d", "importance": 7}
            ])),
            strategy: Some("high_impact".into()),
        };
        let response = suggest(request, today(), Strategy::SmartBalance, 3).unwrap();
        assert_eq!(response.count, 3);
        let titles: Vec<&str> = response.suggestions.iter().map(|s| s.task.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "d", "c"]);

        let err = suggest(AnalyzeRequest::default(), today(), Strategy::SmartBalance, 3).unwrap_err();
        assert_eq!(err, ValidationError::NoTasks);
    }

    #[test]
    fn graph_request_needs_no_titles() {
        let request = GraphRequest {
            tasks: drafts(json!([{"id": 1, "dependencies": [2]}, {"id": 2, "dependencies": [1]}])),
        };
        let response = dependency_graph(request);
        assert!(response.has_circular);
        assert_eq!(response.cycle, vec![1, 2, 1]);
        assert_eq!(response.graph.circular_nodes, vec![1, 2]);
        assert_eq!(response.graph.nodes[0].title, "Task 1");
    }

    #[test]
    fn parse_batch_accepts_bare_array_and_wrapped_request() {
        let bare = parse_batch(br#" [{"title": "a"}]"#).unwrap();
        assert_eq!(bare.tasks.len(), 1);
        assert!(bare.strategy.is_none());

        let wrapped = parse_batch(br#"{"tasks": [{"title": "a"}], "strategy": "fastest_wins"}"#).unwrap();
        assert_eq!(wrapped.tasks.len(), 1);
        assert_eq!(wrapped.strategy.as_deref(), Some("fastest_wins"));
    }

    #[test]
    fn parse_batch_reports_mistyped_field_position() {
        let err = parse_batch(br#"{"tasks": [{"id": 1, "title": "A", "importance": "high"}]}"#).unwrap_err();
        let CoreError::Json(inner) = &err else {
            panic!("expected a JSON error, got {err:?}");
        };
        assert!(inner.is_data());
        assert!(inner.to_string().contains("invalid type: string \"high\""));
        assert!(inner.column() > 0);

        let err = parse_batch(b"{oops").unwrap_err();
        assert!(matches!(err, CoreError::Json(ref e) if e.is_syntax()));
    }

    #[test]
    fn missing_ids_fill_gaps_when_top_id_is_taken() {
        let d = drafts(json!([
            {"id": i64::MAX, "title": "a"},
            {"title": "b"},
            {"id": 1, "title": "c"},
            {"title": "d"}
        ]));
        assert_eq!(assign_ids(&d), vec![i64::MAX, 2, 1, 3]);
        assert!(build_tasks(d).is_ok());
    }

    #[test]
    fn error_body_shapes() {
        let json = serde_json::to_value(ErrorBody::new("bad")).unwrap();
        assert_eq!(json, json!({"error": "bad"}));
        let json = serde_json::to_value(ErrorBody::for_suggest("none")).unwrap();
        assert_eq!(json, json!({"error": "none", "suggestions": []}));
    }
}
