//! Task priority scoring engine.
//!
//! Each strategy blends the same few signals into one number:
//!
//! - **Urgency**: due-date pressure on a 15..200 scale (see [`urgency_score`])
//! - **Importance**: the user's 1-10 rating
//! - **Effort**: estimated hours, inverted so that small tasks score higher
//! - **Dependencies**: how many other tasks in the batch are waiting on this one
//!
//! | Strategy | Formula |
//! |----------|---------|
//! | `smart_balance` | `urgency*uw + importance*10*iw + 50/(h+1)*ew + blocked*20` (weights by due band) |
//! | `fastest_wins` | `100/(h+1) + urgency*0.3 + importance*2` |
//! | `high_impact` | `importance*20 + blocked*15 + urgency*0.4` |
//! | `deadline_driven` | `urgency*2 + importance*3 + (20 - h)` |
//!
//! Scores are explained by listing their terms; the term with the largest
//! contribution is named as the dominant factor.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationError;
use crate::task::{validate_batch, ScoredTask, Task};

/// Urgency used when a task has no due date.
pub const NO_DUE_DATE_URGENCY: f64 = 30.0;
/// Ceiling for overdue urgency.
pub const MAX_URGENCY: f64 = 200.0;
/// Hours at or below which a task counts as a quick win in explanations.
const QUICK_WIN_HOURS: f64 = 2.0;

/// Named scoring strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Balance urgency, importance, effort and blocking (default)
    #[default]
    SmartBalance,
    /// Prefer low-effort tasks
    FastestWins,
    /// Prefer important tasks and tasks that unblock others
    HighImpact,
    /// Prefer tasks with the nearest deadline
    DeadlineDriven,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::SmartBalance,
        Strategy::FastestWins,
        Strategy::HighImpact,
        Strategy::DeadlineDriven,
    ];

    /// Wire name (`smart_balance`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::SmartBalance => "smart_balance",
            Strategy::FastestWins => "fastest_wins",
            Strategy::HighImpact => "high_impact",
            Strategy::DeadlineDriven => "deadline_driven",
        }
    }

    /// Human-readable label used as the explanation prefix.
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::SmartBalance => "Smart Balance",
            Strategy::FastestWins => "Fastest Wins",
            Strategy::HighImpact => "High Impact",
            Strategy::DeadlineDriven => "Deadline Driven",
        }
    }

    /// Points added per task blocked by the scored task.
    pub fn per_block_bonus(&self) -> f64 {
        match self {
            Strategy::SmartBalance => 20.0,
            Strategy::HighImpact => 15.0,
            Strategy::FastestWins | Strategy::DeadlineDriven => 0.0,
        }
    }

    /// Parse an optional wire name, falling back to the default strategy.
    pub fn parse_or_default(name: Option<&str>) -> Result<Self, ValidationError> {
        match name {
            Some(name) => name.parse(),
            None => Ok(Strategy::default()),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownStrategy(s.to_string()))
    }
}

/// Urgency from the number of days until the due date.
///
/// Overdue tasks grow by 2.5 per day past due, capped at [`MAX_URGENCY`].
pub fn urgency_score(due_date: Option<NaiveDate>, today: NaiveDate) -> f64 {
    let Some(due) = due_date else {
        return NO_DUE_DATE_URGENCY;
    };

    match (due - today).num_days() {
        days if days < 0 => (100.0 + days.unsigned_abs() as f64 * 2.5).min(MAX_URGENCY),
        0 => 100.0,
        1 => 90.0,
        2..=3 => 75.0,
        4..=7 => 60.0,
        8..=14 => 45.0,
        15..=30 => 30.0,
        _ => 15.0,
    }
}

/// Number of *other* tasks in the batch that list `task_id` as a dependency.
pub fn count_blocked_tasks(task_id: i64, tasks: &[Task]) -> usize {
    tasks
        .iter()
        .filter(|t| t.id != task_id && t.depends_on(task_id))
        .count()
}

/// Blocked counts for every id referenced in the batch, in one pass.
///
/// A task naming the same dependency twice counts once; self-references are
/// ignored.
pub fn blocked_counts(tasks: &[Task]) -> HashMap<i64, usize> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for task in tasks {
        let unique: HashSet<i64> = task
            .dependencies
            .iter()
            .copied()
            .filter(|dep| *dep != task.id)
            .collect();
        for dep in unique {
            *counts.entry(dep).or_default() += 1;
        }
    }
    counts
}

/// Named contribution to a task's score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreTerm {
    pub name: &'static str,
    pub contribution: f64,
}

impl ScoreTerm {
    pub fn new(name: &'static str, contribution: f64) -> Self {
        Self { name, contribution }
    }
}

/// Score split into its terms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub terms: Vec<ScoreTerm>,
    pub total: f64,
}

impl ScoreBreakdown {
    fn new() -> Self {
        Self {
            terms: Vec::with_capacity(4),
            total: 0.0,
        }
    }

    fn add_term(&mut self, name: &'static str, contribution: f64) {
        self.total += contribution;
        self.terms.push(ScoreTerm::new(name, contribution));
    }

    /// Term with the largest contribution; the earliest term wins ties.
    pub fn dominant_term(&self) -> Option<&ScoreTerm> {
        self.terms.iter().fold(None, |best: Option<&ScoreTerm>, term| match best {
            Some(b) if b.contribution >= term.contribution => Some(b),
            _ => Some(term),
        })
    }
}

/// Weights applied by `smart_balance`, chosen by due-date band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceWeights {
    pub urgency: f64,
    pub importance: f64,
    pub effort: f64,
}

impl BalanceWeights {
    /// Overdue or due today: urgency dominates.
    pub const PRESSING: BalanceWeights = BalanceWeights {
        urgency: 2.5,
        importance: 1.0,
        effort: 0.3,
    };
    /// Due within three days.
    pub const SOON: BalanceWeights = BalanceWeights {
        urgency: 1.5,
        importance: 1.2,
        effort: 0.5,
    };
    /// Everything else, including tasks without a due date.
    pub const RELAXED: BalanceWeights = BalanceWeights {
        urgency: 1.0,
        importance: 1.0,
        effort: 0.8,
    };

    pub fn for_days(days_until_due: Option<i64>) -> BalanceWeights {
        match days_until_due {
            Some(days) if days <= 0 => Self::PRESSING,
            Some(days) if days <= 3 => Self::SOON,
            _ => Self::RELAXED,
        }
    }
}

/// Stateless scoring engine anchored to a reference date.
#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine {
    today: NaiveDate,
}

impl ScoringEngine {
    /// Create an engine that measures due dates against `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Break one task's score into terms.
    pub fn breakdown(&self, task: &Task, blocked: usize, strategy: Strategy) -> ScoreBreakdown {
        let urgency = urgency_score(task.due_date, self.today);
        let importance = task.importance_or_default() as f64;
        let hours = task.hours();
        let blocked_boost = blocked as f64 * strategy.per_block_bonus();

        let mut breakdown = ScoreBreakdown::new();
        match strategy {
            Strategy::SmartBalance => {
                let weights = BalanceWeights::for_days(task.days_until_due(self.today));
                breakdown.add_term("urgency", urgency * weights.urgency);
                breakdown.add_term("importance", importance * 10.0 * weights.importance);
                breakdown.add_term("effort", 50.0 / (hours + 1.0) * weights.effort);
                breakdown.add_term("dependencies", blocked_boost);
            }
            Strategy::FastestWins => {
                breakdown.add_term("effort", 100.0 / (hours + 1.0));
                breakdown.add_term("urgency", urgency * 0.3);
                breakdown.add_term("importance", importance * 2.0);
            }
            Strategy::HighImpact => {
                breakdown.add_term("importance", importance * 20.0);
                breakdown.add_term("dependencies", blocked_boost);
                breakdown.add_term("urgency", urgency * 0.4);
            }
            Strategy::DeadlineDriven => {
                breakdown.add_term("urgency", urgency * 2.0);
                breakdown.add_term("importance", importance * 3.0);
                breakdown.add_term("effort", 20.0 - hours);
            }
        }
        breakdown
    }

    /// Score a single task against its batch, returning `(score, explanation)`.
    ///
    /// The task is not validated here; [`ScoringEngine::score`] validates the
    /// whole batch first.
    pub fn score_task(&self, task: &Task, tasks: &[Task], strategy: Strategy) -> (f64, String) {
        let blocked = count_blocked_tasks(task.id, tasks);
        let breakdown = self.breakdown(task, blocked, strategy);
        let explanation = self.explain(task, blocked, strategy, &breakdown);
        (breakdown.total, explanation)
    }

    /// Score and rank a batch, highest priority first.
    ///
    /// The sort is stable, so tasks with equal (rounded) scores keep their
    /// input order.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTasks`] listing every invalid task;
    /// nothing is scored in that case.
    pub fn score(
        &self,
        tasks: &[Task],
        strategy: Strategy,
    ) -> Result<Vec<ScoredTask>, ValidationError> {
        validate_batch(tasks)?;

        let counts = blocked_counts(tasks);
        let mut scored: Vec<ScoredTask> = tasks
            .iter()
            .map(|task| {
                let blocked = counts.get(&task.id).copied().unwrap_or(0);
                let breakdown = self.breakdown(task, blocked, strategy);
                let explanation = self.explain(task, blocked, strategy, &breakdown);
                debug!(
                    task_id = task.id,
                    strategy = %strategy,
                    score = breakdown.total,
                    "scored task"
                );
                ScoredTask {
                    task: task.clone(),
                    priority_score: round2(breakdown.total),
                    explanation,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
        Ok(scored)
    }

    /// The top `n` tasks of [`ScoringEngine::score`].
    pub fn suggest(
        &self,
        tasks: &[Task],
        strategy: Strategy,
        n: usize,
    ) -> Result<Vec<ScoredTask>, ValidationError> {
        let mut ranked = self.score(tasks, strategy)?;
        ranked.truncate(n);
        Ok(ranked)
    }

    fn explain(
        &self,
        task: &Task,
        blocked: usize,
        strategy: Strategy,
        breakdown: &ScoreBreakdown,
    ) -> String {
        let mut explanation = String::from(strategy.label());
        explanation.push_str(": ");
        if let Some(term) = breakdown.dominant_term() {
            explanation.push_str(&format!("{} leads ({:.1}); ", term.name, term.contribution));
        }
        explanation.push_str(&due_phrase(task.days_until_due(self.today)));
        explanation.push_str(&format!(", importance {}/10", task.importance_or_default()));
        if blocked > 0 {
            explanation.push_str(&format!(", blocks {blocked} task(s)"));
        }
        if task.hours() <= QUICK_WIN_HOURS {
            explanation.push_str(", quick win");
        }
        explanation
    }
}

/// Relative due-date wording used in explanations.
pub fn due_phrase(days_until_due: Option<i64>) -> String {
    match days_until_due {
        None => "no due date".to_string(),
        Some(0) => "due today".to_string(),
        Some(days) if days < 0 => format!("overdue by {}", plural_days(days.unsigned_abs())),
        Some(days) => format!("due in {}", plural_days(days.unsigned_abs())),
    }
}

fn plural_days(n: u64) -> String {
    if n == 1 {
        "1 day".to_string()
    } else {
        format!("{n} days")
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 28).unwrap()
    }

    fn in_days(n: i64) -> NaiveDate {
        today() + Duration::days(n)
    }

    #[test]
    fn urgency_tiers() {
        let t = today();
        assert_eq!(urgency_score(None, t), 30.0);
        assert_eq!(urgency_score(Some(in_days(0)), t), 100.0);
        assert_eq!(urgency_score(Some(in_days(1)), t), 90.0);
        assert_eq!(urgency_score(Some(in_days(2)), t), 75.0);
        assert_eq!(urgency_score(Some(in_days(3)), t), 75.0);
        assert_eq!(urgency_score(Some(in_days(4)), t), 60.0);
        assert_eq!(urgency_score(Some(in_days(7)), t), 60.0);
        assert_eq!(urgency_score(Some(in_days(8)), t), 45.0);
        assert_eq!(urgency_score(Some(in_days(14)), t), 45.0);
        assert_eq!(urgency_score(Some(in_days(15)), t), 30.0);
        assert_eq!(urgency_score(Some(in_days(30)), t), 30.0);
        assert_eq!(urgency_score(Some(in_days(31)), t), 15.0);
    }

    #[test]
    fn overdue_urgency_grows_then_caps() {
        let t = today();
        assert_eq!(urgency_score(Some(in_days(-1)), t), 102.5);
        assert_eq!(urgency_score(Some(in_days(-8)), t), 120.0);
        assert_eq!(urgency_score(Some(in_days(-40)), t), 200.0);
        assert_eq!(urgency_score(Some(in_days(-50)), t), 200.0);
    }

    #[test]
    fn strategy_parsing() {
        assert_eq!("high_impact".parse::<Strategy>().unwrap(), Strategy::HighImpact);
        assert_eq!(" Fastest_Wins ".parse::<Strategy>().unwrap(), Strategy::FastestWins);
        assert!(matches!(
            "random".parse::<Strategy>(),
            Err(ValidationError::UnknownStrategy(_))
        ));
        assert_eq!(Strategy::parse_or_default(None).unwrap(), Strategy::SmartBalance);
    }

    #[test]
    fn blocked_counts_ignore_self_and_duplicates() {
        let tasks = vec![
            Task::new(1, "A").with_dependencies([1]),
            Task::new(2, "B").with_dependencies([1, 1]),
            Task::new(3, "C").with_dependencies([1, 2]),
        ];
        let counts = blocked_counts(&tasks);
        assert_eq!(counts.get(&1), Some(&2));
        assert_eq!(counts.get(&2), Some(&1));
        assert_eq!(counts.get(&3), None);
        assert_eq!(count_blocked_tasks(1, &tasks), 2);
    }

    #[test]
    fn smart_balance_formula() {
        let engine = ScoringEngine::new(today());
        // Due in 2 days: urgency 75 * 1.5, importance 7*10*1.2, effort 50/3*0.5
        let task = Task::new(1, "A").with_due_date(in_days(2)).with_importance(7).with_hours(2.0);
        let (score, _) = engine.score_task(&task, std::slice::from_ref(&task), Strategy::SmartBalance);
        let expected = 75.0 * 1.5 + 70.0 * 1.2 + 50.0 / 3.0 * 0.5;
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn smart_balance_due_today_uses_pressing_weights() {
        let engine = ScoringEngine::new(today());
        let task = Task::new(1, "A").with_due_date(today()).with_hours(4.0);
        let (score, _) = engine.score_task(&task, std::slice::from_ref(&task), Strategy::SmartBalance);
        let expected = 100.0 * 2.5 + 50.0 + 10.0 * 0.3;
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn fastest_wins_formula() {
        let engine = ScoringEngine::new(today());
        let task = Task::new(1, "A").with_hours(1.0).with_importance(4);
        let (score, _) = engine.score_task(&task, std::slice::from_ref(&task), Strategy::FastestWins);
        assert!((score - (50.0 + 9.0 + 8.0)).abs() < 1e-9);
    }

    #[test]
    fn high_impact_formula() {
        let engine = ScoringEngine::new(today());
        let tasks = vec![
            Task::new(1, "A").with_importance(9),
            Task::new(2, "B").with_dependencies([1]),
        ];
        let (score, explanation) = engine.score_task(&tasks[0], &tasks, Strategy::HighImpact);
        assert!((score - (180.0 + 15.0 + 12.0)).abs() < 1e-9);
        assert!(explanation.contains("blocks 1 task(s)"));
    }

    #[test]
    fn deadline_driven_effort_term_is_not_clamped() {
        let engine = ScoringEngine::new(today());
        let task = Task::new(1, "A").with_hours(40.0);
        let (score, _) = engine.score_task(&task, std::slice::from_ref(&task), Strategy::DeadlineDriven);
        assert!((score - (60.0 + 15.0 - 20.0)).abs() < 1e-9);
    }

    #[test]
    fn explanation_mentions_due_importance_and_dominant_factor() {
        let engine = ScoringEngine::new(today());
        let task = Task::new(1, "A").with_due_date(in_days(-3)).with_importance(6);
        let (_, explanation) = engine.score_task(&task, std::slice::from_ref(&task), Strategy::SmartBalance);
        assert!(explanation.starts_with("Smart Balance: urgency leads"));
        assert!(explanation.contains("overdue by 3 days"));
        assert!(explanation.contains("importance 6/10"));
        assert!(!explanation.contains("blocks"));

        let task = Task::new(2, "B").with_hours(1.0);
        let (_, explanation) = engine.score_task(&task, std::slice::from_ref(&task), Strategy::FastestWins);
        assert!(explanation.starts_with("Fastest Wins: effort leads (50.0)"));
        assert!(explanation.contains("no due date"));
        assert!(explanation.ends_with("quick win"));
    }

    #[test]
    fn due_phrases() {
        assert_eq!(due_phrase(None), "no due date");
        assert_eq!(due_phrase(Some(0)), "due today");
        assert_eq!(due_phrase(Some(1)), "due in 1 day");
        assert_eq!(due_phrase(Some(5)), "due in 5 days");
        assert_eq!(due_phrase(Some(-1)), "overdue by 1 day");
        assert_eq!(due_phrase(Some(-12)), "overdue by 12 days");
    }

    #[test]
    fn score_rejects_invalid_batch_without_partial_results() {
        let engine = ScoringEngine::new(today());
        let tasks = vec![Task::new(1, "ok"), Task::new(2, "").with_importance(5)];
        let err = engine.score(&tasks, Strategy::SmartBalance).unwrap_err();
        assert_eq!(err.issues().len(), 1);
    }

    #[test]
    fn score_of_empty_batch_is_empty() {
        let engine = ScoringEngine::new(today());
        assert!(engine.score(&[], Strategy::HighImpact).unwrap().is_empty());
    }

    #[test]
    fn ties_keep_input_order() {
        let engine = ScoringEngine::new(today());
        let tasks = vec![Task::new(5, "first"), Task::new(3, "second"), Task::new(9, "third")];
        let ranked = engine.score(&tasks, Strategy::DeadlineDriven).unwrap();
        let ids: Vec<i64> = ranked.iter().map(|s| s.task.id).collect();
        assert_eq!(ids, vec![5, 3, 9]);
    }

    #[test]
    fn scores_are_rounded_to_two_decimals() {
        let engine = ScoringEngine::new(today());
        let tasks = vec![Task::new(1, "A").with_hours(2.0)];
        let ranked = engine.score(&tasks, Strategy::FastestWins).unwrap();
        // 100/3 + 9 + 10 = 52.333...
        assert_eq!(ranked[0].priority_score, 52.33);
    }

    #[test]
    fn suggest_truncates() {
        let engine = ScoringEngine::new(today());
        let tasks: Vec<Task> = (1..=5).map(|i| Task::new(i, format!("T{i}")).with_importance(i)).collect();
        let top = engine.suggest(&tasks, Strategy::HighImpact, 3).unwrap();
        let ids: Vec<i64> = top.iter().map(|s| s.task.id).collect();
        assert_eq!(ids, vec![5, 4, 3]);
    }
}
