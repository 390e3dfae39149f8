//! User feedback on prioritization results.
//!
//! Feedback records are handed to a [`FeedbackSink`]; where they end up is the
//! sink's business. The crate ships [`MemoryFeedbackSink`], which keeps records
//! for the lifetime of the process only.
//!
//! Aggregates over recorded feedback drive [`adjusted_weights`], a suggestion
//! for nudging the relaxed-band `smart_balance` weights:
//!
//! | helpful rate | adjustment factor |
//! |--------------|-------------------|
//! | < 0.4 | 1.2 |
//! | < 0.6 | 1.1 |
//! | otherwise | 1.05 |
//!
//! Fewer than [`MIN_FEEDBACK_FOR_ADJUSTMENT`] records leave the weights as-is.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FeedbackError, ValidationError};
use crate::scoring::Strategy;

/// Records needed before weights are adjusted at all.
pub const MIN_FEEDBACK_FOR_ADJUSTMENT: usize = 5;

/// Feedback as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub task_id: i64,
    pub task_title: String,
    pub strategy: String,
    pub priority_score: f64,
    pub was_helpful: bool,
    #[serde(default)]
    pub feedback_note: Option<String>,
    /// Snapshot of the task fields at feedback time
    #[serde(default)]
    pub task_attributes: serde_json::Value,
}

impl FeedbackSubmission {
    /// Validate and stamp the submission.
    pub fn into_record(self, received_at: DateTime<Utc>) -> Result<FeedbackRecord, ValidationError> {
        let strategy: Strategy = self.strategy.parse()?;
        if self.task_title.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "task_title".into(),
                message: "must not be empty".into(),
            });
        }
        if !self.priority_score.is_finite() {
            return Err(ValidationError::InvalidValue {
                field: "priority_score".into(),
                message: "must be a finite number".into(),
            });
        }

        Ok(FeedbackRecord {
            task_id: self.task_id,
            task_title: self.task_title,
            strategy,
            priority_score: self.priority_score,
            was_helpful: self.was_helpful,
            feedback_note: self.feedback_note.filter(|n| !n.trim().is_empty()),
            task_attributes: self.task_attributes,
            created_at: received_at,
        })
    }
}

/// One stored piece of feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub task_id: i64,
    pub task_title: String,
    pub strategy: Strategy,
    pub priority_score: f64,
    pub was_helpful: bool,
    pub feedback_note: Option<String>,
    pub task_attributes: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Destination for feedback records.
pub trait FeedbackSink: Send + Sync {
    /// Accept one record.
    fn record(&self, record: FeedbackRecord) -> Result<(), FeedbackError>;

    /// All records captured for `strategy`, oldest first.
    fn records_for(&self, strategy: Strategy) -> Result<Vec<FeedbackRecord>, FeedbackError>;
}

/// Process-local sink.
#[derive(Debug, Default)]
pub struct MemoryFeedbackSink {
    records: Mutex<Vec<FeedbackRecord>>,
}

impl MemoryFeedbackSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FeedbackSink for MemoryFeedbackSink {
    fn record(&self, record: FeedbackRecord) -> Result<(), FeedbackError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| FeedbackError::Unavailable("feedback store lock poisoned".into()))?;
        records.push(record);
        Ok(())
    }

    fn records_for(&self, strategy: Strategy) -> Result<Vec<FeedbackRecord>, FeedbackError> {
        let records = self
            .records
            .lock()
            .map_err(|_| FeedbackError::Unavailable("feedback store lock poisoned".into()))?;
        Ok(records
            .iter()
            .filter(|r| r.strategy == strategy)
            .cloned()
            .collect())
    }
}

/// Aggregate feedback numbers for one strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackStats {
    pub total: usize,
    pub helpful_count: usize,
    pub not_helpful_count: usize,
    /// helpful / total, 0 when there is no feedback
    pub helpful_rate: f64,
    pub avg_priority_score_helpful: f64,
    pub avg_priority_score_not_helpful: f64,
}

impl FeedbackStats {
    pub fn from_records(records: &[FeedbackRecord]) -> Self {
        let (helpful, not_helpful): (Vec<&FeedbackRecord>, Vec<&FeedbackRecord>) =
            records.iter().partition(|r| r.was_helpful);
        let total = records.len();

        Self {
            total,
            helpful_count: helpful.len(),
            not_helpful_count: not_helpful.len(),
            helpful_rate: if total > 0 {
                helpful.len() as f64 / total as f64
            } else {
                0.0
            },
            avg_priority_score_helpful: mean_score(&helpful),
            avg_priority_score_not_helpful: mean_score(&not_helpful),
        }
    }
}

fn mean_score(records: &[&FeedbackRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(|r| r.priority_score).sum::<f64>() / records.len() as f64
}

/// Weight set that feedback can nudge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustedWeights {
    pub urgency_weight: f64,
    pub importance_weight: f64,
    pub effort_weight: f64,
    pub dependency_boost: f64,
}

impl Default for AdjustedWeights {
    /// The relaxed-band `smart_balance` weights.
    fn default() -> Self {
        Self {
            urgency_weight: 1.0,
            importance_weight: 1.0,
            effort_weight: 0.8,
            dependency_boost: 20.0,
        }
    }
}

/// Suggest weights from feedback statistics.
///
/// When helpful tasks scored clearly higher than unhelpful ones and users are
/// mostly unhappy, urgency is under-weighted; when helpful tasks scored lower
/// and users are mostly happy, urgency yields to importance.
pub fn adjusted_weights(stats: &FeedbackStats, base: AdjustedWeights) -> AdjustedWeights {
    if stats.total < MIN_FEEDBACK_FOR_ADJUSTMENT {
        return base;
    }

    let rate = stats.helpful_rate;
    let factor = if rate < 0.4 {
        1.2
    } else if rate < 0.6 {
        1.1
    } else {
        1.05
    };
    let score_diff = stats.avg_priority_score_helpful - stats.avg_priority_score_not_helpful;

    let mut weights = base;
    if score_diff > 20.0 && rate < 0.6 {
        weights.urgency_weight *= factor;
    }
    if score_diff < -10.0 && rate > 0.6 {
        weights.urgency_weight /= factor;
        weights.importance_weight *= factor;
    }
    weights
}

/// Stats and suggested weights for one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub strategy: Strategy,
    pub stats: FeedbackStats,
    pub weights: AdjustedWeights,
}

/// Build a [`FeedbackReport`] from whatever the sink holds for `strategy`.
pub fn report(sink: &dyn FeedbackSink, strategy: Strategy) -> Result<FeedbackReport, FeedbackError> {
    let records = sink.records_for(strategy)?;
    let stats = FeedbackStats::from_records(&records);
    let weights = adjusted_weights(&stats, AdjustedWeights::default());
    Ok(FeedbackReport {
        strategy,
        stats,
        weights,
    })
}
