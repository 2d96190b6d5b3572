//! Batch run entities
//!
//! Per-item results, the aggregated summary and the batch state machine.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::product::{ExtractionTarget, ProductRecord};

/// Serializable classification of a failed item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ValidationError,
    NetworkError,
    HttpStatusError,
    ParseError,
}

/// Outcome of one batch item, tagged with the item's position in the input
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchItemResult {
    Success {
        index: usize,
        target: String,
        data: ProductRecord,
        timestamp: DateTime<Utc>,
    },
    Failure {
        index: usize,
        target: String,
        error_kind: ErrorKind,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl BatchItemResult {
    pub fn success(index: usize, target: &ExtractionTarget, data: ProductRecord) -> Self {
        Self::Success {
            index,
            target: target.label(),
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(
        index: usize,
        target: &ExtractionTarget,
        error_kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self::Failure {
            index,
            target: target.label(),
            error_kind,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Success { index, .. } | Self::Failure { index, .. } => *index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Aggregate counts for a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "is_zero")]
    pub skipped: usize,
    #[serde(serialize_with = "serialize_percent")]
    pub success_rate: u32,
}

impl BatchSummary {
    /// Build the summary from results; `total` is the size of the input list
    pub fn from_results(total: usize, results: &[BatchItemResult]) -> Self {
        let successful = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - successful;
        Self {
            total,
            successful,
            failed,
            skipped: total.saturating_sub(results.len()),
            success_rate: success_rate(successful, total),
        }
    }
}

/// `round(successful / total * 100)`, 0 for an empty batch
pub fn success_rate(successful: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let rate = (successful as f64 / total as f64 * 100.0).round();
    // bounded to 0..=100
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rate = rate as u32;
    rate
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &usize) -> bool {
    *value == 0
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_percent<S: Serializer>(rate: &u32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{rate}%"))
}

/// Batch orchestrator state machine
///
/// `Idle → Running(0) → … → Running(n-1) → Completed`, with `Cancelled` reachable
/// from any `Running` state when a cancellation token or deadline trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BatchState {
    Idle,
    Running { index: usize },
    Completed,
    Cancelled { next_index: usize },
}

impl BatchState {
    /// Leave `Idle`: the first item, or straight to `Completed` for an empty batch
    pub fn start(total: usize) -> Self {
        if total == 0 {
            Self::Completed
        } else {
            Self::Running { index: 0 }
        }
    }

    /// Transition after the current item finished
    pub fn advance(self, total: usize) -> Self {
        match self {
            Self::Idle => Self::start(total),
            Self::Running { index } if index + 1 < total => Self::Running { index: index + 1 },
            Self::Running { .. } => Self::Completed,
            terminal => terminal,
        }
    }

    pub fn cancel(self) -> Self {
        match self {
            Self::Running { index } => Self::Cancelled { next_index: index },
            Self::Idle => Self::Cancelled { next_index: 0 },
            terminal => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled { .. })
    }
}

/// Everything a batch run produces
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_summary: BatchSummary,
    pub results: Vec<BatchItemResult>,
    pub state: BatchState,
}
