//! Remote job status and result payloads

use crate::models::Prediction;
use serde::{Deserialize, Serialize};

/// Status of an asynchronous training-or-inference job
///
/// Transitions are one-directional (pending → running → completed | error)
/// and observed, never driven, by this service. The model server reports
/// `queued`/`processing` for the first two states; the aliases accept both
/// spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[serde(alias = "queued")]
    Pending,
    #[serde(alias = "processing")]
    Running,
    Completed,
    #[serde(alias = "failed")]
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

/// One poll's worth of job state from the model server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub status: JobStatus,
    /// Percentage complete, 0-100
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub message: Option<String>,
}

/// Result payload of a completed job: the full prediction set plus
/// summary counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResults {
    pub slide_name: String,
    pub total_count: usize,
    pub positive_count: usize,
    pub negative_count: usize,
    pub predictions: Vec<Prediction>,
}
