//! Human-labeled exemplars and the accumulated training batch

use serde::{Deserialize, Serialize};
use slidemark_common::Label;

/// One human-provided label attached to a nucleus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(rename = "nucleus_id")]
    pub nucleus_index: usize,
    pub x: f64,
    pub y: f64,
    pub label: Label,
}

/// One iteration's worth of samples actually sent to training
///
/// Contains the FULL accumulated history, not just the newest working set:
/// later iterations retrain on everything collected so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingBatch {
    pub samples: Vec<Sample>,
    pub iteration: u32,
}

impl TrainingBatch {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
