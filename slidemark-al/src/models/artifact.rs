//! Persisted trained classifier artifacts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted trained classifier usable for inference
///
/// Validity comes from an integrity check (the artifact is actually
/// loadable), not from mere file presence. Invalid artifacts are listed
/// but never selectable as a transfer-learning source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Name of the slide this classifier was trained on
    pub slide_name: String,
    pub filename: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "is_valid")]
    pub valid: bool,
}
