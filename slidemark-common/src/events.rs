//! Event types for the slidemark event system
//!
//! Provides shared event definitions and the EventBus used by the
//! active-learning session service to stream progress to connected UIs.

use crate::types::{JobKind, Label};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Session event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
/// All events use this central enum for type safety and exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Nuclei for a slide were loaded and the session was reset
    SlideLoaded {
        dataset_id: i64,
        slide_id: i64,
        nucleus_count: usize,
        /// Whether the registry already holds a valid model for this slide
        model_found: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A sample was added to or removed from the working set
    SampleToggled {
        nucleus_index: usize,
        label: Label,
        /// True when the toggle added the sample, false when it removed it
        added: bool,
        positive_count: usize,
        negative_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A validated batch was accepted and submitted for training
    BatchSubmitted {
        job_id: Uuid,
        iteration: u32,
        /// Total samples sent, accumulated across all iterations
        sample_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A transfer-learning inference request was accepted
    InferenceSubmitted {
        job_id: Uuid,
        artifact_slide: String,
        /// True when the artifact originates from a different slide
        transfer_learning: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Remote job reported progress while running
    JobProgress {
        job_id: Uuid,
        kind: JobKind,
        progress: u8,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Remote job completed and results were fetched
    JobCompleted {
        job_id: Uuid,
        kind: JobKind,
        total_count: usize,
        positive_count: usize,
        negative_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Remote job reported failure
    JobFailed {
        job_id: Uuid,
        kind: JobKind,
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Polling budget exhausted without a terminal status
    JobTimedOut {
        job_id: Uuid,
        kind: JobKind,
        polls: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The prediction set was atomically replaced
    PredictionsReplaced {
        job_id: Uuid,
        slide_id: i64,
        count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The model registry listing was refreshed
    RegistryRefreshed {
        artifact_count: usize,
        valid_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SessionEvent {
    /// Event type name used as the SSE event field
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::SlideLoaded { .. } => "SlideLoaded",
            SessionEvent::SampleToggled { .. } => "SampleToggled",
            SessionEvent::BatchSubmitted { .. } => "BatchSubmitted",
            SessionEvent::InferenceSubmitted { .. } => "InferenceSubmitted",
            SessionEvent::JobProgress { .. } => "JobProgress",
            SessionEvent::JobCompleted { .. } => "JobCompleted",
            SessionEvent::JobFailed { .. } => "JobFailed",
            SessionEvent::JobTimedOut { .. } => "JobTimedOut",
            SessionEvent::PredictionsReplaced { .. } => "PredictionsReplaced",
            SessionEvent::RegistryRefreshed { .. } => "RegistryRefreshed",
        }
    }
}

/// Event bus for broadcasting session events to SSE subscribers
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns the number of receivers the event reached. A bus with no
    /// subscribers is not an error; the event is simply dropped.
    pub fn emit(&self, event: SessionEvent) -> usize {
        match self.tx.send(event) {
            Ok(n) => n,
            Err(_) => {
                tracing::trace!("Event emitted with no subscribers");
                0
            }
        }
    }

    /// Channel capacity this bus was created with
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
