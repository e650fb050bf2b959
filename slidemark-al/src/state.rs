//! In-memory session state for the active slide
//!
//! Exactly one working set and one accumulated history exist per
//! (dataset, slide) pair; switching slide discards both, cancels any
//! in-flight poll loop, and drops the prediction set. The session is
//! owned behind an `Arc<RwLock<_>>` in `AppState`; all mutation happens
//! in short write-lock sections so prediction replacement is atomic.

use crate::models::{Nucleus, PredictionSet, ViewState};
use crate::services::{NucleusIndex, SampleAccumulator};
use slidemark_common::types::JobKind;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// The one in-flight job, if any. At most one poll loop is active per
/// session; a new submission cancels this token before starting its own.
#[derive(Debug)]
pub struct ActiveJob {
    pub job_id: Uuid,
    pub kind: JobKind,
    pub cancel: CancellationToken,
}

/// Session state for the currently selected slide
pub struct SessionState {
    pub dataset_id: Option<i64>,
    pub slide_id: Option<i64>,
    pub slide_name: Option<String>,
    pub index: Option<NucleusIndex>,
    pub accumulator: SampleAccumulator,
    pub predictions: Option<PredictionSet>,
    pub view: ViewState,
    active_job: Option<ActiveJob>,
}

impl SessionState {
    pub fn new(default_bin_size: f64) -> Self {
        Self {
            dataset_id: None,
            slide_id: None,
            slide_name: None,
            index: None,
            accumulator: SampleAccumulator::new(),
            predictions: None,
            view: ViewState::new(default_bin_size),
            active_job: None,
        }
    }

    /// Load a slide's detections and reset everything tied to the
    /// previous slide: working set, history, predictions, and any
    /// in-flight poll loop.
    pub fn select_slide(
        &mut self,
        dataset_id: i64,
        slide_id: i64,
        slide_name: String,
        nuclei: Vec<Nucleus>,
        hit_radius: f64,
        visible_stride: usize,
    ) {
        self.cancel_active_job();

        let mut index = NucleusIndex::new(nuclei, hit_radius);
        index.set_visible(visible_stride, &[]);

        self.dataset_id = Some(dataset_id);
        self.slide_id = Some(slide_id);
        self.slide_name = Some(slide_name);
        self.index = Some(index);
        self.accumulator.reset();
        self.predictions = None;
        let zoom = self.view.zoom;
        self.view.reduce(zoom, f64::INFINITY, false);
    }

    pub fn has_slide(&self) -> bool {
        self.slide_id.is_some()
    }

    /// Cancel and drop the in-flight job, if any. Returns the cancelled
    /// job id.
    pub fn cancel_active_job(&mut self) -> Option<Uuid> {
        self.active_job.take().map(|job| {
            job.cancel.cancel();
            tracing::debug!(job_id = %job.job_id, "Cancelled in-flight job");
            job.job_id
        })
    }

    /// Install a freshly accepted job as the active one, cancelling any
    /// predecessor first. Returns the token the poll loop must watch.
    pub fn begin_job(&mut self, job_id: Uuid, kind: JobKind) -> CancellationToken {
        self.cancel_active_job();
        let cancel = CancellationToken::new();
        self.active_job = Some(ActiveJob {
            job_id,
            kind,
            cancel: cancel.clone(),
        });
        cancel
    }

    pub fn active_job(&self) -> Option<&ActiveJob> {
        self.active_job.as_ref()
    }

    /// Liveness check a poll loop must pass before mutating session
    /// state: a superseded job is no longer current.
    pub fn is_current_job(&self, job_id: Uuid) -> bool {
        self.active_job
            .as_ref()
            .map(|job| job.job_id == job_id)
            .unwrap_or(false)
    }

    /// Job finished (any terminal outcome); clear the slot without
    /// cancelling.
    pub fn clear_active_job(&mut self) {
        self.active_job = None;
    }

    /// Atomically replace the prediction set. The set must match the
    /// active slide; a stale set from a superseded slide is refused.
    pub fn replace_predictions(&mut self, set: PredictionSet) -> bool {
        if self.slide_id != Some(set.slide_id) {
            tracing::warn!(
                job_id = %set.job_id,
                set_slide = set.slide_id,
                active_slide = ?self.slide_id,
                "Refusing prediction set for a slide that is no longer active"
            );
            return false;
        }
        self.predictions = Some(set);
        true
    }

    /// Predictions are renderable only when tagged with the active slide
    pub fn current_predictions(&self) -> Option<&PredictionSet> {
        let slide_id = self.slide_id?;
        self.predictions
            .as_ref()
            .filter(|set| set.matches_slide(slide_id))
    }
}
