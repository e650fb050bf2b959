//! Session lifecycle endpoints: slide selection, sample toggling,
//! batch submission, cancellation, and status.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{ModelArtifact, OverlayMode};
use crate::state::SessionState;
use crate::AppState;
use slidemark_common::events::SessionEvent;
use slidemark_common::types::{JobKind, Label};

#[derive(Debug, Deserialize)]
pub struct SelectSlideRequest {
    pub dataset_id: i64,
    pub slide_id: i64,
    pub slide_name: String,
}

#[derive(Debug, Serialize)]
pub struct SelectSlideResponse {
    pub dataset_id: i64,
    pub slide_id: i64,
    pub slide_name: String,
    pub nucleus_count: usize,
    pub visible_count: usize,
    /// Whether the registry already holds a valid model for this slide
    pub model_found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelArtifact>,
}

/// POST /api/session/slide
///
/// Select a slide: fetch its nucleus detections, reset the session, and
/// report whether a previously trained model exists for it.
pub async fn select_slide(
    State(state): State<AppState>,
    Json(req): Json<SelectSlideRequest>,
) -> ApiResult<Json<SelectSlideResponse>> {
    let nuclei = state.slide_store.fetch_nuclei(&req.slide_name).await?;
    let nucleus_count = nuclei.len();

    let model = state.registry.find_for_slide(&req.slide_name).await;
    let model_found = model.is_some();

    let mut session = state.session.write().await;
    session.select_slide(
        req.dataset_id,
        req.slide_id,
        req.slide_name.clone(),
        nuclei,
        state.config.hit_testing.radius,
        state.config.hit_testing.visible_stride,
    );
    let visible_count = session
        .index
        .as_ref()
        .map(|index| index.visible_len())
        .unwrap_or(0);
    drop(session);

    tracing::info!(
        dataset_id = req.dataset_id,
        slide_id = req.slide_id,
        slide = %req.slide_name,
        nucleus_count,
        model_found,
        "Slide selected"
    );
    state.event_bus.emit(SessionEvent::SlideLoaded {
        dataset_id: req.dataset_id,
        slide_id: req.slide_id,
        nucleus_count,
        model_found,
        timestamp: Utc::now(),
    });

    Ok(Json(SelectSlideResponse {
        dataset_id: req.dataset_id,
        slide_id: req.slide_id,
        slide_name: req.slide_name,
        nucleus_count,
        visible_count,
        model_found,
        model,
    }))
}

#[derive(Debug, Serialize)]
pub struct ActiveJobInfo {
    pub job_id: Uuid,
    pub kind: JobKind,
}

#[derive(Debug, Serialize)]
pub struct PredictionSummary {
    pub job_id: Uuid,
    pub total_count: usize,
    pub positive_count: usize,
    pub negative_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub dataset_id: Option<i64>,
    pub slide_id: Option<i64>,
    pub slide_name: Option<String>,
    pub nucleus_count: usize,
    pub positive_count: usize,
    pub negative_count: usize,
    pub can_submit: bool,
    pub iteration: u32,
    pub mode: OverlayMode,
    pub zoom: f64,
    pub bin_size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_job: Option<ActiveJobInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predictions: Option<PredictionSummary>,
}

/// GET /api/session
pub async fn session_status(State(state): State<AppState>) -> Json<SessionStatusResponse> {
    let session = state.session.read().await;
    let (positive_count, negative_count) = session.accumulator.counts();

    Json(SessionStatusResponse {
        dataset_id: session.dataset_id,
        slide_id: session.slide_id,
        slide_name: session.slide_name.clone(),
        nucleus_count: session.index.as_ref().map(|i| i.len()).unwrap_or(0),
        positive_count,
        negative_count,
        can_submit: session.accumulator.can_submit(),
        iteration: session.accumulator.iteration(),
        mode: session.view.mode,
        zoom: session.view.zoom,
        bin_size: session.view.bin_size,
        active_job: session.active_job().map(|job| ActiveJobInfo {
            job_id: job.job_id,
            kind: job.kind,
        }),
        predictions: session.current_predictions().map(|set| PredictionSummary {
            job_id: set.job_id,
            total_count: set.total_count(),
            positive_count: set.positive_count,
            negative_count: set.negative_count,
        }),
    })
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    /// Click position in image units
    pub x: f64,
    pub y: f64,
    pub label: Label,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    /// False when the click landed on no nucleus; nothing changed
    pub hit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nucleus_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<bool>,
    pub positive_count: usize,
    pub negative_count: usize,
    pub can_submit: bool,
}

/// POST /api/session/toggle
///
/// Hit-test the click against the nucleus index and toggle the matched
/// nucleus in the working set. A miss is a no-op, not an error.
pub async fn toggle_sample(
    State(state): State<AppState>,
    Json(req): Json<ToggleRequest>,
) -> ApiResult<Json<ToggleResponse>> {
    let mut session = state.session.write().await;
    let index = session.index.as_ref().ok_or(ApiError::NoActiveSlide)?;

    let Some(nucleus) = index.hit_test(req.x, req.y).cloned() else {
        let (positive_count, negative_count) = session.accumulator.counts();
        return Ok(Json(ToggleResponse {
            hit: false,
            nucleus_index: None,
            added: None,
            positive_count,
            negative_count,
            can_submit: session.accumulator.can_submit(),
        }));
    };

    let outcome = session.accumulator.toggle(&nucleus, req.label)?;
    let added = matches!(outcome, crate::services::ToggleOutcome::Added);
    repin_visible(&mut session, state.config.hit_testing.visible_stride);

    let (positive_count, negative_count) = session.accumulator.counts();
    let can_submit = session.accumulator.can_submit();
    drop(session);

    state.event_bus.emit(SessionEvent::SampleToggled {
        nucleus_index: nucleus.index,
        label: req.label,
        added,
        positive_count,
        negative_count,
        timestamp: Utc::now(),
    });

    Ok(Json(ToggleResponse {
        hit: true,
        nucleus_index: Some(nucleus.index),
        added: Some(added),
        positive_count,
        negative_count,
        can_submit,
    }))
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: Uuid,
    /// Iteration number of the accepted batch (1-based)
    pub iteration: u32,
    /// Total samples sent, accumulated across all iterations
    pub sample_count: usize,
}

/// POST /api/session/submit
///
/// Validate the working set (four of each label, no repeat of an already
/// submitted batch), submit the full accumulated history for training,
/// and start the poll loop. A rejected or failed submission leaves the
/// working set untouched.
pub async fn submit_batch(State(state): State<AppState>) -> ApiResult<Json<SubmitResponse>> {
    let mut session = state.session.write().await;
    let dataset_id = session.dataset_id.ok_or(ApiError::NoActiveSlide)?;
    let slide_id = session.slide_id.ok_or(ApiError::NoActiveSlide)?;

    session.accumulator.validate()?;
    let batch = session.accumulator.pending_batch();

    let job_id = state
        .orchestrator
        .submit_training(dataset_id, slide_id, &batch)
        .await
        .map_err(ApiError::SubmissionFailed)?;

    // Only now does the working set move into history
    session.accumulator.commit_submitted();
    let iteration = session.accumulator.iteration();
    repin_visible(&mut session, state.config.hit_testing.visible_stride);
    let cancel = session.begin_job(job_id, JobKind::Train);
    drop(session);

    state.event_bus.emit(SessionEvent::BatchSubmitted {
        job_id,
        iteration,
        sample_count: batch.len(),
        timestamp: Utc::now(),
    });
    state.spawn_poll(job_id, JobKind::Train, slide_id, cancel);

    Ok(Json(SubmitResponse {
        job_id,
        iteration,
        sample_count: batch.len(),
    }))
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
}

/// POST /api/session/cancel
///
/// Stop the in-flight poll loop, if any. The remote job keeps running;
/// only the local polling stops.
pub async fn cancel_job(State(state): State<AppState>) -> Json<CancelResponse> {
    let mut session = state.session.write().await;
    let job_id = session.cancel_active_job();
    Json(CancelResponse {
        cancelled: job_id.is_some(),
        job_id,
    })
}

/// Labeled nuclei stay rendered regardless of the stride filter
fn repin_visible(session: &mut SessionState, stride: usize) {
    let mut pinned = session.accumulator.working_indices();
    pinned.extend(session.accumulator.history().iter().map(|s| s.nucleus_index));
    if let Some(index) = session.index.as_mut() {
        index.set_visible(stride, &pinned);
    }
}

/// Build session lifecycle routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/session", get(session_status))
        .route("/api/session/slide", post(select_slide))
        .route("/api/session/toggle", post(toggle_sample))
        .route("/api/session/submit", post(submit_batch))
        .route("/api/session/cancel", post(cancel_job))
}
