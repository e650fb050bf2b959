//! Model registry endpoints: catalogue listing and artifact selection
//! for inference, including the transfer-learning path.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::ModelArtifact;
use crate::AppState;
use slidemark_common::events::SessionEvent;
use slidemark_common::types::JobKind;

#[derive(Debug, Deserialize)]
pub struct ListModelsQuery {
    /// Re-list the catalogue from the model server before responding
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Serialize)]
pub struct ListModelsResponse {
    pub models: Vec<ModelArtifact>,
    pub count: usize,
}

/// GET /api/models?refresh=true
pub async fn list_models(
    State(state): State<AppState>,
    Query(query): Query<ListModelsQuery>,
) -> ApiResult<Json<ListModelsResponse>> {
    if query.refresh {
        let (artifact_count, valid_count) = state.registry.refresh().await?;
        state.event_bus.emit(SessionEvent::RegistryRefreshed {
            artifact_count,
            valid_count,
            timestamp: Utc::now(),
        });
    }
    let models = state.registry.list().await;
    let count = models.len();
    Ok(Json(ListModelsResponse { models, count }))
}

#[derive(Debug, Deserialize)]
pub struct SelectModelRequest {
    /// Artifact name (the slide it was trained on)
    pub model_name: String,
}

#[derive(Debug, Serialize)]
pub struct SelectModelResponse {
    pub job_id: Uuid,
    pub artifact: ModelArtifact,
    /// True when the artifact originates from a different slide than the
    /// active one
    pub transfer_learning: bool,
}

/// POST /api/models/select
///
/// Run an existing artifact against the active slide. An artifact from a
/// different slide is the transfer-learning mode; mechanically both are
/// the same inference submission.
pub async fn select_model(
    State(state): State<AppState>,
    Json(req): Json<SelectModelRequest>,
) -> ApiResult<Json<SelectModelResponse>> {
    let mut session = state.session.write().await;
    let dataset_id = session.dataset_id.ok_or(ApiError::NoActiveSlide)?;
    let slide_id = session.slide_id.ok_or(ApiError::NoActiveSlide)?;
    let slide_name = session
        .slide_name
        .clone()
        .ok_or(ApiError::NoActiveSlide)?;

    let selection = state
        .registry
        .select_for_transfer(&req.model_name, &slide_name)
        .await?;

    let job_id = state
        .orchestrator
        .submit_inference(dataset_id, slide_id, &selection.artifact.slide_name)
        .await
        .map_err(ApiError::SubmissionFailed)?;

    let cancel = session.begin_job(job_id, JobKind::Infer);
    drop(session);

    state.event_bus.emit(SessionEvent::InferenceSubmitted {
        job_id,
        artifact_slide: selection.artifact.slide_name.clone(),
        transfer_learning: selection.transfer_learning,
        timestamp: Utc::now(),
    });
    state.spawn_poll(job_id, JobKind::Infer, slide_id, cancel);

    Ok(Json(SelectModelResponse {
        job_id,
        artifact: selection.artifact,
        transfer_learning: selection.transfer_learning,
    }))
}

/// Build model registry routes
pub fn model_routes() -> Router<AppState> {
    Router::new()
        .route("/api/models", get(list_models))
        .route("/api/models/select", post(select_model))
}
