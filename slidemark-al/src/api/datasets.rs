//! Dataset and slide browsing endpoints
//!
//! Thin proxy over the slide store collaborator so the UI has a single
//! origin to talk to.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::error::ApiResult;
use crate::services::{DatasetInfo, SlideInfo};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DatasetsResponse {
    pub datasets: Vec<DatasetInfo>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SlidesResponse {
    pub dataset_id: i64,
    pub slides: Vec<SlideInfo>,
    pub count: usize,
}

/// GET /api/datasets
pub async fn list_datasets(State(state): State<AppState>) -> ApiResult<Json<DatasetsResponse>> {
    let datasets = state.slide_store.list_datasets().await?;
    let count = datasets.len();
    Ok(Json(DatasetsResponse { datasets, count }))
}

/// GET /api/datasets/:dataset_id/slides
pub async fn list_slides(
    State(state): State<AppState>,
    Path(dataset_id): Path<i64>,
) -> ApiResult<Json<SlidesResponse>> {
    let slides = state.slide_store.list_slides(dataset_id).await?;
    let count = slides.len();
    Ok(Json(SlidesResponse {
        dataset_id,
        slides,
        count,
    }))
}

/// Build dataset browsing routes
pub fn dataset_routes() -> Router<AppState> {
    Router::new()
        .route("/api/datasets", get(list_datasets))
        .route("/api/datasets/:dataset_id/slides", get(list_slides))
}
