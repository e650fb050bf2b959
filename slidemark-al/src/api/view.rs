//! View endpoints: zoom-driven overlay mode, heatmap bin sizing, and
//! overlay payloads (prediction markers and the binned density heatmap).

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::models::{OverlayMode, PredictionSet};
use crate::services::{aggregate, Heatmap};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ZoomRequest {
    pub zoom: f64,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub mode: OverlayMode,
    pub zoom: f64,
    pub bin_size: f64,
}

/// POST /api/view/zoom
///
/// Report a zoom change; the overlay mode is recomputed from the zoom
/// level and whether predictions exist for the active slide.
pub async fn set_zoom(
    State(state): State<AppState>,
    Json(req): Json<ZoomRequest>,
) -> ApiResult<Json<ViewResponse>> {
    if !req.zoom.is_finite() || req.zoom <= 0.0 {
        return Err(ApiError::BadRequest("zoom must be a positive number".into()));
    }

    let mut session = state.session.write().await;
    let predictions_available = session.current_predictions().is_some();
    session
        .view
        .reduce(req.zoom, state.config.view.zoom_threshold, predictions_available);

    Ok(Json(ViewResponse {
        mode: session.view.mode,
        zoom: session.view.zoom,
        bin_size: session.view.bin_size,
    }))
}

#[derive(Debug, Deserialize)]
pub struct BinSizeRequest {
    pub bin_size: f64,
}

/// POST /api/view/bin-size
///
/// Set the heatmap bin edge length; out-of-range requests are clamped to
/// the configured bounds rather than rejected.
pub async fn set_bin_size(
    State(state): State<AppState>,
    Json(req): Json<BinSizeRequest>,
) -> ApiResult<Json<ViewResponse>> {
    if !req.bin_size.is_finite() {
        return Err(ApiError::BadRequest("bin_size must be a number".into()));
    }

    let clamped = state.config.clamp_bin_size(req.bin_size);
    let mut session = state.session.write().await;
    session.view.bin_size = clamped;

    Ok(Json(ViewResponse {
        mode: session.view.mode,
        zoom: session.view.zoom,
        bin_size: clamped,
    }))
}

/// GET /api/view/heatmap
///
/// Positive-prediction density binned at the current bin size. Only
/// predictions tagged with the active slide are aggregated.
pub async fn get_heatmap(State(state): State<AppState>) -> ApiResult<Json<Heatmap>> {
    let session = state.session.read().await;
    let set = session
        .current_predictions()
        .ok_or_else(|| ApiError::NotFound("No predictions for the active slide".into()))?;
    Ok(Json(aggregate(&set.predictions, session.view.bin_size)))
}

/// GET /api/view/predictions
///
/// The full prediction marker set for the active slide.
pub async fn get_predictions(State(state): State<AppState>) -> ApiResult<Json<PredictionSet>> {
    let session = state.session.read().await;
    let set = session
        .current_predictions()
        .cloned()
        .ok_or_else(|| ApiError::NotFound("No predictions for the active slide".into()))?;
    Ok(Json(set))
}

/// Build view routes
pub fn view_routes() -> Router<AppState> {
    Router::new()
        .route("/api/view/zoom", post(set_zoom))
        .route("/api/view/bin-size", post(set_bin_size))
        .route("/api/view/heatmap", get(get_heatmap))
        .route("/api/view/predictions", get(get_predictions))
}
