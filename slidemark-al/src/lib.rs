//! slidemark-al library interface for testing
//!
//! Exposes public APIs for integration testing

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;

pub use crate::config::Config;
pub use crate::error::{ApiError, ApiResult};

use crate::models::PredictionSet;
use crate::services::{
    JobOrchestrator, JobOutcome, ModelRegistry, ModelServerApi, SlideStore,
};
use crate::state::SessionState;
use axum::Router;
use chrono::{DateTime, Utc};
use slidemark_common::events::{EventBus, SessionEvent};
use slidemark_common::types::JobKind;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// The single per-process annotation session
    pub session: Arc<RwLock<SessionState>>,
    pub registry: Arc<ModelRegistry>,
    pub orchestrator: Arc<JobOrchestrator>,
    pub slide_store: Arc<dyn SlideStore>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        config: Config,
        model_server: Arc<dyn ModelServerApi>,
        slide_store: Arc<dyn SlideStore>,
    ) -> Self {
        let event_bus = EventBus::new(config.event_capacity);
        let orchestrator = JobOrchestrator::new(
            model_server.clone(),
            event_bus.clone(),
            Duration::from_millis(config.polling.interval_ms),
            config.polling.max_polls,
        );
        let session = SessionState::new(config.heatmap.default_bin_size);

        Self {
            config: Arc::new(config),
            event_bus,
            session: Arc::new(RwLock::new(session)),
            registry: Arc::new(ModelRegistry::new(model_server)),
            orchestrator: Arc::new(orchestrator),
            slide_store,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Drive an accepted job to its terminal outcome on a background
    /// task. The outcome is applied only if the job is still current
    /// when polling ends; a superseded job's results are dropped.
    pub fn spawn_poll(
        &self,
        job_id: Uuid,
        kind: JobKind,
        slide_id: i64,
        cancel: CancellationToken,
    ) {
        let state = self.clone();
        tokio::spawn(async move {
            let outcome = state
                .orchestrator
                .poll_to_completion(job_id, kind, cancel)
                .await;

            let mut refresh_registry = false;
            {
                let mut session = state.session.write().await;
                if !session.is_current_job(job_id) {
                    tracing::debug!(%job_id, "Dropping outcome of a superseded job");
                    return;
                }
                session.clear_active_job();

                match outcome {
                    JobOutcome::Completed(results) => {
                        let set = PredictionSet {
                            job_id,
                            slide_id,
                            positive_count: results.positive_count,
                            negative_count: results.negative_count,
                            predictions: results.predictions,
                            fetched_at: Utc::now(),
                        };
                        let count = set.total_count();
                        if session.replace_predictions(set) {
                            let zoom = session.view.zoom;
                            session
                                .view
                                .reduce(zoom, state.config.view.zoom_threshold, true);
                            state.event_bus.emit(SessionEvent::PredictionsReplaced {
                                job_id,
                                slide_id,
                                count,
                                timestamp: Utc::now(),
                            });
                        }
                        // New artifacts only exist after training
                        refresh_registry = kind == JobKind::Train;
                    }
                    JobOutcome::Failed { ref message } => {
                        *state.last_error.write().await = Some(message.clone());
                    }
                    JobOutcome::TimedOut { .. } | JobOutcome::Cancelled => {}
                }
            }

            if refresh_registry {
                match state.registry.refresh().await {
                    Ok((artifact_count, valid_count)) => {
                        state.event_bus.emit(SessionEvent::RegistryRefreshed {
                            artifact_count,
                            valid_count,
                            timestamp: Utc::now(),
                        });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Registry refresh after training failed");
                    }
                }
            }
        });
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::session_routes())
        .merge(api::dataset_routes())
        .merge(api::model_routes())
        .merge(api::view_routes())
        .route("/events", get(api::session_event_stream))
        .merge(api::health_routes())
        .with_state(state)
}
