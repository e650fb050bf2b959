//! Shared test helpers: mock collaborators and request plumbing

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use slidemark_al::models::{
    BoundingBox, JobResults, JobStatus, JobStatusReport, ModelArtifact, Nucleus, Prediction,
    TrainingBatch,
};
use slidemark_al::services::{
    DatasetInfo, ModelServerApi, ModelServerError, SlideInfo, SlideStore, SlideStoreError,
};
use slidemark_al::{build_router, AppState, Config};
use slidemark_common::Label;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Model server stand-in: submissions are accepted (unless failure is
/// forced) and every job completes on its first status poll.
pub struct MockModelServer {
    pub fail_submissions: AtomicBool,
    pub artifacts: Mutex<Vec<ModelArtifact>>,
    /// (dataset_id, slide_id, sample_count, iteration) per accepted batch
    pub training_calls: Mutex<Vec<(i64, i64, usize, u32)>>,
    /// (dataset_id, slide_id, model_name) per accepted inference
    pub inference_calls: Mutex<Vec<(i64, i64, String)>>,
    results: Mutex<HashMap<Uuid, JobResults>>,
}

impl MockModelServer {
    pub fn new() -> Self {
        Self {
            fail_submissions: AtomicBool::new(false),
            artifacts: Mutex::new(Vec::new()),
            training_calls: Mutex::new(Vec::new()),
            inference_calls: Mutex::new(Vec::new()),
            results: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_artifact(self, slide_name: &str, valid: bool) -> Self {
        self.artifacts.lock().unwrap().push(ModelArtifact {
            slide_name: slide_name.to_string(),
            filename: format!("{}.pkl", slide_name),
            size_bytes: 4096,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            valid,
        });
        self
    }

    fn accept_job(&self) -> Result<Uuid, ModelServerError> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(ModelServerError::Network("connection refused".to_string()));
        }
        let job_id = Uuid::new_v4();
        self.results
            .lock()
            .unwrap()
            .insert(job_id, canned_results());
        Ok(job_id)
    }
}

/// Fixed result payload: three positives, two negatives
pub fn canned_results() -> JobResults {
    let predictions = vec![
        prediction(0, 10.0, 10.0, Label::Positive, 0.92),
        prediction(1, 110.0, 10.0, Label::Positive, 0.81),
        prediction(2, 210.0, 10.0, Label::Positive, 0.77),
        prediction(3, 310.0, 10.0, Label::Negative, 0.65),
        prediction(4, 410.0, 10.0, Label::Negative, 0.58),
    ];
    JobResults {
        slide_name: "slide-a".to_string(),
        total_count: predictions.len(),
        positive_count: 3,
        negative_count: 2,
        predictions,
    }
}

fn prediction(index: usize, x: f64, y: f64, label: Label, probability: f64) -> Prediction {
    Prediction {
        index,
        x,
        y,
        label,
        probability,
    }
}

#[async_trait]
impl ModelServerApi for MockModelServer {
    async fn submit_training(
        &self,
        dataset_id: i64,
        slide_id: i64,
        batch: &TrainingBatch,
    ) -> Result<Uuid, ModelServerError> {
        let job_id = self.accept_job()?;
        self.training_calls
            .lock()
            .unwrap()
            .push((dataset_id, slide_id, batch.len(), batch.iteration));
        Ok(job_id)
    }

    async fn submit_inference(
        &self,
        dataset_id: i64,
        slide_id: i64,
        model_name: &str,
    ) -> Result<Uuid, ModelServerError> {
        let job_id = self.accept_job()?;
        self.inference_calls
            .lock()
            .unwrap()
            .push((dataset_id, slide_id, model_name.to_string()));
        Ok(job_id)
    }

    async fn job_status(&self, _job_id: Uuid) -> Result<JobStatusReport, ModelServerError> {
        Ok(JobStatusReport {
            status: JobStatus::Completed,
            progress: 100,
            message: None,
        })
    }

    async fn job_results(&self, job_id: Uuid) -> Result<JobResults, ModelServerError> {
        self.results
            .lock()
            .unwrap()
            .get(&job_id)
            .cloned()
            .ok_or_else(|| ModelServerError::Api(404, "unknown job".to_string()))
    }

    async fn list_artifacts(&self) -> Result<Vec<ModelArtifact>, ModelServerError> {
        Ok(self.artifacts.lock().unwrap().clone())
    }
}

/// Slide store stand-in with one dataset and a grid of nuclei per slide
pub struct MockSlideStore {
    pub nucleus_count: usize,
}

#[async_trait]
impl SlideStore for MockSlideStore {
    async fn list_datasets(&self) -> Result<Vec<DatasetInfo>, SlideStoreError> {
        Ok(vec![DatasetInfo {
            id: 1,
            name: "breast-cancer".to_string(),
            slide_count: 2,
        }])
    }

    async fn list_slides(&self, dataset_id: i64) -> Result<Vec<SlideInfo>, SlideStoreError> {
        if dataset_id != 1 {
            return Err(SlideStoreError::Api(404, "no such dataset".to_string()));
        }
        Ok(vec![
            SlideInfo {
                id: 10,
                name: "slide-a".to_string(),
                x_size: 40_000,
                y_size: 30_000,
            },
            SlideInfo {
                id: 11,
                name: "slide-b".to_string(),
                x_size: 40_000,
                y_size: 30_000,
            },
        ])
    }

    async fn fetch_nuclei(&self, slide_name: &str) -> Result<Vec<Nucleus>, SlideStoreError> {
        if slide_name == "empty-slide" {
            return Err(SlideStoreError::NoDetections(slide_name.to_string()));
        }
        Ok(test_nuclei(self.nucleus_count))
    }
}

/// Nuclei on a row, centroids 100 units apart, 20x20 boxes
pub fn test_nuclei(count: usize) -> Vec<Nucleus> {
    (0..count)
        .map(|i| {
            let x = 10.0 + i as f64 * 100.0;
            Nucleus {
                index: i,
                x,
                y: 10.0,
                bbox: BoundingBox {
                    x0: x - 10.0,
                    y0: 0.0,
                    x1: x + 10.0,
                    y1: 20.0,
                },
            }
        })
        .collect()
}

/// App with fast polling so job completion is near-immediate
pub fn setup_app(server: Arc<MockModelServer>) -> (axum::Router, AppState) {
    let mut config = Config::default();
    config.polling.interval_ms = 1;
    config.polling.max_polls = 20;

    let state = AppState::new(
        config,
        server,
        Arc::new(MockSlideStore { nucleus_count: 40 }),
    );
    (build_router(state.clone()), state)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Select slide-a and return the response body
pub async fn select_slide_a(app: &axum::Router) -> Value {
    use tower::util::ServiceExt;
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/session/slide",
            serde_json::json!({
                "dataset_id": 1,
                "slide_id": 10,
                "slide_name": "slide-a"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    extract_json(response.into_body()).await
}

/// Toggle a label at the centroid of nucleus `index`
pub async fn toggle(app: &axum::Router, index: usize, label: &str) -> (StatusCode, Value) {
    use tower::util::ServiceExt;
    let x = 10.0 + index as f64 * 100.0;
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/session/toggle",
            serde_json::json!({ "x": x, "y": 10.0, "label": label }),
        ))
        .await
        .unwrap();
    let status = response.status();
    let body = extract_json(response.into_body()).await;
    (status, body)
}

/// Label nuclei [pos_from..pos_from+4) positive and
/// [neg_from..neg_from+4) negative
pub async fn label_full_batch(app: &axum::Router, pos_from: usize, neg_from: usize) {
    for i in pos_from..pos_from + 4 {
        let (status, _) = toggle(app, i, "positive").await;
        assert_eq!(status, StatusCode::OK);
    }
    for i in neg_from..neg_from + 4 {
        let (status, _) = toggle(app, i, "negative").await;
        assert_eq!(status, StatusCode::OK);
    }
}

/// Wait until the active job clears and predictions land, or panic
pub async fn wait_for_predictions(state: &AppState) {
    for _ in 0..500 {
        {
            let session = state.session.read().await;
            if session.active_job().is_none() && session.current_predictions().is_some() {
                return;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    panic!("predictions never arrived");
}
