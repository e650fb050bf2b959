//! Model server client
//!
//! The training/inference collaborator: accepts batches and artifact
//! references, reports job status, serves result payloads, and lists the
//! artifact catalogue (each entry carrying the server-computed integrity
//! flag). The trait exists so the orchestrator and registry can run
//! against an in-process fake in tests.

use crate::models::{JobResults, JobStatusReport, ModelArtifact, TrainingBatch};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Model server client errors
#[derive(Debug, Error)]
pub enum ModelServerError {
    /// Transport-level failure; safe to retry on the next poll tick
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Response body did not parse
    #[error("Parse error: {0}")]
    Parse(String),

    /// The server processed the request and said no
    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl ModelServerError {
    /// Only transport failures are transient; an explicit rejection or a
    /// malformed payload will not get better by retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, ModelServerError::Network(_))
    }
}

/// The training/inference collaborator contract
#[async_trait]
pub trait ModelServerApi: Send + Sync {
    /// Submit an accumulated training batch; returns the server-assigned
    /// job id
    async fn submit_training(
        &self,
        dataset_id: i64,
        slide_id: i64,
        batch: &TrainingBatch,
    ) -> Result<Uuid, ModelServerError>;

    /// Submit an inference-only request carrying an artifact reference
    async fn submit_inference(
        &self,
        dataset_id: i64,
        slide_id: i64,
        model_name: &str,
    ) -> Result<Uuid, ModelServerError>;

    async fn job_status(&self, job_id: Uuid) -> Result<JobStatusReport, ModelServerError>;

    /// Result payload of a completed job
    async fn job_results(&self, job_id: Uuid) -> Result<JobResults, ModelServerError>;

    /// Artifact catalogue with server-computed validity flags
    async fn list_artifacts(&self) -> Result<Vec<ModelArtifact>, ModelServerError>;
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    success: bool,
    #[serde(default)]
    job_id: Option<Uuid>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogueResponse {
    success: bool,
    #[serde(default)]
    models: Vec<ModelArtifact>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP implementation of the model server contract
pub struct HttpModelServer {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpModelServer {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ModelServerError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ModelServerError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn check<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, ModelServerError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelServerError::Api(status.as_u16(), body));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ModelServerError::Parse(e.to_string()))
    }

    fn job_id_from(response: SubmitResponse) -> Result<Uuid, ModelServerError> {
        if !response.success {
            return Err(ModelServerError::Rejected(
                response.error.unwrap_or_else(|| "no reason given".to_string()),
            ));
        }
        response
            .job_id
            .ok_or_else(|| ModelServerError::Parse("accepted submission without a job id".into()))
    }
}

#[async_trait]
impl ModelServerApi for HttpModelServer {
    async fn submit_training(
        &self,
        dataset_id: i64,
        slide_id: i64,
        batch: &TrainingBatch,
    ) -> Result<Uuid, ModelServerError> {
        tracing::debug!(
            dataset_id,
            slide_id,
            samples = batch.len(),
            iteration = batch.iteration,
            "Submitting training batch"
        );

        let response = self
            .http_client
            .post(format!("{}/api/ml/train", self.base_url))
            .json(&json!({
                "dataset_id": dataset_id,
                "slide_id": slide_id,
                "iteration": batch.iteration,
                "annotations": batch.samples,
            }))
            .send()
            .await
            .map_err(|e| ModelServerError::Network(e.to_string()))?;

        Self::job_id_from(Self::check::<SubmitResponse>(response).await?)
    }

    async fn submit_inference(
        &self,
        dataset_id: i64,
        slide_id: i64,
        model_name: &str,
    ) -> Result<Uuid, ModelServerError> {
        tracing::debug!(dataset_id, slide_id, model_name, "Submitting inference request");

        let response = self
            .http_client
            .post(format!("{}/api/ml/predict-with-model", self.base_url))
            .json(&json!({
                "dataset_id": dataset_id,
                "slide_id": slide_id,
                "model_name": model_name,
            }))
            .send()
            .await
            .map_err(|e| ModelServerError::Network(e.to_string()))?;

        Self::job_id_from(Self::check::<SubmitResponse>(response).await?)
    }

    async fn job_status(&self, job_id: Uuid) -> Result<JobStatusReport, ModelServerError> {
        let response = self
            .http_client
            .get(format!("{}/api/ml/status/{}", self.base_url, job_id))
            .send()
            .await
            .map_err(|e| ModelServerError::Network(e.to_string()))?;

        Self::check::<JobStatusReport>(response).await
    }

    async fn job_results(&self, job_id: Uuid) -> Result<JobResults, ModelServerError> {
        let response = self
            .http_client
            .get(format!("{}/api/ml/predictions/{}", self.base_url, job_id))
            .send()
            .await
            .map_err(|e| ModelServerError::Network(e.to_string()))?;

        let results = Self::check::<JobResults>(response).await?;
        tracing::info!(
            %job_id,
            total = results.total_count,
            positive = results.positive_count,
            negative = results.negative_count,
            "Fetched job results"
        );
        Ok(results)
    }

    async fn list_artifacts(&self) -> Result<Vec<ModelArtifact>, ModelServerError> {
        let response = self
            .http_client
            .get(format!("{}/api/ml/models/list", self.base_url))
            .send()
            .await
            .map_err(|e| ModelServerError::Network(e.to_string()))?;

        let catalogue = Self::check::<CatalogueResponse>(response).await?;
        if !catalogue.success {
            return Err(ModelServerError::Rejected(
                catalogue.error.unwrap_or_else(|| "catalogue unavailable".to_string()),
            ));
        }
        Ok(catalogue.models)
    }
}
