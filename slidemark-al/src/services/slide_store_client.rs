//! Slide store client
//!
//! The dataset/slide metadata collaborator: keyed lookup of datasets and
//! slides plus the precomputed nucleus detections for a slide. Storage
//! itself is external; this service only browses it and loads detections
//! into the session's nucleus index.

use crate::models::{BoundingBox, Nucleus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Slide store client errors
#[derive(Debug, Error)]
pub enum SlideStoreError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Slide {0} has no nucleus detections")]
    NoDetections(String),
}

/// Dataset summary as served by the metadata collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slide_count: usize,
}

/// Slide summary as served by the metadata collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub x_size: u64,
    #[serde(default)]
    pub y_size: u64,
}

/// The metadata/detections collaborator contract
#[async_trait]
pub trait SlideStore: Send + Sync {
    async fn list_datasets(&self) -> Result<Vec<DatasetInfo>, SlideStoreError>;

    async fn list_slides(&self, dataset_id: i64) -> Result<Vec<SlideInfo>, SlideStoreError>;

    /// Ordered detection sequence for a slide; index is assigned by
    /// position in the sequence
    async fn fetch_nuclei(&self, slide_name: &str) -> Result<Vec<Nucleus>, SlideStoreError>;
}

#[derive(Debug, Deserialize)]
struct DatasetsResponse {
    #[serde(default)]
    datasets: Vec<DatasetInfo>,
}

#[derive(Debug, Deserialize)]
struct SlidesResponse {
    #[serde(default)]
    slides: Vec<SlideInfo>,
}

#[derive(Debug, Deserialize)]
struct NucleusRecord {
    x: f64,
    y: f64,
    bbox_x0: f64,
    bbox_y0: f64,
    bbox_x1: f64,
    bbox_y1: f64,
}

#[derive(Debug, Deserialize)]
struct NucleiResponse {
    #[serde(default)]
    nuclei: Vec<NucleusRecord>,
}

/// HTTP implementation of the slide store contract
pub struct HttpSlideStore {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpSlideStore {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SlideStoreError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SlideStoreError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: String,
    ) -> Result<T, SlideStoreError> {
        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .map_err(|e| SlideStoreError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlideStoreError::Api(status.as_u16(), body));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| SlideStoreError::Parse(e.to_string()))
    }
}

#[async_trait]
impl SlideStore for HttpSlideStore {
    async fn list_datasets(&self) -> Result<Vec<DatasetInfo>, SlideStoreError> {
        let response: DatasetsResponse = self.get_json("/api/datasets".to_string()).await?;
        Ok(response.datasets)
    }

    async fn list_slides(&self, dataset_id: i64) -> Result<Vec<SlideInfo>, SlideStoreError> {
        let response: SlidesResponse = self
            .get_json(format!("/api/datasets/{}/slides", dataset_id))
            .await?;
        Ok(response.slides)
    }

    async fn fetch_nuclei(&self, slide_name: &str) -> Result<Vec<Nucleus>, SlideStoreError> {
        let response: NucleiResponse =
            self.get_json(format!("/api/nuclei/{}", slide_name)).await?;

        if response.nuclei.is_empty() {
            return Err(SlideStoreError::NoDetections(slide_name.to_string()));
        }

        // Index is assigned by position in the detection sequence
        let nuclei: Vec<Nucleus> = response
            .nuclei
            .into_iter()
            .enumerate()
            .map(|(index, rec)| Nucleus {
                index,
                x: rec.x,
                y: rec.y,
                bbox: BoundingBox {
                    x0: rec.bbox_x0,
                    y0: rec.bbox_y0,
                    x1: rec.bbox_x1,
                    y1: rec.bbox_y1,
                },
            })
            .collect();

        tracing::info!(slide = slide_name, count = nuclei.len(), "Fetched nuclei");
        Ok(nuclei)
    }
}
