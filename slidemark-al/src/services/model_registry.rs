//! Model artifact registry and transfer-learning mediation
//!
//! Catalogues previously trained artifacts, keyed by the slide they were
//! trained on. Validity comes from the catalogue's integrity check, never
//! from file presence; invalid artifacts are listed but can never be
//! selected. Selecting an artifact from a different slide than the active
//! one is the transfer-learning mode: surfaced as such, mechanically a
//! plain inference submission.

use crate::models::ModelArtifact;
use crate::services::model_server_client::{ModelServerApi, ModelServerError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No artifact named {0} in the registry")]
    NotFound(String),

    /// The artifact exists but failed its integrity check
    #[error("Artifact {0} failed its integrity check and cannot be selected")]
    ArtifactInvalid(String),

    #[error("Catalogue refresh failed: {0}")]
    Refresh(#[from] ModelServerError),
}

/// Outcome of selecting an artifact for inference
#[derive(Debug, Clone)]
pub struct TransferSelection {
    pub artifact: ModelArtifact,
    /// True when the artifact originates from a different slide than the
    /// one it will run on
    pub transfer_learning: bool,
}

/// Catalogue of trained artifacts, refreshed from the model server
pub struct ModelRegistry {
    server: Arc<dyn ModelServerApi>,
    artifacts: RwLock<Vec<ModelArtifact>>,
}

impl ModelRegistry {
    pub fn new(server: Arc<dyn ModelServerApi>) -> Self {
        Self {
            server,
            artifacts: RwLock::new(Vec::new()),
        }
    }

    /// Re-list the catalogue. Called on demand and opportunistically after
    /// any completed training job. Returns (total, valid) counts.
    pub async fn refresh(&self) -> Result<(usize, usize), RegistryError> {
        let mut artifacts = self.server.list_artifacts().await?;
        // Newest first, stable for equal timestamps
        artifacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let valid = artifacts.iter().filter(|a| a.valid).count();
        tracing::info!(total = artifacts.len(), valid, "Model catalogue refreshed");

        *self.artifacts.write().await = artifacts.clone();
        Ok((artifacts.len(), valid))
    }

    /// All known artifacts, invalid ones included (they are listed, just
    /// not selectable)
    pub async fn list(&self) -> Vec<ModelArtifact> {
        self.artifacts.read().await.clone()
    }

    /// A valid artifact trained on the given slide, if one exists.
    /// Drives the "model found" state on slide selection.
    pub async fn find_for_slide(&self, slide_name: &str) -> Option<ModelArtifact> {
        self.artifacts
            .read()
            .await
            .iter()
            .find(|a| a.valid && a.slide_name == slide_name)
            .cloned()
    }

    /// Select an artifact as the inference source for `active_slide`.
    ///
    /// Any valid artifact is allowed regardless of originating slide; a
    /// foreign origin flags the selection as transfer learning.
    pub async fn select_for_transfer(
        &self,
        artifact_name: &str,
        active_slide: &str,
    ) -> Result<TransferSelection, RegistryError> {
        let artifacts = self.artifacts.read().await;
        let artifact = artifacts
            .iter()
            .find(|a| a.slide_name == artifact_name)
            .ok_or_else(|| RegistryError::NotFound(artifact_name.to_string()))?;

        if !artifact.valid {
            return Err(RegistryError::ArtifactInvalid(artifact_name.to_string()));
        }

        let transfer_learning = artifact.slide_name != active_slide;
        if transfer_learning {
            tracing::info!(
                artifact = %artifact.slide_name,
                slide = active_slide,
                "Transfer learning: foreign artifact selected"
            );
        }

        Ok(TransferSelection {
            artifact: artifact.clone(),
            transfer_learning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobResults, JobStatusReport, TrainingBatch};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    struct FixedCatalogue(Vec<ModelArtifact>);

    #[async_trait]
    impl ModelServerApi for FixedCatalogue {
        async fn submit_training(
            &self,
            _: i64,
            _: i64,
            _: &TrainingBatch,
        ) -> Result<Uuid, ModelServerError> {
            unimplemented!("not used by registry tests")
        }

        async fn submit_inference(
            &self,
            _: i64,
            _: i64,
            _: &str,
        ) -> Result<Uuid, ModelServerError> {
            unimplemented!("not used by registry tests")
        }

        async fn job_status(&self, _: Uuid) -> Result<JobStatusReport, ModelServerError> {
            unimplemented!("not used by registry tests")
        }

        async fn job_results(&self, _: Uuid) -> Result<JobResults, ModelServerError> {
            unimplemented!("not used by registry tests")
        }

        async fn list_artifacts(&self) -> Result<Vec<ModelArtifact>, ModelServerError> {
            Ok(self.0.clone())
        }
    }

    fn artifact(slide: &str, valid: bool, day: u32) -> ModelArtifact {
        ModelArtifact {
            slide_name: slide.to_string(),
            filename: format!("{}.pkl", slide),
            size_bytes: 4096,
            created_at: Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap(),
            valid,
        }
    }

    async fn registry_with(artifacts: Vec<ModelArtifact>) -> ModelRegistry {
        let registry = ModelRegistry::new(Arc::new(FixedCatalogue(artifacts)));
        registry.refresh().await.unwrap();
        registry
    }

    #[tokio::test]
    async fn refresh_counts_and_sorts_newest_first() {
        let registry = registry_with(vec![
            artifact("old-slide", true, 1),
            artifact("new-slide", true, 20),
            artifact("broken-slide", false, 10),
        ])
        .await;

        let listed = registry.list().await;
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].slide_name, "new-slide");
        assert_eq!(listed[2].slide_name, "old-slide");
    }

    #[tokio::test]
    async fn find_for_slide_skips_invalid_artifacts() {
        let registry = registry_with(vec![
            artifact("slide-a", false, 5),
            artifact("slide-b", true, 6),
        ])
        .await;

        assert!(registry.find_for_slide("slide-a").await.is_none());
        assert!(registry.find_for_slide("slide-b").await.is_some());
        assert!(registry.find_for_slide("slide-c").await.is_none());
    }

    #[tokio::test]
    async fn same_slide_selection_is_not_transfer_learning() {
        let registry = registry_with(vec![artifact("slide-a", true, 5)]).await;
        let selection = registry
            .select_for_transfer("slide-a", "slide-a")
            .await
            .unwrap();
        assert!(!selection.transfer_learning);
    }

    #[tokio::test]
    async fn foreign_slide_selection_is_transfer_learning() {
        let registry = registry_with(vec![artifact("slide-a", true, 5)]).await;
        let selection = registry
            .select_for_transfer("slide-a", "slide-b")
            .await
            .unwrap();
        assert!(selection.transfer_learning);
        assert_eq!(selection.artifact.slide_name, "slide-a");
    }

    #[tokio::test]
    async fn invalid_artifact_is_listed_but_not_selectable() {
        let registry = registry_with(vec![artifact("slide-a", false, 5)]).await;
        assert_eq!(registry.list().await.len(), 1);
        assert!(matches!(
            registry.select_for_transfer("slide-a", "slide-b").await,
            Err(RegistryError::ArtifactInvalid(_))
        ));
    }

    #[tokio::test]
    async fn unknown_artifact_is_not_found() {
        let registry = registry_with(vec![]).await;
        assert!(matches!(
            registry.select_for_transfer("ghost", "slide-b").await,
            Err(RegistryError::NotFound(_))
        ));
    }
}
