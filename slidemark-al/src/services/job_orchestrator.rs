//! Asynchronous job orchestration
//!
//! Turns a validated training (or inference-only) request into a remote
//! job id and drives a bounded polling loop to a terminal outcome. The
//! loop is cooperatively cancellable: a new submission cancels the
//! previous loop's token before issuing its own job, and the owner of the
//! loop re-checks job identity before applying results, so a superseded
//! job can never overwrite current state.
//!
//! Transient fetch errors never kill a job; only an explicit `error`
//! status or an exhausted poll budget is terminal. Results of a completed
//! job are fetched at most once, even when completion is observed on
//! several consecutive polls.

use crate::models::{JobResults, JobStatus};
use crate::services::model_server_client::{ModelServerApi, ModelServerError};
use crate::models::TrainingBatch;
use slidemark_common::events::{EventBus, SessionEvent};
use slidemark_common::types::JobKind;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Terminal outcome of one polling run
#[derive(Debug)]
pub enum JobOutcome {
    /// Job completed and results were fetched exactly once
    Completed(JobResults),
    /// Remote job reported failure
    Failed { message: String },
    /// Poll budget exhausted; the job's true outcome is unknown and the
    /// remote job was NOT cancelled
    TimedOut { polls: u32 },
    /// Superseded by a newer submission or a slide change
    Cancelled,
}

/// Drives submissions and polling against the model server
pub struct JobOrchestrator {
    server: Arc<dyn ModelServerApi>,
    event_bus: EventBus,
    poll_interval: Duration,
    max_polls: u32,
}

impl JobOrchestrator {
    pub fn new(
        server: Arc<dyn ModelServerApi>,
        event_bus: EventBus,
        poll_interval: Duration,
        max_polls: u32,
    ) -> Self {
        Self {
            server,
            event_bus,
            poll_interval,
            max_polls,
        }
    }

    /// Submit an accumulated training batch.
    ///
    /// The initial submission is not retried; any failure surfaces
    /// immediately and no polling starts.
    pub async fn submit_training(
        &self,
        dataset_id: i64,
        slide_id: i64,
        batch: &TrainingBatch,
    ) -> Result<Uuid, ModelServerError> {
        let job_id = self
            .server
            .submit_training(dataset_id, slide_id, batch)
            .await?;
        tracing::info!(
            %job_id,
            dataset_id,
            slide_id,
            iteration = batch.iteration,
            samples = batch.len(),
            "Training job accepted"
        );
        Ok(job_id)
    }

    /// Submit an inference-only request carrying an artifact reference
    pub async fn submit_inference(
        &self,
        dataset_id: i64,
        slide_id: i64,
        model_name: &str,
    ) -> Result<Uuid, ModelServerError> {
        let job_id = self
            .server
            .submit_inference(dataset_id, slide_id, model_name)
            .await?;
        tracing::info!(%job_id, dataset_id, slide_id, model_name, "Inference job accepted");
        Ok(job_id)
    }

    /// Poll the job to a terminal outcome.
    ///
    /// Each tick fetches `{status, progress}`. `running` reports progress
    /// (monotonically non-decreasing) and continues; `completed` stops
    /// polling and fetches the result payload once; `error` stops and
    /// surfaces the message. Exceeding the poll budget yields `TimedOut`
    /// without cancelling the remote job.
    pub async fn poll_to_completion(
        &self,
        job_id: Uuid,
        kind: JobKind,
        cancel: CancellationToken,
    ) -> JobOutcome {
        let mut last_progress: u8 = 0;
        let mut completed_seen = false;

        for poll in 1..=self.max_polls {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(%job_id, poll, "Poll loop cancelled");
                    return JobOutcome::Cancelled;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            if !completed_seen {
                let report = match self.server.job_status(job_id).await {
                    Ok(report) => report,
                    Err(e) if e.is_transient() => {
                        tracing::debug!(%job_id, poll, error = %e, "Transient status fetch failure, retrying");
                        continue;
                    }
                    Err(e) => {
                        // Not a job failure; retry on the next tick like
                        // any other fetch problem
                        tracing::warn!(%job_id, poll, error = %e, "Status fetch failed, retrying");
                        continue;
                    }
                };

                match report.status {
                    JobStatus::Pending => continue,
                    JobStatus::Running => {
                        // Remote progress may jitter; report it as
                        // monotonically non-decreasing
                        let progress = report.progress.max(last_progress);
                        if progress != last_progress {
                            last_progress = progress;
                        }
                        self.event_bus.emit(SessionEvent::JobProgress {
                            job_id,
                            kind,
                            progress,
                            timestamp: chrono::Utc::now(),
                        });
                        continue;
                    }
                    JobStatus::Error => {
                        let message = report
                            .message
                            .unwrap_or_else(|| "job failed without a message".to_string());
                        tracing::warn!(%job_id, poll, error = %message, "Job reported failure");
                        self.event_bus.emit(SessionEvent::JobFailed {
                            job_id,
                            kind,
                            error: message.clone(),
                            timestamp: chrono::Utc::now(),
                        });
                        return JobOutcome::Failed { message };
                    }
                    JobStatus::Completed => {
                        completed_seen = true;
                    }
                }
            }

            // completed_seen: fetch results, retrying transient failures
            // on subsequent ticks without re-reading status
            match self.server.job_results(job_id).await {
                Ok(results) => {
                    self.event_bus.emit(SessionEvent::JobCompleted {
                        job_id,
                        kind,
                        total_count: results.total_count,
                        positive_count: results.positive_count,
                        negative_count: results.negative_count,
                        timestamp: chrono::Utc::now(),
                    });
                    return JobOutcome::Completed(results);
                }
                Err(e) if e.is_transient() => {
                    tracing::debug!(%job_id, poll, error = %e, "Transient results fetch failure, retrying");
                    continue;
                }
                Err(e) => {
                    let message = format!("results fetch failed: {}", e);
                    tracing::error!(%job_id, poll, error = %e, "Results permanently unavailable");
                    self.event_bus.emit(SessionEvent::JobFailed {
                        job_id,
                        kind,
                        error: message.clone(),
                        timestamp: chrono::Utc::now(),
                    });
                    return JobOutcome::Failed { message };
                }
            }
        }

        tracing::warn!(%job_id, polls = self.max_polls, "Poll budget exhausted");
        self.event_bus.emit(SessionEvent::JobTimedOut {
            job_id,
            kind,
            polls: self.max_polls,
            timestamp: chrono::Utc::now(),
        });
        JobOutcome::TimedOut {
            polls: self.max_polls,
        }
    }
}
