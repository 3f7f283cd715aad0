// Batch Job Service - control surface for bulk website creation

pub mod create;


pub use create::{BatchSpec, KeywordSpec};

use crate::application::controller::{JobController, ProgressSnapshot};
use crate::application::estimator::{CompletionEstimate, ReleaseRate};
use crate::domain::{Job, SchedulingPolicy};
use crate::error::Result;
use crate::port::{IdProvider, TimeProvider};
use std::sync::Arc;
use tokio::sync::watch;

/// Batch Job Service
pub struct BatchJobService {
    controller: Arc<JobController>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl BatchJobService {
    pub fn new(
        controller: Arc<JobController>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            controller,
            id_provider,
            time_provider,
        }
    }

    pub fn controller(&self) -> &Arc<JobController> {
        &self.controller
    }

    /// Validate a batch and store it as a pending job
    pub async fn create_job(&self, spec: BatchSpec) -> Result<Job> {
        create::execute(
            &self.controller,
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            spec,
        )
        .await
    }

    /// Start a pending job; items are created in the background
    pub async fn start_job(&self, job_id: &str) -> Result<Job> {
        self.controller.start(job_id).await
    }

    pub async fn pause_job(&self, job_id: &str) -> Result<Job> {
        self.controller.pause(job_id).await
    }

    pub async fn resume_job(&self, job_id: &str) -> Result<Job> {
        self.controller.resume(job_id).await
    }

    /// Remove a job; a no-op (returning false) when it does not exist
    pub async fn cancel_job(&self, job_id: &str) -> Result<bool> {
        self.controller.cancel(job_id).await
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Job> {
        self.controller.get(job_id).await
    }

    pub async fn list_jobs(&self) -> Vec<Job> {
        self.controller.list().await
    }

    pub async fn watch_progress(&self, job_id: &str) -> Result<watch::Receiver<ProgressSnapshot>> {
        self.controller.subscribe(job_id).await
    }

    /// Completion horizon of `total_items` starting now
    pub fn estimate_completion(
        &self,
        total_items: u64,
        policy: &SchedulingPolicy,
    ) -> Result<CompletionEstimate> {
        policy.validate()?;
        Ok(self.controller.estimator().estimate_completion(
            total_items,
            policy,
            self.time_provider.now_millis(),
        ))
    }

    pub fn release_rate(&self, total_items: u64, policy: &SchedulingPolicy) -> Result<ReleaseRate> {
        policy.validate()?;
        Ok(self.controller.estimator().release_rate(total_items, policy))
    }
}
