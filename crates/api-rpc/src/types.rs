//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use serde::{Deserialize, Serialize};
use sitebatch_core::application::{BatchSpec, CompletionEstimate, ReleaseRate};
use sitebatch_core::domain::{Artifact, ItemFailure, Job, SchedulingPolicy};

/// jobs.create.v1 - Create a pending job from a batch
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub spec: BatchSpec,
}

/// jobs.start.v1 / jobs.pause.v1 / jobs.resume.v1 / jobs.cancel.v1 / jobs.get.v1
#[derive(Debug, Deserialize)]
pub struct JobIdRequest {
    pub job_id: String,
}

/// Compact view of a job (create/start/pause/resume/list)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: String,
    pub name: String,
    pub status: String,
    pub scheduling: String,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
    pub percent: f64,
    pub current_item: Option<String>,
    pub created_at: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id.clone(),
            name: job.name.clone(),
            status: job.status.to_string(),
            scheduling: job.scheduling.mode().to_string(),
            completed: job.progress.completed,
            failed: job.progress.failed,
            total: job.progress.total,
            percent: job.progress.percent(),
            current_item: job.progress.current_item_label.clone(),
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
        }
    }
}

/// jobs.get.v1 - Full job view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub summary: JobSummary,
    pub category: String,
    pub error: Option<String>,
    pub artifacts: Vec<Artifact>,
    pub failures: Vec<ItemFailure>,
}

impl From<&Job> for JobDetail {
    fn from(job: &Job) -> Self {
        Self {
            summary: JobSummary::from(job),
            category: job.category.clone(),
            error: job.error.clone(),
            artifacts: job.artifacts.clone(),
            failures: job.failures.clone(),
        }
    }
}

/// jobs.cancel.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub job_id: String,
    pub cancelled: bool,
}

/// jobs.list.v1 - Optional status filter
#[derive(Debug, Default, Deserialize)]
pub struct ListJobsRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobSummary>,
}

/// schedule.estimate.v1 - Completion horizon for a batch size
#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub total_items: u64,
    #[serde(default)]
    pub scheduling: SchedulingPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateResponse {
    pub days: u64,
    pub completion_date: i64,
    pub items_per_period: u64,
    pub period_days: u64,
}

impl EstimateResponse {
    pub fn new(estimate: CompletionEstimate, rate: ReleaseRate) -> Self {
        Self {
            days: estimate.days,
            completion_date: estimate.completion_date,
            items_per_period: rate.items_per_period,
            period_days: rate.period_days,
        }
    }
}
