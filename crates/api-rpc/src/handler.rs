//! RPC Method Handlers
//!
//! Thin adapters from JSON-RPC parameters to the batch job service.

use crate::error::to_rpc_error;
use crate::types::{
    CancelResponse, CreateJobRequest, EstimateRequest, EstimateResponse, JobDetail, JobIdRequest,
    JobSummary, ListJobsRequest, ListJobsResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use sitebatch_core::application::BatchJobService;
use sitebatch_core::domain::JobStatus;
use sitebatch_core::error::AppError;
use std::sync::Arc;
use tracing::info;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    service: Arc<BatchJobService>,
}

impl RpcHandler {
    pub fn new(service: Arc<BatchJobService>) -> Self {
        Self { service }
    }

    /// jobs.create.v1
    pub async fn create(&self, params: CreateJobRequest) -> Result<JobSummary, ErrorObjectOwned> {
        let job = self
            .service
            .create_job(params.spec)
            .await
            .map_err(to_rpc_error)?;

        info!(job_id = %job.id, total = job.progress.total, "Job created via RPC");
        Ok(JobSummary::from(&job))
    }

    /// jobs.start.v1
    pub async fn start(&self, params: JobIdRequest) -> Result<JobSummary, ErrorObjectOwned> {
        let job = self
            .service
            .start_job(&params.job_id)
            .await
            .map_err(to_rpc_error)?;
        Ok(JobSummary::from(&job))
    }

    /// jobs.pause.v1
    pub async fn pause(&self, params: JobIdRequest) -> Result<JobSummary, ErrorObjectOwned> {
        let job = self
            .service
            .pause_job(&params.job_id)
            .await
            .map_err(to_rpc_error)?;
        Ok(JobSummary::from(&job))
    }

    /// jobs.resume.v1
    pub async fn resume(&self, params: JobIdRequest) -> Result<JobSummary, ErrorObjectOwned> {
        let job = self
            .service
            .resume_job(&params.job_id)
            .await
            .map_err(to_rpc_error)?;
        Ok(JobSummary::from(&job))
    }

    /// jobs.cancel.v1 (a missing job is not an error)
    pub async fn cancel(&self, params: JobIdRequest) -> Result<CancelResponse, ErrorObjectOwned> {
        let cancelled = self
            .service
            .cancel_job(&params.job_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(CancelResponse {
            job_id: params.job_id,
            cancelled,
        })
    }

    /// jobs.get.v1
    pub async fn get(&self, params: JobIdRequest) -> Result<JobDetail, ErrorObjectOwned> {
        let job = self
            .service
            .get_job(&params.job_id)
            .await
            .map_err(to_rpc_error)?;
        Ok(JobDetail::from(&job))
    }

    /// jobs.list.v1
    pub async fn list(&self, params: ListJobsRequest) -> Result<ListJobsResponse, ErrorObjectOwned> {
        let status = match params.status.as_deref() {
            Some(s) => Some(
                s.parse::<JobStatus>()
                    .map_err(|e| to_rpc_error(AppError::from(e)))?,
            ),
            None => None,
        };

        let jobs = self
            .service
            .list_jobs()
            .await
            .iter()
            .filter(|job| status.map_or(true, |s| job.status == s))
            .map(JobSummary::from)
            .collect();

        Ok(ListJobsResponse { jobs })
    }

    /// schedule.estimate.v1
    pub async fn estimate(&self, params: EstimateRequest) -> Result<EstimateResponse, ErrorObjectOwned> {
        let estimate = self
            .service
            .estimate_completion(params.total_items, &params.scheduling)
            .map_err(to_rpc_error)?;
        let rate = self
            .service
            .release_rate(params.total_items, &params.scheduling)
            .map_err(to_rpc_error)?;

        Ok(EstimateResponse::new(estimate, rate))
    }
}
