// Job Controller - job store and lifecycle state machine

pub mod constants;
mod runner;
mod signal;


pub use signal::{signal_channel, JobSignal, SignalReceiver, SignalSender};

use crate::application::allocator;
use crate::application::estimator::ScheduleEstimator;
use crate::application::retry::RetryPolicy;
use crate::domain::{DomainError, Job, JobId, JobStatus, Progress};
use crate::error::Result;
use crate::port::{ArtifactCreator, JobRepository, TimeProvider};
use constants::DEFAULT_IMMEDIATE_DELAY_MS;
use runner::JobRunner;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{error, info, warn};

/// Engine tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Gap between items in `immediate` mode
    pub immediate_delay_ms: i64,
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            immediate_delay_ms: DEFAULT_IMMEDIATE_DELAY_MS,
            retry: RetryPolicy::default(),
        }
    }
}

/// Point-in-time view of a job's progress, published on every change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: Progress,
}

impl From<&Job> for ProgressSnapshot {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id.clone(),
            status: job.status,
            progress: job.progress.clone(),
        }
    }
}

/// In-memory home of one job
///
/// The mutex serializes control operations with the runner's commits, so a
/// published snapshot never goes backwards.
pub(crate) struct JobSlot {
    pub(crate) job_id: JobId,
    pub(crate) job: Mutex<Job>,
    pub(crate) signal: SignalSender,
    pub(crate) progress: watch::Sender<ProgressSnapshot>,
}

impl JobSlot {
    fn new(job: Job) -> Self {
        let initial = match job.status {
            JobStatus::Paused => JobSignal::Pause,
            _ => JobSignal::Run,
        };
        let (signal, _) = signal_channel(initial);
        let (progress, _) = watch::channel(ProgressSnapshot::from(&job));
        Self {
            job_id: job.id.clone(),
            job: Mutex::new(job),
            signal,
            progress,
        }
    }

    pub(crate) fn publish(&self, job: &Job) {
        self.progress.send_replace(ProgressSnapshot::from(job));
    }
}

/// Owns every known job and drives the lifecycle
///
/// State machine:
/// ```text
/// pending --start--> running --pause--> paused --resume--> running
/// running --(all items done)--> completed
/// pending|running --(plan or store error)--> failed
/// any non-terminal --cancel--> removed
/// ```
pub struct JobController {
    repo: Arc<dyn JobRepository>,
    creator: Arc<dyn ArtifactCreator>,
    time: Arc<dyn TimeProvider>,
    estimator: ScheduleEstimator,
    retry: RetryPolicy,
    slots: RwLock<HashMap<JobId, Arc<JobSlot>>>,
}

impl JobController {
    pub fn new(
        repo: Arc<dyn JobRepository>,
        creator: Arc<dyn ArtifactCreator>,
        time: Arc<dyn TimeProvider>,
        config: EngineConfig,
    ) -> Self {
        Self {
            repo,
            creator,
            time,
            estimator: ScheduleEstimator::new(config.immediate_delay_ms),
            retry: config.retry,
            slots: RwLock::new(HashMap::new()),
        }
    }

    pub fn estimator(&self) -> &ScheduleEstimator {
        &self.estimator
    }

    pub fn now_millis(&self) -> i64 {
        self.time.now_millis()
    }

    async fn slot(&self, job_id: &str) -> Result<Arc<JobSlot>> {
        self.slots
            .read()
            .await
            .get(job_id)
            .cloned()
            .ok_or_else(|| DomainError::JobNotFound(job_id.to_string()).into())
    }

    fn spawn_runner(&self, slot: Arc<JobSlot>) {
        let runner = JobRunner {
            signals: slot.signal.subscribe(),
            slot,
            repo: Arc::clone(&self.repo),
            creator: Arc::clone(&self.creator),
            time: Arc::clone(&self.time),
            estimator: self.estimator,
            retry: self.retry,
        };
        tokio::spawn(runner.run());
    }

    /// Store a new pending job
    pub async fn register(&self, job: Job) -> Result<Job> {
        if job.status != JobStatus::Pending {
            return Err(DomainError::InvalidStateTransition {
                from: job.status.to_string(),
                to: JobStatus::Pending.to_string(),
            }
            .into());
        }

        self.repo.insert(&job).await?;
        let snapshot = job.clone();
        self.slots
            .write()
            .await
            .insert(job.id.clone(), Arc::new(JobSlot::new(job)));

        info!(
            job_id = %snapshot.id,
            total = snapshot.progress.total,
            scheduling = snapshot.scheduling.mode(),
            "Job registered"
        );
        Ok(snapshot)
    }

    /// pending -> running: freeze the allocation plan and attach a runner
    ///
    /// A plan that cannot be built moves the job to failed and the error is
    /// returned.
    pub async fn start(&self, job_id: &str) -> Result<Job> {
        let slot = self.slot(job_id).await?;
        let mut job = slot.job.lock().await;

        if job.status != JobStatus::Pending {
            return Err(DomainError::InvalidStateTransition {
                from: job.status.to_string(),
                to: JobStatus::Running.to_string(),
            }
            .into());
        }

        let now = self.time.now_millis();
        let plan = match allocator::build_plan(&job.items, &job.distributions) {
            Ok(plan) => plan,
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Allocation plan could not be built");
                job.fail(now, e.to_string())?;
                if let Err(persist_error) = self.repo.update(&job).await {
                    warn!(job_id = %job_id, error = %persist_error, "Failed state not persisted");
                }
                slot.publish(&job);
                return Err(e.into());
            }
        };

        let mut started = job.clone();
        started.start(now, plan)?;
        self.repo.update(&started).await?;
        *job = started;

        slot.signal.send(JobSignal::Run);
        slot.publish(&job);
        self.spawn_runner(Arc::clone(&slot));

        info!(job_id = %job_id, total = job.progress.total, "Job started");
        Ok(job.clone())
    }

    /// running -> paused; an item already in flight is still recorded
    pub async fn pause(&self, job_id: &str) -> Result<Job> {
        let slot = self.slot(job_id).await?;
        let mut job = slot.job.lock().await;

        job.pause()?;
        if let Err(e) = self.repo.update(&job).await {
            job.status = JobStatus::Running;
            return Err(e);
        }

        slot.signal.send(JobSignal::Pause);
        slot.publish(&job);
        info!(job_id = %job_id, completed = job.progress.completed, "Job paused");
        Ok(job.clone())
    }

    /// paused -> running, continuing with the first unprocessed item
    pub async fn resume(&self, job_id: &str) -> Result<Job> {
        let slot = self.slot(job_id).await?;
        let mut job = slot.job.lock().await;

        job.resume()?;
        if let Err(e) = self.repo.update(&job).await {
            job.status = JobStatus::Paused;
            return Err(e);
        }

        slot.signal.send(JobSignal::Run);
        slot.publish(&job);
        info!(job_id = %job_id, remaining = job.progress.remaining(), "Job resumed");
        Ok(job.clone())
    }

    /// Stop and remove a non-terminal job
    ///
    /// Returns false when the job is unknown. Once this returns, no further
    /// artifact is recorded for the job.
    pub async fn cancel(&self, job_id: &str) -> Result<bool> {
        let slot = match self.slots.read().await.get(job_id).cloned() {
            Some(slot) => slot,
            None => return Ok(false),
        };

        {
            let job = slot.job.lock().await;
            job.ensure_cancellable()?;
            self.repo.delete(job_id).await?;
            slot.signal.send(JobSignal::Cancel);
            info!(
                job_id = %job_id,
                completed = job.progress.completed,
                "Job cancelled"
            );
        }

        self.slots.write().await.remove(job_id);
        Ok(true)
    }

    pub async fn get(&self, job_id: &str) -> Result<Job> {
        let slot = self.slot(job_id).await?;
        let job = slot.job.lock().await;
        Ok(job.clone())
    }

    /// All jobs, oldest first
    pub async fn list(&self) -> Vec<Job> {
        let slots: Vec<Arc<JobSlot>> = self.slots.read().await.values().cloned().collect();

        let mut jobs = Vec::with_capacity(slots.len());
        for slot in slots {
            jobs.push(slot.job.lock().await.clone());
        }
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        jobs
    }

    /// Live progress updates of a job
    pub async fn subscribe(&self, job_id: &str) -> Result<watch::Receiver<ProgressSnapshot>> {
        let slot = self.slot(job_id).await?;
        Ok(slot.progress.subscribe())
    }

    /// Load persisted jobs and re-attach runners to running and paused ones
    ///
    /// # Returns
    /// Number of runners attached
    pub async fn restore(&self) -> Result<usize> {
        let jobs = self.repo.list_all().await?;
        info!(count = jobs.len(), "Restoring persisted jobs");

        let mut attached = 0;
        for job in jobs {
            let resumable = matches!(job.status, JobStatus::Running | JobStatus::Paused);
            let job_id = job.id.clone();
            let status = job.status;

            let slot = {
                let mut slots = self.slots.write().await;
                if slots.contains_key(&job_id) {
                    continue;
                }
                let slot = Arc::new(JobSlot::new(job));
                slots.insert(job_id.clone(), Arc::clone(&slot));
                slot
            };

            if resumable {
                info!(job_id = %job_id, status = %status, "Re-attaching job runner");
                self.spawn_runner(slot);
                attached += 1;
            }
        }

        Ok(attached)
    }
}
