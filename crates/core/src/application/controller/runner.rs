// Job runner - executes the work items of one job, one at a time

use super::signal::{JobSignal, SignalReceiver};
use super::JobSlot;
use crate::application::estimator::ScheduleEstimator;
use crate::application::retry::{RetryDecision, RetryPolicy};
use crate::domain::{Artifact, ItemFailure, Job, JobStatus, ResourceAssignment, ResourceKind};
use crate::port::{ArtifactCreator, ArtifactError, ArtifactRequest, JobRepository, TimeProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

enum Flow {
    Continue,
    Stop,
}

enum Wait {
    Elapsed,
    Interrupted,
    Stop,
}

enum Outcome {
    Produced { artifact: Artifact, attempts: u32 },
    Failed { reason: String, attempts: u32 },
    Interrupted,
}

enum Next {
    Item(ArtifactRequest),
    Restart,
}

/// Long-lived execution loop of a single job
///
/// Each iteration:
/// 1. Park while paused, stop when cancelled
/// 2. Complete the job once every item has an outcome
/// 3. Wait until the scheduling policy allows the next item
/// 4. Create the artifact (retrying transient errors)
/// 5. Commit the outcome unless the job was cancelled meanwhile
pub(crate) struct JobRunner {
    pub(crate) slot: Arc<JobSlot>,
    pub(crate) signals: SignalReceiver,
    pub(crate) repo: Arc<dyn JobRepository>,
    pub(crate) creator: Arc<dyn ArtifactCreator>,
    pub(crate) time: Arc<dyn TimeProvider>,
    pub(crate) estimator: ScheduleEstimator,
    pub(crate) retry: RetryPolicy,
}

impl JobRunner {
    pub(crate) async fn run(mut self) {
        let job_id = self.slot.job_id.clone();
        info!(job_id = %job_id, "Job runner started");

        loop {
            if let Flow::Stop = self.await_runnable().await {
                break;
            }
            if self.finish_if_exhausted().await {
                break;
            }
            match self.pace().await {
                Wait::Elapsed => {}
                Wait::Interrupted => continue,
                Wait::Stop => break,
            }

            let request = match self.prepare_next().await {
                Next::Item(request) => request,
                Next::Restart => continue,
            };

            let outcome = self.produce(request.clone()).await;
            if let Flow::Stop = self.commit(&request, outcome).await {
                break;
            }
        }

        info!(job_id = %job_id, "Job runner stopped");
    }

    /// Park while paused
    async fn await_runnable(&mut self) -> Flow {
        loop {
            match self.signals.current() {
                JobSignal::Run => return Flow::Continue,
                JobSignal::Cancel => return Flow::Stop,
                JobSignal::Pause => {
                    debug!(job_id = %self.slot.job_id, "Job parked");
                    if self.signals.changed().await.is_none() {
                        return Flow::Stop;
                    }
                }
            }
        }
    }

    /// Sleep for `delay_ms` unless a control signal arrives first
    async fn sleep_interruptible(&mut self, delay_ms: i64) -> Wait {
        if delay_ms <= 0 {
            return Wait::Elapsed;
        }
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(delay_ms as u64)) => Wait::Elapsed,
            changed = self.signals.changed() => match changed {
                Some(_) => Wait::Interrupted,
                None => Wait::Stop,
            },
        }
    }

    /// Returns true when the runner has nothing left to do
    async fn finish_if_exhausted(&mut self) -> bool {
        let mut job = self.slot.job.lock().await;
        if self.signals.peek() != JobSignal::Run || job.status != JobStatus::Running {
            return false;
        }
        if !job.is_exhausted() {
            return false;
        }

        let now = self.time.now_millis();
        if let Err(e) = job.complete(now) {
            error!(job_id = %job.id, error = %e, "Could not complete job");
            return true;
        }
        if let Err(e) = self.repo.update(&job).await {
            self.fail_job(&mut job, format!("progress could not be persisted: {}", e))
                .await;
            return true;
        }

        info!(
            job_id = %job.id,
            completed = job.progress.completed,
            failed = job.progress.failed,
            "Job completed"
        );
        self.slot.publish(&job);
        true
    }

    /// Honor the scheduling policy before the next item
    async fn pace(&mut self) -> Wait {
        let eligible_at = {
            let job = self.slot.job.lock().await;
            job.last_produced_at
                .map(|last| self.estimator.next_eligible_time(&job, last))
        };
        let Some(eligible_at) = eligible_at else {
            return Wait::Elapsed;
        };

        let delay_ms = eligible_at - self.time.now_millis();
        if delay_ms > 0 {
            debug!(
                job_id = %self.slot.job_id,
                delay_ms = delay_ms,
                "Waiting for next release window"
            );
        }
        self.sleep_interruptible(delay_ms).await
    }

    /// Build the request for the next item and publish it as current
    async fn prepare_next(&mut self) -> Next {
        let mut job = self.slot.job.lock().await;
        if self.signals.peek() != JobSignal::Run || job.status != JobStatus::Running {
            return Next::Restart;
        }
        let Some(item) = job.next_item().cloned() else {
            return Next::Restart;
        };

        job.begin_item(item.keyword.clone());
        self.slot.publish(&job);

        let template = job.assignment(ResourceKind::Template, &item.id);
        let lead_form = job.assignment(ResourceKind::LeadForm, &item.id);
        let mut registrar = job.assignment(ResourceKind::Registrar, &item.id);
        if let Some(explicit) = &item.registrar_id {
            if *explicit != registrar.resource_id {
                registrar = ResourceAssignment {
                    resource_id: explicit.clone(),
                    resource_name: explicit.clone(),
                };
            }
        }

        Next::Item(ArtifactRequest {
            job_id: job.id.clone(),
            category: job.category.clone(),
            item,
            template,
            lead_form,
            registrar,
        })
    }

    /// Create the artifact, retrying transient errors
    async fn produce(&mut self, request: ArtifactRequest) -> Outcome {
        let request = Arc::new(request);
        let mut attempts = 0;

        loop {
            attempts += 1;

            // Isolate creator panics in their own task
            let creator = Arc::clone(&self.creator);
            let task_request = Arc::clone(&request);
            let result = match tokio::spawn(async move { creator.create(&task_request).await })
                .await
            {
                Ok(result) => result,
                Err(join_error) => Err(join_error_to_artifact_error(join_error)),
            };

            let error = match result {
                Ok(artifact) => return Outcome::Produced { artifact, attempts },
                Err(error) => error,
            };

            match self.retry.should_retry(&request.item.id, attempts, &error) {
                RetryDecision::Failed => {
                    return Outcome::Failed {
                        reason: error.to_string(),
                        attempts,
                    }
                }
                RetryDecision::Retry(delay_ms) => match self.sleep_interruptible(delay_ms).await {
                    Wait::Elapsed => {}
                    Wait::Interrupted | Wait::Stop => return Outcome::Interrupted,
                },
            }
        }
    }

    /// Apply the outcome of an item to the job
    async fn commit(&mut self, request: &ArtifactRequest, outcome: Outcome) -> Flow {
        let mut job = self.slot.job.lock().await;

        // Cancel is decided under the job lock, so nothing lands afterwards
        if self.signals.peek() == JobSignal::Cancel {
            info!(
                job_id = %job.id,
                item_id = %request.item.id,
                "Job cancelled, discarding in-flight item"
            );
            return Flow::Stop;
        }

        let now = self.time.now_millis();
        let recorded = match outcome {
            Outcome::Interrupted => return Flow::Continue,
            Outcome::Produced { artifact, attempts } => {
                debug!(
                    job_id = %job.id,
                    item_id = %request.item.id,
                    artifact_id = %artifact.id,
                    attempts = attempts,
                    "Artifact created"
                );
                job.record_artifact(artifact, now)
            }
            Outcome::Failed { reason, attempts } => {
                warn!(
                    job_id = %job.id,
                    item_id = %request.item.id,
                    attempts = attempts,
                    reason = %reason,
                    "Item failed permanently"
                );
                job.record_failure(ItemFailure {
                    item_id: request.item.id.clone(),
                    keyword: request.item.keyword.clone(),
                    reason,
                    attempts,
                    failed_at: now,
                })
            }
        };
        if let Err(e) = recorded {
            self.fail_job(&mut job, format!("item outcome rejected: {}", e))
                .await;
            return Flow::Stop;
        }

        job.progress.current_item_label = None;
        if let Err(e) = self.repo.update(&job).await {
            self.fail_job(&mut job, format!("progress could not be persisted: {}", e))
                .await;
            return Flow::Stop;
        }

        self.slot.publish(&job);
        Flow::Continue
    }

    /// Move the job to failed; the runner stops afterwards
    async fn fail_job(&self, job: &mut Job, reason: String) {
        error!(job_id = %job.id, reason = %reason, "Job failed");
        let now = self.time.now_millis();
        if let Err(e) = job.fail(now, reason) {
            warn!(job_id = %job.id, error = %e, "Job already terminal");
        }
        self.slot.publish(job);

        // The store may still accept the failed state
        if let Err(e) = self.repo.update(job).await {
            warn!(job_id = %job.id, error = %e, "Failed state not persisted");
        }
    }
}

fn join_error_to_artifact_error(join_error: JoinError) -> ArtifactError {
    if !join_error.is_panic() {
        return ArtifactError::Unavailable("creation task cancelled".to_string());
    }
    let panic_info = join_error.into_panic();
    let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    };
    error!(panic_msg = %panic_msg, "Artifact creator panicked");
    ArtifactError::Panicked(panic_msg)
}
