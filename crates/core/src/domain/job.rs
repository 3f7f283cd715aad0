// Job Domain Model - aggregate root of a bulk website creation batch

use serde::{Deserialize, Serialize};

use super::artifact::{Artifact, ItemFailure};
use super::distribution::{AllocationPlan, Distributions, ResourceKind};
use super::error::{DomainError, Result};
use super::scheduling::SchedulingPolicy;
use super::work_item::{DomainMode, WorkItem};

/// Job ID (UUID v4)
pub type JobId = String;

/// Job Status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Paused => "paused",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "paused" => Ok(JobStatus::Paused),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Progress value object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    #[serde(default)]
    pub failed: usize,
    pub total: usize,
    pub current_item_label: Option<String>,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            failed: 0,
            total,
            current_item_label: None,
        }
    }

    /// Items that reached an outcome (artifact or permanent failure)
    pub fn processed(&self) -> usize {
        self.completed + self.failed
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.processed())
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.processed() as f64 * 100.0 / self.total as f64
    }
}

/// Job Entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    // Identity
    pub id: JobId,
    pub name: String,
    pub category: String,
    pub status: JobStatus,

    // Batch definition
    pub items: Vec<WorkItem>,
    pub domain_mode: DomainMode,
    pub default_tld: String,
    pub scheduling: SchedulingPolicy,
    pub distributions: Distributions,

    // Frozen at start
    pub plan: Option<AllocationPlan>,

    // Timestamps (epoch ms)
    pub created_at: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub last_produced_at: Option<i64>,

    // Outcome
    pub progress: Progress,
    pub artifacts: Vec<Artifact>,
    pub failures: Vec<ItemFailure>,
    pub error: Option<String>,
}

impl Job {
    /// Create a new pending job
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job ID (injected, not generated)
    /// * `name` - Human-readable name
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `items` - Work items, blank keywords already stripped
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        created_at: i64,
        items: Vec<WorkItem>,
    ) -> Self {
        let total = items.len();
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            status: JobStatus::Pending,
            items,
            domain_mode: DomainMode::default(),
            default_tld: "com".to_string(),
            scheduling: SchedulingPolicy::default(),
            distributions: Distributions::default(),
            plan: None,
            created_at,
            started_at: None,
            completed_at: None,
            last_produced_at: None,
            progress: Progress::new(total),
            artifacts: Vec::new(),
            failures: Vec::new(),
            error: None,
        }
    }

    fn transition_error(&self, to: JobStatus) -> DomainError {
        DomainError::InvalidStateTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }

    /// Transition pending -> running, freezing the allocation plan.
    ///
    /// Domains are resolved and items without an explicit registrar take the
    /// allocated one.
    pub fn start(&mut self, now_millis: i64, plan: AllocationPlan) -> Result<()> {
        if self.status != JobStatus::Pending {
            return Err(self.transition_error(JobStatus::Running));
        }
        if self.plan.is_some() {
            return Err(DomainError::InvalidDistribution(format!(
                "allocation plan of job {} is already frozen",
                self.id
            )));
        }

        for item in &mut self.items {
            item.resolve_domain(self.domain_mode);
            if item.registrar_id.is_none() {
                if let Some(registrar) = plan.registrars.get(&item.id) {
                    item.registrar_id = Some(registrar.resource_id.clone());
                }
            }
        }

        self.plan = Some(plan);
        self.status = JobStatus::Running;
        self.started_at = Some(now_millis);
        Ok(())
    }

    /// Transition running -> paused
    pub fn pause(&mut self) -> Result<()> {
        if self.status != JobStatus::Running {
            return Err(self.transition_error(JobStatus::Paused));
        }
        self.status = JobStatus::Paused;
        Ok(())
    }

    /// Transition paused -> running
    pub fn resume(&mut self) -> Result<()> {
        if self.status != JobStatus::Paused {
            return Err(self.transition_error(JobStatus::Running));
        }
        self.status = JobStatus::Running;
        Ok(())
    }

    /// Transition running -> completed once every item has an outcome
    pub fn complete(&mut self, now_millis: i64) -> Result<()> {
        if self.status != JobStatus::Running {
            return Err(self.transition_error(JobStatus::Completed));
        }
        if self.progress.remaining() > 0 {
            return Err(DomainError::ProgressViolation(format!(
                "{} of {} items still unprocessed",
                self.progress.remaining(),
                self.progress.total
            )));
        }
        self.status = JobStatus::Completed;
        self.progress.current_item_label = None;
        self.completed_at = Some(now_millis);
        Ok(())
    }

    /// Mark as failed (catastrophic errors only)
    pub fn fail(&mut self, now_millis: i64, reason: impl Into<String>) -> Result<()> {
        if self.status.is_terminal() {
            return Err(self.transition_error(JobStatus::Failed));
        }
        self.status = JobStatus::Failed;
        self.error = Some(reason.into());
        self.progress.current_item_label = None;
        self.completed_at = Some(now_millis);
        Ok(())
    }

    /// Cancellation is valid from any non-terminal status
    pub fn ensure_cancellable(&self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: "cancelled".to_string(),
            });
        }
        Ok(())
    }

    /// First work item without an outcome
    pub fn next_item(&self) -> Option<&WorkItem> {
        self.items.get(self.progress.processed())
    }

    pub fn is_exhausted(&self) -> bool {
        self.progress.remaining() == 0
    }

    /// Resource of the given kind assigned to an item (empty fallback when the
    /// plan has no entry for it)
    pub fn assignment(
        &self,
        kind: ResourceKind,
        item_id: &str,
    ) -> super::distribution::ResourceAssignment {
        self.plan
            .as_ref()
            .map(|plan| plan.allocation(kind).resolve(item_id))
            .unwrap_or_default()
    }

    /// Mark the item currently being created
    pub fn begin_item(&mut self, label: impl Into<String>) {
        self.progress.current_item_label = Some(label.into());
    }

    fn ensure_next(&self, item_id: &str) -> Result<()> {
        if !matches!(self.status, JobStatus::Running | JobStatus::Paused) {
            return Err(DomainError::ProgressViolation(format!(
                "job {} is {}, cannot record progress",
                self.id, self.status
            )));
        }
        match self.next_item() {
            Some(item) if item.id == item_id => Ok(()),
            Some(item) => Err(DomainError::ProgressViolation(format!(
                "expected outcome for {}, got {}",
                item.id, item_id
            ))),
            None => Err(DomainError::ProgressViolation(format!(
                "all {} items already processed",
                self.progress.total
            ))),
        }
    }

    /// Append the artifact of the next item and advance progress
    pub fn record_artifact(&mut self, artifact: Artifact, now_millis: i64) -> Result<()> {
        self.ensure_next(&artifact.item_id)?;
        self.artifacts.push(artifact);
        self.progress.completed += 1;
        self.last_produced_at = Some(now_millis);
        Ok(())
    }

    /// Record a permanent failure of the next item and advance past it
    pub fn record_failure(&mut self, failure: ItemFailure) -> Result<()> {
        self.ensure_next(&failure.item_id)?;
        self.failures.push(failure);
        self.progress.failed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(keywords: &[&str]) -> Vec<WorkItem> {
        keywords
            .iter()
            .enumerate()
            .map(|(i, k)| WorkItem::new(format!("item-{}", i + 1), *k, "US", "com"))
            .collect()
    }

    fn artifact_for(item: &WorkItem) -> Artifact {
        Artifact {
            id: format!("artifact-{}", item.id),
            item_id: item.id.clone(),
            keyword: item.keyword.clone(),
            domain: item.domain_or_slug(),
            url: format!("https://{}/", item.domain_or_slug()),
            template_id: String::new(),
            template_name: String::new(),
            lead_form_id: String::new(),
            registrar_id: String::new(),
            category: String::new(),
            created_at: 0,
        }
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = Job::new("job-1", "batch", 1000, items(&["a", "b"]));

        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, Progress::new(2));
        assert!(job.artifacts.is_empty());
        assert!(job.plan.is_none());
    }

    #[test]
    fn test_lifecycle_to_completed() {
        let mut job = Job::new("job-1", "batch", 1000, items(&["a", "b"]));
        job.start(2000, AllocationPlan::default()).unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.started_at, Some(2000));

        // Cannot complete with work left
        assert!(job.complete(2500).is_err());

        for _ in 0..2 {
            let item = job.next_item().unwrap().clone();
            job.record_artifact(artifact_for(&item), 3000).unwrap();
        }
        assert_eq!(job.progress.completed, 2);
        assert_eq!(job.artifacts.len(), job.progress.completed);

        job.complete(4000).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.completed_at, Some(4000));
    }

    #[test]
    fn test_state_machine_closure() {
        let mut job = Job::new("job-1", "batch", 1000, items(&["a"]));

        // pending: no pause, no resume
        assert!(job.pause().is_err());
        assert!(job.resume().is_err());

        job.start(2000, AllocationPlan::default()).unwrap();
        // running: no start, no resume
        assert!(job.start(2100, AllocationPlan::default()).is_err());
        assert!(job.resume().is_err());

        job.pause().unwrap();
        // paused: no pause, no start, no complete
        assert!(job.pause().is_err());
        assert!(job.start(2200, AllocationPlan::default()).is_err());
        assert!(job.complete(2200).is_err());

        job.resume().unwrap();
        let item = job.next_item().unwrap().clone();
        job.record_artifact(artifact_for(&item), 2300).unwrap();
        job.complete(2400).unwrap();

        // completed: nothing
        assert!(job.pause().is_err());
        assert!(job.resume().is_err());
        assert!(job.start(2500, AllocationPlan::default()).is_err());
        assert!(job.ensure_cancellable().is_err());
        assert!(job.fail(2500, "late").is_err());
    }

    #[test]
    fn test_out_of_order_artifact_rejected() {
        let mut job = Job::new("job-1", "batch", 1000, items(&["a", "b"]));
        job.start(2000, AllocationPlan::default()).unwrap();

        let second = job.items[1].clone();
        let result = job.record_artifact(artifact_for(&second), 3000);

        assert!(matches!(result, Err(DomainError::ProgressViolation(_))));
        assert_eq!(job.progress.completed, 0);
        assert!(job.artifacts.is_empty());
    }

    #[test]
    fn test_failure_advances_without_artifact() {
        let mut job = Job::new("job-1", "batch", 1000, items(&["a", "b"]));
        job.start(2000, AllocationPlan::default()).unwrap();

        job.record_failure(ItemFailure {
            item_id: "item-1".to_string(),
            keyword: "a".to_string(),
            reason: "boom".to_string(),
            attempts: 3,
            failed_at: 2500,
        })
        .unwrap();

        assert_eq!(job.progress.failed, 1);
        assert_eq!(job.progress.completed, 0);
        assert_eq!(job.next_item().unwrap().id, "item-2");
        assert_eq!(job.artifacts.len(), job.progress.completed);
    }

    #[test]
    fn test_start_resolves_domains() {
        let mut job = Job::new("job-1", "batch", 1000, items(&["Dog Groomer"]));
        job.start(2000, AllocationPlan::default()).unwrap();

        assert_eq!(job.items[0].domain.as_deref(), Some("dog-groomer.com"));
    }

    #[test]
    fn test_status_round_trip_str() {
        for status in [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Paused,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
    }
}
