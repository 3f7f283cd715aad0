//! Restart recovery
//!
//! A first controller works on a file database and is abandoned mid-job (its
//! creator never returns). A second controller on the same file must pick
//! every job up in the state it was persisted in.

use serde_json::json;
use sitebatch_core::application::{BatchJobService, BatchSpec, EngineConfig, JobController};
use sitebatch_core::application::allocator::build_plan;
use sitebatch_core::domain::{JobStatus, ResourceKind};
use sitebatch_core::port::artifact_creator::mocks::MockArtifactCreator;
use sitebatch_core::port::id_provider::mocks::SequentialIdProvider;
use sitebatch_core::port::time_provider::SystemTimeProvider;
use sitebatch_core::port::{ArtifactCreator, JobRepository};
use sitebatch_infra_sqlite::{create_pool, run_migrations, SqliteJobRepository};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_test::assert_ok;

const WAIT: Duration = Duration::from_secs(10);

/// Database file removed on drop
struct TempDb {
    path: std::path::PathBuf,
}

impl TempDb {
    fn new() -> Self {
        let path =
            std::env::temp_dir().join(format!("sitebatch-recovery-{}.db", uuid::Uuid::new_v4()));
        Self { path }
    }

    fn url(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut name = self.path.clone().into_os_string();
            name.push(suffix);
            let _ = std::fs::remove_file(name);
        }
    }
}

async fn service_on(
    url: &str,
    creator: Arc<dyn ArtifactCreator>,
    id_prefix: &str,
) -> (Arc<JobController>, BatchJobService, Arc<SqliteJobRepository>) {
    let pool = create_pool(url).await.unwrap();
    run_migrations(&pool).await.unwrap();

    let repo = Arc::new(SqliteJobRepository::new(pool));
    let time = Arc::new(SystemTimeProvider);
    let controller = Arc::new(JobController::new(
        repo.clone(),
        creator,
        time.clone(),
        EngineConfig {
            immediate_delay_ms: 0,
            ..EngineConfig::default()
        },
    ));
    let service = BatchJobService::new(
        controller.clone(),
        Arc::new(SequentialIdProvider::new(id_prefix)),
        time,
    );
    (controller, service, repo)
}

fn spec(n: usize) -> BatchSpec {
    let keywords: Vec<String> = (1..=n).map(|i| format!("electrician town {}", i)).collect();
    serde_json::from_value(json!({
        "keywords": keywords,
        "distributions": {
            "templates": [
                {"resource_id": "tpl-a", "resource_name": "Classic", "percentage": 60.0},
                {"resource_id": "tpl-b", "resource_name": "Modern", "percentage": 40.0}
            ]
        }
    }))
    .unwrap()
}

async fn wait_for(
    service: &BatchJobService,
    job_id: &str,
    done: impl Fn(&sitebatch_core::application::ProgressSnapshot) -> bool,
) {
    let mut rx = service.watch_progress(job_id).await.unwrap();
    tokio::time::timeout(WAIT, rx.wait_for(|s| done(s)))
        .await
        .expect("timed out waiting for progress")
        .unwrap();
}

/// Running and paused jobs are re-attached with their frozen plan
#[tokio::test]
async fn test_restore_after_abandoned_run() {
    let db = TempDb::new();

    // First run: two items done, the third hangs forever
    let gate = Arc::new(Semaphore::new(2));
    let stuck = Arc::new(MockArtifactCreator::new().with_gate(gate));
    let (_old_controller, old, old_repo) = service_on(&db.url(), stuck, "job").await;

    let running = old.create_job(spec(5)).await.unwrap();
    old.start_job(&running.id).await.unwrap();
    wait_for(&old, &running.id, |s| s.progress.completed == 2).await;

    let paused = old.create_job(spec(3)).await.unwrap();
    let pending = old.create_job(spec(1)).await.unwrap();

    let before = old_repo.find_by_id(&running.id).await.unwrap().unwrap();
    assert_eq!(before.status, JobStatus::Running);
    assert_eq!(before.progress.completed, 2);
    let frozen_plan = before.plan.clone().expect("plan frozen at start");

    // Second run: a fresh controller on the same file
    let creator = Arc::new(MockArtifactCreator::new());
    let (controller, service, repo) = service_on(&db.url(), creator.clone(), "job-new").await;

    // A paused job is persisted as such before the restart
    {
        let mut job = repo.find_by_id(&paused.id).await.unwrap().unwrap();
        let plan = build_plan(&job.items, &job.distributions).unwrap();
        job.start(1, plan).unwrap();
        job.pause().unwrap();
        repo.update(&job).await.unwrap();
    }

    let attached = assert_ok!(controller.restore().await);
    assert_eq!(attached, 2);

    wait_for(&service, &running.id, |s| s.status == JobStatus::Completed).await;
    let done = repo.find_by_id(&running.id).await.unwrap().unwrap();
    assert_eq!(done.progress.completed, 5);
    assert_eq!(done.plan.as_ref(), Some(&frozen_plan));
    for artifact in &done.artifacts {
        let assigned = done.assignment(ResourceKind::Template, &artifact.item_id);
        assert_eq!(artifact.template_id, assigned.resource_id);
    }
    // Only the three unfinished items reached the new creator
    assert_eq!(creator.calls(), vec!["item-3", "item-4", "item-5"]);

    // The paused job waits for an explicit resume
    tokio::time::sleep(Duration::from_millis(50)).await;
    let still_paused = service.get_job(&paused.id).await.unwrap();
    assert_eq!(still_paused.status, JobStatus::Paused);
    assert_eq!(still_paused.progress.completed, 0);

    service.resume_job(&paused.id).await.unwrap();
    wait_for(&service, &paused.id, |s| s.status == JobStatus::Completed).await;

    // Pending jobs are listed and can still be started
    let listed = service.list_jobs().await;
    assert_eq!(listed.len(), 3);
    let restored_pending = service.get_job(&pending.id).await.unwrap();
    assert_eq!(restored_pending.status, JobStatus::Pending);
    service.start_job(&pending.id).await.unwrap();
    wait_for(&service, &pending.id, |s| s.status == JobStatus::Completed).await;
}

/// Restoring twice does not attach a second runner
#[tokio::test]
async fn test_restore_is_idempotent() {
    let db = TempDb::new();
    let creator = Arc::new(MockArtifactCreator::new().with_gate(Arc::new(Semaphore::new(0))));
    let (controller, service, _repo) = service_on(&db.url(), creator.clone(), "job").await;

    let job = service.create_job(spec(2)).await.unwrap();
    service.start_job(&job.id).await.unwrap();

    assert_eq!(controller.restore().await.unwrap(), 0);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(creator.call_count(), 1);
}

/// Completed and failed jobs come back read-only
#[tokio::test]
async fn test_terminal_jobs_are_loaded_without_runner() {
    let db = TempDb::new();
    let (_c, first, _r) = service_on(&db.url(), Arc::new(MockArtifactCreator::new()), "job").await;

    let job = first.create_job(spec(2)).await.unwrap();
    first.start_job(&job.id).await.unwrap();
    wait_for(&first, &job.id, |s| s.status == JobStatus::Completed).await;

    let creator = Arc::new(MockArtifactCreator::new());
    let (controller, service, _repo) = service_on(&db.url(), creator.clone(), "job-new").await;

    assert_eq!(controller.restore().await.unwrap(), 0);
    let restored = service.get_job(&job.id).await.unwrap();
    assert_eq!(restored.status, JobStatus::Completed);
    assert_eq!(restored.artifacts.len(), 2);
    assert_eq!(creator.call_count(), 0);

    let err = service.cancel_job(&job.id).await.unwrap_err();
    assert!(err.to_string().contains("completed"), "{}", err);
}
