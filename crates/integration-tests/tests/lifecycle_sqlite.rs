//! Job lifecycle against the SQLite store
//!
//! Every test runs the real controller on a `sqlite::memory:` database and
//! checks both the in-memory view and what was persisted.

use serde_json::json;
use sitebatch_core::application::{BatchJobService, BatchSpec, EngineConfig, JobController};
use sitebatch_core::application::RetryPolicy;
use sitebatch_core::domain::{Job, JobStatus};
use sitebatch_core::port::artifact_creator::mocks::MockArtifactCreator;
use sitebatch_core::port::id_provider::UuidProvider;
use sitebatch_core::port::time_provider::SystemTimeProvider;
use sitebatch_core::port::{ArtifactCreator, JobRepository};
use sitebatch_infra_artifact::{SimulatedArtifactCreator, SimulatorConfig};
use sitebatch_infra_sqlite::{create_pool, run_migrations, SqliteJobRepository};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

const WAIT: Duration = Duration::from_secs(10);

struct Harness {
    service: BatchJobService,
    repo: Arc<SqliteJobRepository>,
}

async fn harness(creator: Arc<dyn ArtifactCreator>) -> Harness {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let repo = Arc::new(SqliteJobRepository::new(pool));
    let time = Arc::new(SystemTimeProvider);
    let controller = Arc::new(JobController::new(
        repo.clone(),
        creator,
        time.clone(),
        EngineConfig {
            immediate_delay_ms: 0,
            retry: RetryPolicy::new(2, 0, 1.0),
        },
    ));

    Harness {
        service: BatchJobService::new(controller, Arc::new(UuidProvider), time),
        repo,
    }
}

fn keywords(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("plumber city {}", i)).collect()
}

async fn wait_for_status(service: &BatchJobService, job_id: &str, status: JobStatus) {
    let mut rx = service.watch_progress(job_id).await.unwrap();
    tokio::time::timeout(WAIT, rx.wait_for(|s| s.status == status))
        .await
        .expect("timed out waiting for job status")
        .unwrap();
}

async fn persisted(repo: &SqliteJobRepository, job_id: &str) -> Job {
    repo.find_by_id(job_id).await.unwrap().expect("job persisted")
}

/// A started job walks every item and the completed state is durable
#[tokio::test]
async fn test_job_completes_and_is_persisted() {
    let h = harness(Arc::new(MockArtifactCreator::new())).await;

    let spec: BatchSpec = serde_json::from_value(json!({
        "name": "Plumbers",
        "category": "home-services",
        "keywords": keywords(10),
        "distributions": {
            "templates": [
                {"resource_id": "tpl-a", "resource_name": "Classic", "percentage": 70.0},
                {"resource_id": "tpl-b", "resource_name": "Modern", "percentage": 30.0}
            ],
            "registrars": [
                {"resource_id": "reg-1", "resource_name": "Namecheap", "percentage": 100.0}
            ]
        }
    }))
    .unwrap();

    let job = h.service.create_job(spec).await.unwrap();
    assert_eq!(persisted(&h.repo, &job.id).await.status, JobStatus::Pending);

    h.service.start_job(&job.id).await.unwrap();
    wait_for_status(&h.service, &job.id, JobStatus::Completed).await;

    let stored = persisted(&h.repo, &job.id).await;
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(stored.progress.completed, 10);
    assert_eq!(stored.artifacts.len(), 10);
    assert!(stored.completed_at.is_some());

    let classic = stored
        .artifacts
        .iter()
        .filter(|a| a.template_id == "tpl-a")
        .count();
    assert_eq!(classic, 7);
    assert!(stored.artifacts.iter().all(|a| a.registrar_id == "reg-1"));
    assert!(stored.artifacts.iter().all(|a| a.category == "home-services"));

    // Artifacts follow work item order
    let item_ids: Vec<&str> = stored.items.iter().map(|i| i.id.as_str()).collect();
    let artifact_items: Vec<&str> = stored.artifacts.iter().map(|a| a.item_id.as_str()).collect();
    assert_eq!(item_ids, artifact_items);
}

/// Cancel removes the job from both the controller and the database
#[tokio::test]
async fn test_cancel_removes_persisted_job() {
    let gate = Arc::new(Semaphore::new(2));
    let creator = Arc::new(MockArtifactCreator::new().with_gate(gate.clone()));
    let h = harness(creator.clone()).await;

    let job = h
        .service
        .create_job(BatchSpec::from_keywords(keywords(5)))
        .await
        .unwrap();
    h.service.start_job(&job.id).await.unwrap();

    // Two items go through, the third blocks on the gate
    let mut rx = h.service.watch_progress(&job.id).await.unwrap();
    tokio::time::timeout(WAIT, rx.wait_for(|s| s.progress.completed == 2))
        .await
        .unwrap()
        .unwrap();

    assert!(h.service.cancel_job(&job.id).await.unwrap());
    gate.add_permits(10);

    assert!(h.repo.find_by_id(&job.id).await.unwrap().is_none());
    assert!(h.service.get_job(&job.id).await.unwrap_err().is_not_found());
    assert!(!h.service.cancel_job(&job.id).await.unwrap());
}

/// Pause is durable and resume picks up where the job stopped
#[tokio::test]
async fn test_pause_resume_round_trip() {
    let gate = Arc::new(Semaphore::new(0));
    let creator = Arc::new(MockArtifactCreator::new().with_gate(gate.clone()));
    let h = harness(creator.clone()).await;

    let job = h
        .service
        .create_job(BatchSpec::from_keywords(keywords(4)))
        .await
        .unwrap();
    h.service.start_job(&job.id).await.unwrap();

    // Pause only once the first item is in flight
    let mut rx = h.service.watch_progress(&job.id).await.unwrap();
    tokio::time::timeout(WAIT, rx.wait_for(|s| s.progress.current_item_label.is_some()))
        .await
        .unwrap()
        .unwrap();

    let paused = h.service.pause_job(&job.id).await.unwrap();
    assert_eq!(paused.status, JobStatus::Paused);
    assert_eq!(persisted(&h.repo, &job.id).await.status, JobStatus::Paused);

    // The item already in flight still lands while paused
    gate.add_permits(1);
    tokio::time::timeout(WAIT, rx.wait_for(|s| s.progress.completed == 1))
        .await
        .unwrap()
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.service.get_job(&job.id).await.unwrap().progress.completed, 1);

    gate.add_permits(10);
    h.service.resume_job(&job.id).await.unwrap();
    wait_for_status(&h.service, &job.id, JobStatus::Completed).await;

    let stored = persisted(&h.repo, &job.id).await;
    assert_eq!(stored.progress.completed, 4);
    assert_eq!(creator.call_count(), 4);
}

/// Invalid domains are rejected by the simulator; the job still completes
#[tokio::test]
async fn test_simulated_creator_failures_are_recorded() {
    let creator = Arc::new(SimulatedArtifactCreator::new(
        SimulatorConfig {
            latency: Duration::from_millis(1),
            jitter: Duration::ZERO,
            timeout: None,
            failure_rate: 0.0,
        },
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
    ));
    let h = harness(creator).await;

    let spec: BatchSpec = serde_json::from_value(json!({
        "keywords": [
            "roofer denver",
            {"keyword": "roofer aurora", "domain": "bad_domain.com"},
            {"keyword": "roofer boulder", "tld": ".IO"}
        ]
    }))
    .unwrap();

    let job = h.service.create_job(spec).await.unwrap();
    h.service.start_job(&job.id).await.unwrap();
    wait_for_status(&h.service, &job.id, JobStatus::Completed).await;

    let stored = persisted(&h.repo, &job.id).await;
    assert_eq!(stored.progress.completed, 2);
    assert_eq!(stored.progress.failed, 1);
    assert_eq!(stored.failures[0].keyword, "roofer aurora");
    assert_eq!(stored.failures[0].attempts, 1);

    let urls: Vec<&str> = stored.artifacts.iter().map(|a| a.url.as_str()).collect();
    assert_eq!(urls, vec!["https://roofer-denver.com/", "https://roofer-boulder.io/"]);
}

/// Long keywords still produce a domain the simulator accepts
#[tokio::test]
async fn test_long_keyword_gets_a_valid_domain() {
    let creator = Arc::new(SimulatedArtifactCreator::new(
        SimulatorConfig {
            latency: Duration::from_millis(1),
            jitter: Duration::ZERO,
            timeout: None,
            failure_rate: 0.0,
        },
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
    ));
    let h = harness(creator).await;

    let spec: BatchSpec = serde_json::from_value(json!({
        "keywords": [
            "best affordable emergency plumbing repair services in downtown los angeles"
        ]
    }))
    .unwrap();

    let job = h.service.create_job(spec).await.unwrap();
    h.service.start_job(&job.id).await.unwrap();
    wait_for_status(&h.service, &job.id, JobStatus::Completed).await;

    let stored = persisted(&h.repo, &job.id).await;
    assert_eq!(stored.progress.failed, 0, "{:?}", stored.failures);
    assert_eq!(stored.progress.completed, 1);

    let domain = stored.items[0].domain.as_deref().unwrap();
    let label = domain.strip_suffix(".com").unwrap();
    assert!(label.len() <= 63, "{}", label);
    assert!(!label.ends_with('-'));
}

/// A malformed distribution is rejected before anything is stored
#[tokio::test]
async fn test_bad_distribution_is_rejected_at_create() {
    let h = harness(Arc::new(MockArtifactCreator::new())).await;

    let spec: BatchSpec = serde_json::from_value(json!({
        "keywords": ["a", "b"],
        "distributions": {
            "templates": [
                {"resource_id": "tpl-a", "resource_name": "Classic", "percentage": -5.0}
            ]
        }
    }))
    .unwrap();

    let err = h.service.create_job(spec).await.unwrap_err();
    assert!(err.to_string().contains("invalid percentage"), "{}", err);
    assert!(h.repo.list_all().await.unwrap().is_empty());
}
