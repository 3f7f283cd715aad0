//! JSON-RPC round trip against a live server on an ephemeral port

use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::server::ServerHandle;
use serde_json::{json, Value};
use sitebatch_api_rpc::{RpcServer, RpcServerConfig};
use sitebatch_core::application::{BatchJobService, EngineConfig, JobController};
use sitebatch_core::port::artifact_creator::mocks::MockArtifactCreator;
use sitebatch_core::port::id_provider::mocks::SequentialIdProvider;
use sitebatch_core::port::time_provider::SystemTimeProvider;
use sitebatch_infra_sqlite::{create_pool, run_migrations, SqliteJobRepository};
use std::sync::Arc;
use std::time::Duration;

async fn start_server() -> (HttpClient, ServerHandle) {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let time = Arc::new(SystemTimeProvider);
    let controller = Arc::new(JobController::new(
        Arc::new(SqliteJobRepository::new(pool)),
        Arc::new(MockArtifactCreator::new().with_latency(Duration::from_millis(5))),
        time.clone(),
        EngineConfig {
            immediate_delay_ms: 0,
            ..EngineConfig::default()
        },
    ));
    let service = Arc::new(BatchJobService::new(
        controller,
        Arc::new(SequentialIdProvider::new("job")),
        time,
    ));

    let config = RpcServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    let (addr, handle) = RpcServer::new(config, service).start().await.unwrap();

    let client = HttpClientBuilder::default()
        .build(format!("http://{}", addr))
        .unwrap();
    (client, handle)
}

fn params(value: Value) -> ObjectParams {
    let mut params = ObjectParams::new();
    if let Value::Object(map) = value {
        for (key, value) in map {
            params.insert(&key, value).unwrap();
        }
    }
    params
}

fn error_code(err: jsonrpsee::core::ClientError) -> i32 {
    match err {
        jsonrpsee::core::ClientError::Call(obj) => obj.code(),
        other => panic!("unexpected client error: {}", other),
    }
}

/// Create, start and poll a job until it completes
#[tokio::test]
async fn test_job_lifecycle_over_rpc() {
    let (client, handle) = start_server().await;

    let created: Value = client
        .request(
            "jobs.create.v1",
            params(json!({
                "spec": {
                    "name": "Dentists",
                    "keywords": ["dentist miami", "dentist tampa", "dentist orlando"],
                    "scheduling": {"mode": "immediate"}
                }
            })),
        )
        .await
        .unwrap();
    assert_eq!(created["job_id"], "job-1");
    assert_eq!(created["status"], "pending");
    assert_eq!(created["total"], 3);

    let started: Value = client
        .request("jobs.start.v1", params(json!({"job_id": "job-1"})))
        .await
        .unwrap();
    assert_eq!(started["status"], "running");

    let mut detail = Value::Null;
    for _ in 0..200 {
        detail = client
            .request("jobs.get.v1", params(json!({"job_id": "job-1"})))
            .await
            .unwrap();
        if detail["status"] == "completed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert_eq!(detail["status"], "completed");
    assert_eq!(detail["completed"], 3);
    assert_eq!(detail["percent"], 100.0);
    assert_eq!(detail["artifacts"].as_array().unwrap().len(), 3);
    assert_eq!(detail["artifacts"][0]["url"], "https://dentist-miami.com/");

    let listed: Value = client
        .request("jobs.list.v1", params(json!({"status": "completed"})))
        .await
        .unwrap();
    assert_eq!(listed["jobs"].as_array().unwrap().len(), 1);

    // Terminal jobs cannot be paused
    let err = client
        .request::<Value, _>("jobs.pause.v1", params(json!({"job_id": "job-1"})))
        .await
        .unwrap_err();
    assert_eq!(error_code(err), 4002);

    handle.stop().unwrap();
}

/// Validation, not-found and cancel semantics surface as error codes
#[tokio::test]
async fn test_error_codes_over_rpc() {
    let (client, handle) = start_server().await;

    let err = client
        .request::<Value, _>("jobs.create.v1", params(json!({"spec": {"keywords": ["  "]}})))
        .await
        .unwrap_err();
    assert_eq!(error_code(err), 4000);

    let err = client
        .request::<Value, _>("jobs.start.v1", params(json!({"job_id": "nope"})))
        .await
        .unwrap_err();
    assert_eq!(error_code(err), 4001);

    let cancelled: Value = client
        .request("jobs.cancel.v1", params(json!({"job_id": "nope"})))
        .await
        .unwrap();
    assert_eq!(cancelled["cancelled"], false);

    let estimate: Value = client
        .request(
            "schedule.estimate.v1",
            params(json!({
                "total_items": 30,
                "scheduling": {"mode": "distribute_over", "total_days": 15}
            })),
        )
        .await
        .unwrap();
    assert_eq!(estimate["days"], 15);
    assert_eq!(estimate["items_per_period"], 2);
    assert_eq!(estimate["period_days"], 1);

    handle.stop().unwrap();
}
