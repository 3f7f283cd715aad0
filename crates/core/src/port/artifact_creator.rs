// Artifact Creator Port
// Abstraction over the environment capability that creates one website

use crate::domain::{Artifact, JobId, ResourceAssignment, WorkItem};
use async_trait::async_trait;
use thiserror::Error;

/// Everything the creator needs for one work item
#[derive(Debug, Clone)]
pub struct ArtifactRequest {
    pub job_id: JobId,
    pub item: WorkItem,
    pub template: ResourceAssignment,
    pub lead_form: ResourceAssignment,
    pub registrar: ResourceAssignment,
    pub category: String,
}

impl ArtifactRequest {
    pub fn domain(&self) -> String {
        self.item.domain_or_slug()
    }
}

/// Creation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    /// Permanent rejection (bad input); never retried
    #[error("Creation rejected: {0}")]
    Rejected(String),

    #[error("Creator unavailable: {0}")]
    Unavailable(String),

    #[error("Creation timed out after {0}ms")]
    Timeout(i64),

    #[error("Creator panicked: {0}")]
    Panicked(String),
}

impl ArtifactError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ArtifactError::Rejected(_))
    }
}

/// Artifact Creator trait
///
/// Implementations:
/// - SimulatedArtifactCreator (infra-artifact): latency-based website simulator
/// - MockArtifactCreator: scripted behavior for tests
#[async_trait]
pub trait ArtifactCreator: Send + Sync {
    /// Produce the single artifact for the request
    ///
    /// # Errors
    /// - ArtifactError::Rejected if the request can never succeed
    /// - ArtifactError::Unavailable / Timeout for transient failures
    async fn create(&self, request: &ArtifactRequest) -> Result<Artifact, ArtifactError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::port::TimeProvider;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Scripted artifact creator
    ///
    /// - `with_latency`: every call sleeps first
    /// - `with_gate`: every call consumes one semaphore permit before finishing,
    ///   so tests can release items one by one
    /// - `failing`: a keyword fails the given number of times
    /// - `rejecting` / `panicking`: a keyword is rejected or panics
    #[derive(Default)]
    pub struct MockArtifactCreator {
        latency: Duration,
        gate: Option<Arc<Semaphore>>,
        clock: Option<Arc<dyn TimeProvider>>,
        failures: Mutex<HashMap<String, u32>>,
        rejected: Vec<String>,
        panicking: Vec<String>,
        calls: Mutex<Vec<String>>,
        counter: AtomicU64,
    }

    impl MockArtifactCreator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
            self.gate = Some(gate);
            self
        }

        pub fn with_clock(mut self, clock: Arc<dyn TimeProvider>) -> Self {
            self.clock = Some(clock);
            self
        }

        pub fn failing(self, keyword: impl Into<String>, times: u32) -> Self {
            self.failures.lock().unwrap().insert(keyword.into(), times);
            self
        }

        pub fn rejecting(mut self, keyword: impl Into<String>) -> Self {
            self.rejected.push(keyword.into());
            self
        }

        pub fn panicking(mut self, keyword: impl Into<String>) -> Self {
            self.panicking.push(keyword.into());
            self
        }

        /// Item ids in call order (retries included)
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ArtifactCreator for MockArtifactCreator {
        async fn create(&self, request: &ArtifactRequest) -> Result<Artifact, ArtifactError> {
            self.calls.lock().unwrap().push(request.item.id.clone());

            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            if let Some(gate) = &self.gate {
                gate.acquire()
                    .await
                    .map_err(|e| ArtifactError::Unavailable(e.to_string()))?
                    .forget();
            }

            let keyword = request.item.keyword.as_str();
            if self.panicking.iter().any(|k| k == keyword) {
                panic!("mock creator panic for {}", keyword);
            }
            if self.rejected.iter().any(|k| k == keyword) {
                return Err(ArtifactError::Rejected(format!("{} is not allowed", keyword)));
            }
            {
                let mut failures = self.failures.lock().unwrap();
                if let Some(remaining) = failures.get_mut(keyword) {
                    if *remaining > 0 {
                        *remaining -= 1;
                        return Err(ArtifactError::Unavailable(format!(
                            "mock outage for {}",
                            keyword
                        )));
                    }
                }
            }

            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            let domain = request.domain();
            Ok(Artifact {
                id: format!("site-{}", n),
                item_id: request.item.id.clone(),
                keyword: request.item.keyword.clone(),
                url: format!("https://{}/", domain),
                domain,
                template_id: request.template.resource_id.clone(),
                template_name: request.template.resource_name.clone(),
                lead_form_id: request.lead_form.resource_id.clone(),
                registrar_id: request.registrar.resource_id.clone(),
                category: request.category.clone(),
                created_at: self.clock.as_ref().map(|c| c.now_millis()).unwrap_or(0),
            })
        }
    }
}
