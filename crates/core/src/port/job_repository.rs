// Job Repository Port (Interface)

use crate::domain::Job;
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for Job persistence
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a new job
    async fn insert(&self, job: &Job) -> Result<()>;

    /// Find job by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Job>>;

    /// Overwrite the stored job
    async fn update(&self, job: &Job) -> Result<()>;

    /// Delete job (returns false when it did not exist)
    async fn delete(&self, id: &str) -> Result<bool>;

    /// All jobs, oldest first
    async fn list_all(&self) -> Result<Vec<Job>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::DomainError;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory JobRepository
    #[derive(Default)]
    pub struct InMemoryJobRepository {
        jobs: Mutex<HashMap<String, Job>>,
        fail_updates: AtomicBool,
        updates: AtomicUsize,
    }

    impl InMemoryJobRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent `update` fail
        pub fn fail_updates(&self, fail: bool) {
            self.fail_updates.store(fail, Ordering::SeqCst);
        }

        pub fn update_count(&self) -> usize {
            self.updates.load(Ordering::SeqCst)
        }

        pub fn len(&self) -> usize {
            self.jobs.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn sorted(mut jobs: Vec<Job>) -> Vec<Job> {
            jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            jobs
        }
    }

    #[async_trait]
    impl JobRepository for InMemoryJobRepository {
        async fn insert(&self, job: &Job) -> Result<()> {
            let mut jobs = self.jobs.lock().unwrap();
            if jobs.contains_key(&job.id) {
                return Err(AppError::Database(format!(
                    "Unique constraint violation: job {}",
                    job.id
                )));
            }
            jobs.insert(job.id.clone(), job.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<Job>> {
            Ok(self.jobs.lock().unwrap().get(id).cloned())
        }

        async fn update(&self, job: &Job) -> Result<()> {
            if self.fail_updates.load(Ordering::SeqCst) {
                return Err(AppError::Database("Database full: mock".to_string()));
            }
            self.updates.fetch_add(1, Ordering::SeqCst);
            let mut jobs = self.jobs.lock().unwrap();
            match jobs.get_mut(&job.id) {
                Some(stored) => {
                    *stored = job.clone();
                    Ok(())
                }
                None => Err(DomainError::JobNotFound(job.id.clone()).into()),
            }
        }

        async fn delete(&self, id: &str) -> Result<bool> {
            Ok(self.jobs.lock().unwrap().remove(id).is_some())
        }

        async fn list_all(&self) -> Result<Vec<Job>> {
            let jobs = self.jobs.lock().unwrap().values().cloned().collect();
            Ok(Self::sorted(jobs))
        }
    }
}
