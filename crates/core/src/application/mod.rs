// Application Layer - Use Cases and Business Logic

pub mod allocator;
pub mod batch;
pub mod controller;
pub mod estimator;
pub mod retry;

// Re-exports
pub use batch::{BatchJobService, BatchSpec, KeywordSpec};
pub use controller::{EngineConfig, JobController, ProgressSnapshot};
pub use estimator::{CompletionEstimate, ReleaseRate, ScheduleEstimator};
pub use retry::{RetryDecision, RetryPolicy};
