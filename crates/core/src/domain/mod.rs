// Domain Layer - Pure business logic and entities

pub mod artifact;
pub mod distribution;
pub mod error;
pub mod job;
pub mod scheduling;
pub mod work_item;

// Re-exports
pub use artifact::{Artifact, ItemFailure};
pub use distribution::{
    Allocation, AllocationPlan, DistributionEntry, Distributions, ResourceAssignment,
    ResourceKind,
};
pub use error::DomainError;
pub use job::{Job, JobId, JobStatus, Progress};
pub use scheduling::SchedulingPolicy;
pub use work_item::{DomainMode, DomainStatus, WorkItem, WorkItemId};
