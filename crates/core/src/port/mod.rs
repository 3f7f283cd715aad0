// Port Layer - Interfaces for external dependencies

pub mod artifact_creator;
pub mod id_provider; // For deterministic testing
pub mod job_repository;
pub mod time_provider;

// Re-exports
pub use artifact_creator::{ArtifactCreator, ArtifactError, ArtifactRequest};
pub use id_provider::IdProvider;
pub use job_repository::JobRepository;
pub use time_provider::{TimeProvider, DAY_MS};
