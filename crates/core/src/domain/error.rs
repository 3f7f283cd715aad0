// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid job state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid scheduling policy: {0}")]
    InvalidSchedulingPolicy(String),

    #[error("Batch contains no usable keywords")]
    EmptyBatch,

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Invalid distribution: {0}")]
    InvalidDistribution(String),

    #[error("Unknown job status: {0}")]
    UnknownStatus(String),

    #[error("Progress violation: {0}")]
    ProgressViolation(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
