//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use jsonrpsee::types::ErrorObjectOwned;
use sitebatch_core::domain::DomainError;
use sitebatch_core::error::AppError;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const DB_ERROR: i32 = 5001;
    pub const SYSTEM_ERROR: i32 = 5002;
}

fn domain_code(err: &DomainError) -> i32 {
    match err {
        DomainError::JobNotFound(_) => code::NOT_FOUND,
        DomainError::InvalidStateTransition { .. } => code::CONFLICT,
        DomainError::ProgressViolation(_) => code::INTERNAL_ERROR,
        DomainError::InvalidSchedulingPolicy(_)
        | DomainError::EmptyBatch
        | DomainError::InvalidDistribution(_)
        | DomainError::UnknownStatus(_) => code::VALIDATION_ERROR,
    }
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let code = match &err {
        AppError::Domain(e) => domain_code(e),
        AppError::Serialization(_) => code::VALIDATION_ERROR,
        AppError::Database(_) => code::DB_ERROR,
        AppError::Artifact(_) => code::SYSTEM_ERROR,
        AppError::Internal(_) => code::INTERNAL_ERROR,
    };
    ErrorObjectOwned::owned(code, err.to_string(), None::<()>)
}
