// SiteBatch Infrastructure - SQLite Adapter
// Implements: JobRepository

mod connection;
mod error;
mod job_repository;
mod migration;

pub use connection::create_pool;
pub use error::map_sqlx_error;
pub use job_repository::SqliteJobRepository;
pub use migration::run_migrations;

// sqlx::Error -> AppError::Database goes through map_sqlx_error
