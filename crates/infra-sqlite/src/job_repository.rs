// SQLite JobRepository Implementation

use crate::map_sqlx_error;
use async_trait::async_trait;
use sitebatch_core::domain::{DomainError, Job};
use sitebatch_core::error::Result;
use sitebatch_core::port::JobRepository;
use sqlx::SqlitePool;
use tracing::debug;

pub struct SqliteJobRepository {
    pool: SqlitePool,
}

impl SqliteJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    async fn insert(&self, job: &Job) -> Result<()> {
        let document = serde_json::to_string(job)?;

        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, name, category, status, scheduling_mode,
                total_items, completed_items, failed_items,
                created_at, started_at, completed_at, document
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.id)
        .bind(&job.name)
        .bind(&job.category)
        .bind(job.status.as_str())
        .bind(job.scheduling.mode())
        .bind(job.progress.total as i64)
        .bind(job.progress.completed as i64)
        .bind(job.progress.failed as i64)
        .bind(job.created_at)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(&document)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(job_id = %job.id, "Job inserted");
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>("SELECT id, status, document FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(JobRow::into_job).transpose()
    }

    async fn update(&self, job: &Job) -> Result<()> {
        let document = serde_json::to_string(job)?;

        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET name = ?, category = ?, status = ?, scheduling_mode = ?,
                total_items = ?, completed_items = ?, failed_items = ?,
                started_at = ?, completed_at = ?, document = ?
            WHERE id = ?
            "#,
        )
        .bind(&job.name)
        .bind(&job.category)
        .bind(job.status.as_str())
        .bind(job.scheduling.mode())
        .bind(job.progress.total as i64)
        .bind(job.progress.completed as i64)
        .bind(job.progress.failed as i64)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(&document)
        .bind(&job.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::JobNotFound(job.id.clone()).into());
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> Result<Vec<Job>> {
        let rows: Vec<JobRow> = sqlx::query_as(
            r#"
            SELECT id, status, document FROM jobs
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(JobRow::into_job).collect()
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: String,
    status: String,
    document: String,
}

impl JobRow {
    /// The status column is authoritative over the document copy
    fn into_job(self) -> Result<Job> {
        let mut job: Job = serde_json::from_str(&self.document)?;
        job.status = self.status.parse()?;
        job.id = self.id;
        Ok(job)
    }
}
