use std::path::Path;

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use jobrelay_core::AppError;
use jobrelay_core::job::ScrapedJob;
use jobrelay_core::traits::DedupStore;

/// Entries older than this are eligible for [`DedupCache::cleanup_expired`].
/// Providers rotate listings well inside this window, so an expired hash
/// resurfacing as "new" is acceptable.
const EXPIRY_DAYS: i64 = 30;

/// SQLite-backed record of previously-delivered jobs.
///
/// Identity is dual-keyed: the provider's own job id when it has one,
/// and the content hash of `title|company|location` always. Either
/// matching an existing row makes a job a duplicate, which catches both
/// reposts under a fresh provider id and the same listing syndicated
/// across providers.
#[derive(Clone)]
pub struct DedupCache {
    pool: SqlitePool,
}

impl DedupCache {
    /// Open (and create if needed) the cache at the given path, creating
    /// parent directories and the schema as required.
    pub async fn open(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::DatabaseError(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to open dedup cache: {e}")))?;

        let cache = Self { pool };
        cache.init_schema().await?;
        Ok(cache)
    }

    /// In-memory cache for tests.
    pub async fn open_in_memory() -> Result<Self, AppError> {
        // A single connection, or each new connection sees a fresh
        // empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to open dedup cache: {e}")))?;

        let cache = Self { pool };
        cache.init_schema().await?;
        Ok(cache)
    }

    async fn init_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seen_jobs (
                hash TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                source_job_id TEXT,
                title TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_seen_jobs_created_at ON seen_jobs(created_at)")
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_seen_jobs_source_job_id ON seen_jobs(source_job_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn map_db_error(e: sqlx::Error) -> AppError {
    AppError::DatabaseError(e.to_string())
}

impl DedupStore for DedupCache {
    async fn is_seen(&self, job: &ScrapedJob) -> Result<bool, AppError> {
        if let Some(id) = job.source_job_id() {
            let by_id: Option<(i64,)> =
                sqlx::query_as("SELECT 1 FROM seen_jobs WHERE source_job_id = ? LIMIT 1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_db_error)?;
            if by_id.is_some() {
                return Ok(true);
            }
        }

        let by_hash: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM seen_jobs WHERE hash = ? LIMIT 1")
                .bind(job.content_hash())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;
        Ok(by_hash.is_some())
    }

    async fn mark_seen(&self, job: &ScrapedJob, source: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO seen_jobs (hash, source, source_job_id, title, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(job.content_hash())
        .bind(source)
        .bind(job.source_job_id())
        .bind(job.title())
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    async fn filter_new(&self, jobs: Vec<ScrapedJob>) -> Result<Vec<ScrapedJob>, AppError> {
        let mut new_jobs = Vec::with_capacity(jobs.len());
        for job in jobs {
            if !self.is_seen(&job).await? {
                new_jobs.push(job);
            }
        }
        Ok(new_jobs)
    }

    async fn mark_batch_seen(&self, jobs: &[ScrapedJob], source: &str) -> Result<(), AppError> {
        for job in jobs {
            self.mark_seen(job, source).await?;
        }
        tracing::debug!(count = jobs.len(), source, "Marked batch as seen");
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, AppError> {
        let cutoff = (Utc::now() - Duration::days(EXPIRY_DAYS)).timestamp();
        let result = sqlx::query("DELETE FROM seen_jobs WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        let removed = result.rows_affected();
        if removed > 0 {
            tracing::info!(removed, "Expired dedup entries removed");
        }
        Ok(removed)
    }

    async fn count(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM seen_jobs")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(count)
    }
}
