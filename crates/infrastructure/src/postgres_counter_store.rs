//! PostgreSQL-backed window counters using the `quota_counters` table.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use clawcook_application::CounterStore;
use clawcook_core::{AppError, AppResult};

use crate::counter_store_support::{checked_count, validate_increment};

/// PostgreSQL implementation of the counter store port.
#[derive(Clone)]
pub struct PostgresCounterStore {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresCounterStore {
    /// Creates a store with the provided connection pool and per-call timeout.
    #[must_use]
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Deletes counters whose window has expired.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let purge = sqlx::query(
            r#"
            DELETE FROM quota_counters
            WHERE expires_at <= now()
            "#,
        )
        .execute(&self.pool);

        let result = tokio::time::timeout(self.timeout, purge)
            .await
            .map_err(|_| AppError::Unavailable("postgres counter purge timed out".to_owned()))?
            .map_err(|error| {
                AppError::Unavailable(format!("failed to purge expired quota counters: {error}"))
            })?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CounterStore for PostgresCounterStore {
    async fn increment_with_expiry(&self, key: &str, ttl_seconds: u64) -> AppResult<u64> {
        let ttl_seconds = validate_increment(key, ttl_seconds)?;

        // UPSERT: an expired row restarts at 1, every write refreshes the expiry.
        let query = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO quota_counters (key, count, expires_at)
            VALUES ($1, 1, now() + make_interval(secs => $2::float8))
            ON CONFLICT (key) DO UPDATE
            SET
                count = CASE
                    WHEN quota_counters.expires_at <= now() THEN 1
                    ELSE quota_counters.count + 1
                END,
                expires_at = EXCLUDED.expires_at
            RETURNING count
            "#,
        )
        .bind(key)
        .bind(ttl_seconds as f64)
        .fetch_one(&self.pool);

        let count = tokio::time::timeout(self.timeout, query)
            .await
            .map_err(|_| {
                AppError::Unavailable(format!(
                    "postgres counter increment timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })?
            .map_err(|error| {
                AppError::Unavailable(format!("failed to increment quota counter: {error}"))
            })?;

        checked_count(count, "postgres")
    }

    async fn ping(&self) -> AppResult<()> {
        let check = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool);

        tokio::time::timeout(self.timeout, check)
            .await
            .map_err(|_| AppError::Unavailable("postgres check timed out".to_owned()))?
            .map(|_| ())
            .map_err(|error| AppError::Unavailable(format!("postgres check failed: {error}")))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
