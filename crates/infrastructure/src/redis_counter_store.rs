//! Redis-backed window counters.

use std::time::Duration;

use async_trait::async_trait;
use clawcook_application::CounterStore;
use clawcook_core::{AppError, AppResult};
use redis::AsyncCommands;

use crate::counter_store_support::{checked_count, validate_increment};

/// Redis implementation of the counter store port.
///
/// `INCR` and `EXPIRE` run in one `MULTI` block so a counter is never left
/// without a TTL. Every call is bounded by the configured timeout and any
/// failure is reported as [`AppError::Unavailable`].
#[derive(Clone)]
pub struct RedisCounterStore {
    client: redis::Client,
    timeout: Duration,
}

impl RedisCounterStore {
    /// Creates a store with a configured Redis client and per-call timeout.
    #[must_use]
    pub fn new(client: redis::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn increment_inner(&self, key: &str, ttl_seconds: i64) -> AppResult<u64> {
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("failed to connect to redis: {error}"))
            })?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, ttl_seconds)
            .ignore()
            .query_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("failed to increment redis counter: {error}"))
            })?;

        checked_count(count, "redis")
    }

    async fn ping_inner(&self) -> AppResult<()> {
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("redis connection failed: {error}"))
            })?;

        let response = connection
            .ping::<String>()
            .await
            .map_err(|error| AppError::Unavailable(format!("redis ping failed: {error}")))?;

        if response.eq_ignore_ascii_case("pong") {
            Ok(())
        } else {
            Err(AppError::Unavailable(format!(
                "unexpected redis ping response: {response}"
            )))
        }
    }

    fn timed_out(&self, operation: &str) -> AppError {
        AppError::Unavailable(format!(
            "redis {operation} timed out after {}ms",
            self.timeout.as_millis()
        ))
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment_with_expiry(&self, key: &str, ttl_seconds: u64) -> AppResult<u64> {
        let ttl_seconds = validate_increment(key, ttl_seconds)?;

        tokio::time::timeout(self.timeout, self.increment_inner(key, ttl_seconds))
            .await
            .map_err(|_| self.timed_out("increment"))?
    }

    async fn ping(&self) -> AppResult<()> {
        tokio::time::timeout(self.timeout, self.ping_inner())
            .await
            .map_err(|_| self.timed_out("ping"))?
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
