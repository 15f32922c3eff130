use async_trait::async_trait;
use chrono::{DateTime, Utc};

use clawcook_core::AppResult;

/// Port for an atomic increment-with-expiry counter store.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increments the counter for `key` and (re)sets its TTL.
    ///
    /// A missing or expired counter starts over at 1. Returns the count after
    /// the increment. Transport failures, timeouts and malformed responses
    /// must surface as `AppError::Unavailable`, never as a guessed count.
    async fn increment_with_expiry(&self, key: &str, ttl_seconds: u64) -> AppResult<u64>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    /// Short label for logs and health output.
    fn backend_name(&self) -> &'static str;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by [`Utc::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
