use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use clawcook_core::AppResult;

use super::metrics::QuotaMetrics;
use super::ports::CounterStore;

/// Counter store that degrades to a secondary store when the primary is unavailable.
///
/// Only `AppError::Unavailable` triggers the fallback. Every fallback is
/// recorded in the shared quota metrics.
pub struct FallbackCounterStore {
    primary: Arc<dyn CounterStore>,
    fallback: Arc<dyn CounterStore>,
    metrics: QuotaMetrics,
}

impl FallbackCounterStore {
    /// Wraps `primary`, retrying unavailable increments against `fallback`.
    #[must_use]
    pub fn new(
        primary: Arc<dyn CounterStore>,
        fallback: Arc<dyn CounterStore>,
        metrics: QuotaMetrics,
    ) -> Self {
        Self {
            primary,
            fallback,
            metrics,
        }
    }
}

#[async_trait]
impl CounterStore for FallbackCounterStore {
    async fn increment_with_expiry(&self, key: &str, ttl_seconds: u64) -> AppResult<u64> {
        match self.primary.increment_with_expiry(key, ttl_seconds).await {
            Err(error) if error.is_unavailable() => {
                warn!(
                    primary = self.primary.backend_name(),
                    fallback = self.fallback.backend_name(),
                    key,
                    error = %error,
                    "counter store unavailable, falling back"
                );
                self.metrics.record_backend_fallback();
                self.fallback.increment_with_expiry(key, ttl_seconds).await
            }
            result => result,
        }
    }

    async fn ping(&self) -> AppResult<()> {
        self.primary.ping().await
    }

    fn backend_name(&self) -> &'static str {
        self.primary.backend_name()
    }
}
