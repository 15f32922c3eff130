use std::sync::Arc;

use tracing::{debug, info};

use clawcook_core::AppResult;
use clawcook_domain::{QuotaDecision, QuotaDimension, QuotaSubject, WindowKey, window_keys};

use super::config::QuotaLimits;
use super::fallback::FallbackCounterStore;
use super::history::{QuotaMetricsHistory, QuotaMetricsPoint};
use super::metrics::{QuotaMetrics, QuotaMetricsSnapshot};
use super::ports::{Clock, CounterStore};

/// Post-increment counts for one evaluation, in rule order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaCounts {
    /// Per-user-per-minute count.
    pub user_minute: u64,
    /// Per-user-per-day count.
    pub user_daily: u64,
    /// Per-client-address-per-minute count.
    pub ip_minute: u64,
}

impl QuotaCounts {
    fn get(&self, dimension: QuotaDimension) -> u64 {
        match dimension {
            QuotaDimension::UserMinute => self.user_minute,
            QuotaDimension::UserDaily => self.user_daily,
            QuotaDimension::IpMinute => self.ip_minute,
        }
    }
}

/// Applies the three rules in fixed order; the first violated rule wins.
#[must_use]
pub fn evaluate_quota(limits: &QuotaLimits, counts: QuotaCounts) -> QuotaDecision {
    QuotaDimension::ALL
        .into_iter()
        .find(|dimension| counts.get(*dimension) > limits.threshold(*dimension))
        .map_or(QuotaDecision::Allowed, |dimension| QuotaDecision::Denied {
            dimension,
            reason: limits.denial_reason(dimension),
        })
}

/// Multi-tier fixed-window quota evaluator.
#[derive(Clone)]
pub struct QuotaService {
    counter_store: Arc<dyn CounterStore>,
    remote_configured: bool,
    limits: QuotaLimits,
    metrics: QuotaMetrics,
    history: QuotaMetricsHistory,
    clock: Arc<dyn Clock>,
}

impl QuotaService {
    /// Creates a quota service.
    ///
    /// With a `remote_store`, increments go to it first and degrade to
    /// `local_store` per key when it is unavailable. Without one the service
    /// runs on `local_store` alone.
    #[must_use]
    pub fn new(
        local_store: Arc<dyn CounterStore>,
        remote_store: Option<Arc<dyn CounterStore>>,
        limits: QuotaLimits,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let metrics = QuotaMetrics::new();
        let remote_configured = remote_store.is_some();
        let counter_store: Arc<dyn CounterStore> = match remote_store {
            Some(remote_store) => Arc::new(FallbackCounterStore::new(
                remote_store,
                local_store,
                metrics.clone(),
            )),
            None => local_store,
        };

        Self {
            counter_store,
            remote_configured,
            limits,
            metrics,
            history: QuotaMetricsHistory::new(),
            clock,
        }
    }

    /// Records one request against all quota windows and decides whether it may proceed.
    ///
    /// All three counters are incremented before any rule is checked, so a
    /// request blocked by the minute rule still counts toward the daily and
    /// address windows. Increments are never rolled back. Backend outages are
    /// absorbed by the local fallback; only invalid input surfaces as an error.
    pub async fn check_rate_limit(&self, subject: &QuotaSubject) -> AppResult<QuotaDecision> {
        let now = self.clock.now();
        let [user_minute_key, user_daily_key, ip_minute_key] = window_keys(subject, now);

        let (user_minute, user_daily, ip_minute) = tokio::join!(
            self.increment(&user_minute_key),
            self.increment(&user_daily_key),
            self.increment(&ip_minute_key),
        );
        let counts = QuotaCounts {
            user_minute: user_minute?,
            user_daily: user_daily?,
            ip_minute: ip_minute?,
        };

        let decision = evaluate_quota(&self.limits, counts);
        match &decision {
            QuotaDecision::Allowed => {
                self.metrics.record_allowed();
                debug!(
                    subject_id = %subject.subject_id(),
                    handle = %subject.handle(),
                    user_minute = counts.user_minute,
                    user_daily = counts.user_daily,
                    ip_minute = counts.ip_minute,
                    "quota check allowed"
                );
            }
            QuotaDecision::Denied { dimension, .. } => {
                self.metrics.record_blocked(*dimension);
                info!(
                    subject_id = %subject.subject_id(),
                    handle = %subject.handle(),
                    client_address = %subject.client_address(),
                    rule = %dimension,
                    count = counts.get(*dimension),
                    limit = self.limits.threshold(*dimension),
                    "quota check denied"
                );
            }
        }

        Ok(decision)
    }

    /// Returns the configured thresholds.
    #[must_use]
    pub fn limits(&self) -> &QuotaLimits {
        &self.limits
    }

    /// Returns a copy of the outcome counters.
    #[must_use]
    pub fn metrics(&self) -> QuotaMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Snapshots the counters into the metrics history and returns the new point.
    pub fn record_metrics_point(&self) -> AppResult<QuotaMetricsPoint> {
        let point = QuotaMetricsPoint {
            timestamp: self.clock.now(),
            snapshot: self.metrics.snapshot(),
        };
        self.history.append(point)?;
        Ok(point)
    }

    /// Returns up to `limit` recent metrics points, oldest first.
    pub fn metrics_history(&self, limit: usize) -> AppResult<Vec<QuotaMetricsPoint>> {
        self.history.recent(limit)
    }

    /// Label of the store increments go to first.
    #[must_use]
    pub fn counter_store_name(&self) -> &'static str {
        self.counter_store.backend_name()
    }

    /// Probes the remote store; `None` when running on local counters only.
    pub async fn ping_remote_store(&self) -> Option<AppResult<()>> {
        if !self.remote_configured {
            return None;
        }

        Some(self.counter_store.ping().await)
    }

    async fn increment(&self, window_key: &WindowKey) -> AppResult<u64> {
        self.counter_store
            .increment_with_expiry(window_key.key(), window_key.ttl_seconds())
            .await
    }
}
