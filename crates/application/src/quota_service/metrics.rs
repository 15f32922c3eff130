use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use clawcook_domain::QuotaDimension;
use serde::Serialize;

/// Point-in-time copy of the quota counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuotaMetricsSnapshot {
    /// Evaluations that ended in an allow.
    pub allowed: u64,
    /// Denials by the per-user-per-minute rule.
    pub blocked_user_minute: u64,
    /// Denials by the per-user-per-day rule.
    pub blocked_user_daily: u64,
    /// Denials by the per-client-address-per-minute rule.
    pub blocked_ip_minute: u64,
    /// Increments served by the local store after a remote failure.
    pub backend_fallbacks: u64,
}

impl QuotaMetricsSnapshot {
    /// Total denials across all rules.
    #[must_use]
    pub fn blocked_total(&self) -> u64 {
        self.blocked_user_minute + self.blocked_user_daily + self.blocked_ip_minute
    }

    /// Total evaluations; every evaluation lands in exactly one outcome bucket.
    #[must_use]
    pub fn evaluations(&self) -> u64 {
        self.allowed + self.blocked_total()
    }
}

#[derive(Debug, Default)]
struct QuotaCounters {
    allowed: AtomicU64,
    blocked_user_minute: AtomicU64,
    blocked_user_daily: AtomicU64,
    blocked_ip_minute: AtomicU64,
    backend_fallbacks: AtomicU64,
}

/// Process-wide quota outcome counters.
///
/// Cloning shares the same counters. Values only grow for the lifetime of the
/// instance.
#[derive(Debug, Clone, Default)]
pub struct QuotaMetrics {
    counters: Arc<QuotaCounters>,
}

impl QuotaMetrics {
    /// Creates a fresh set of zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> QuotaMetricsSnapshot {
        QuotaMetricsSnapshot {
            allowed: self.counters.allowed.load(Ordering::Relaxed),
            blocked_user_minute: self.counters.blocked_user_minute.load(Ordering::Relaxed),
            blocked_user_daily: self.counters.blocked_user_daily.load(Ordering::Relaxed),
            blocked_ip_minute: self.counters.blocked_ip_minute.load(Ordering::Relaxed),
            backend_fallbacks: self.counters.backend_fallbacks.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record_allowed(&self) {
        self.counters.allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_blocked(&self, dimension: QuotaDimension) {
        let counter = match dimension {
            QuotaDimension::UserMinute => &self.counters.blocked_user_minute,
            QuotaDimension::UserDaily => &self.counters.blocked_user_daily,
            QuotaDimension::IpMinute => &self.counters.blocked_ip_minute,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_backend_fallback(&self) {
        self.counters
            .backend_fallbacks
            .fetch_add(1, Ordering::Relaxed);
    }
}
