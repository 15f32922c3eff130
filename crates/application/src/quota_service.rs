//! Multi-tier quota enforcement.
//!
//! Fixed-window counters per user per minute, per user per UTC day and per
//! client address per minute, kept in a pluggable counter store with an
//! in-process degrade path.

mod config;
mod fallback;
mod history;
mod metrics;
mod ports;
mod service;


pub use config::{
    DEFAULT_IP_PER_MINUTE, DEFAULT_USER_PER_DAY, DEFAULT_USER_PER_MINUTE, QuotaLimits,
};
pub use fallback::FallbackCounterStore;
pub use history::{METRICS_HISTORY_CAPACITY, QuotaMetricsHistory, QuotaMetricsPoint};
pub use metrics::{QuotaMetrics, QuotaMetricsSnapshot};
pub use ports::{Clock, CounterStore, SystemClock};
pub use service::{QuotaCounts, QuotaService, evaluate_quota};
