//! Application services and ports.

#![forbid(unsafe_code)]

mod action_service;
mod quota_service;

pub use action_service::{
    ActionGenerator, ActionKind, ActionOutcome, ActionRequest, ActionService, SubjectResolver,
};
pub use quota_service::{
    Clock, CounterStore, DEFAULT_IP_PER_MINUTE, DEFAULT_USER_PER_DAY, DEFAULT_USER_PER_MINUTE,
    FallbackCounterStore, METRICS_HISTORY_CAPACITY, QuotaCounts, QuotaLimits, QuotaMetrics,
    QuotaMetricsHistory, QuotaMetricsPoint, QuotaMetricsSnapshot, QuotaService, SystemClock,
    evaluate_quota,
};
