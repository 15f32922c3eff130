use chrono::{DateTime, Utc};
use clawcook_application::{QuotaLimits, QuotaMetricsPoint, QuotaMetricsSnapshot};
use serde::{Deserialize, Serialize};

/// Query parameters accepted by the metrics endpoint.
///
/// Values are kept as raw strings so malformed input falls back to defaults
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct MetricsQuery {
    pub history: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub format: Option<String>,
}

/// Configured quota thresholds.
#[derive(Debug, Serialize)]
pub struct QuotaLimitsResponse {
    pub user_per_minute: u64,
    pub user_per_day: u64,
    pub ip_per_minute: u64,
}

impl From<&QuotaLimits> for QuotaLimitsResponse {
    fn from(value: &QuotaLimits) -> Self {
        Self {
            user_per_minute: value.user_per_minute(),
            user_per_day: value.user_per_day(),
            ip_per_minute: value.ip_per_minute(),
        }
    }
}

/// Metrics endpoint JSON payload.
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub rate_limit: QuotaMetricsSnapshot,
    pub blocked_total: u64,
    pub limits: QuotaLimitsResponse,
    pub counter_store: &'static str,
    pub history: Vec<QuotaMetricsPoint>,
    pub generated_at: DateTime<Utc>,
}
