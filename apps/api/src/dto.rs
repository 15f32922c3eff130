mod actions;
mod common;
mod metrics;

pub use actions::ActionRequestBody;
pub use common::{HealthDependencyStatus, HealthResponse};
pub use metrics::{MetricsQuery, MetricsResponse, QuotaLimitsResponse};
