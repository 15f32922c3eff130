use axum::Json;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use clawcook_application::QuotaMetricsPoint;

use crate::dto::{MetricsQuery, MetricsResponse, QuotaLimitsResponse};
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: usize = 60;
const MIN_HISTORY_LIMIT: usize = 2;
const MAX_HISTORY_LIMIT: usize = 180;
const CSV_HEADER: &str =
    "timestamp,allowed,blocked_user_minute,blocked_user_daily,blocked_ip_minute,backend_fallbacks";

pub async fn metrics_handler(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> ApiResult<Response> {
    let quota_service = &state.quota_service;
    let current = quota_service.record_metrics_point()?;

    let since = parse_timestamp(query.since.as_deref());
    let until = parse_timestamp(query.until.as_deref());
    let history: Vec<QuotaMetricsPoint> = quota_service
        .metrics_history(history_limit(query.history.as_deref()))?
        .into_iter()
        .filter(|point| within_range(point.timestamp, since, until))
        .collect();

    if query
        .format
        .as_deref()
        .is_some_and(|format| format.eq_ignore_ascii_case("csv"))
    {
        return Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"clawcook-metrics-history.csv\"",
                ),
                (header::CACHE_CONTROL, "no-store"),
            ],
            history_csv(&history),
        )
            .into_response());
    }

    Ok(Json(MetricsResponse {
        rate_limit: current.snapshot,
        blocked_total: current.snapshot.blocked_total(),
        limits: QuotaLimitsResponse::from(quota_service.limits()),
        counter_store: quota_service.counter_store_name(),
        history,
        generated_at: current.timestamp,
    })
    .into_response())
}

fn history_limit(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .map_or(DEFAULT_HISTORY_LIMIT, |value| {
            usize::try_from(value.max(0))
                .unwrap_or(DEFAULT_HISTORY_LIMIT)
                .clamp(MIN_HISTORY_LIMIT, MAX_HISTORY_LIMIT)
        })
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|value| DateTime::parse_from_rfc3339(value.trim()).ok())
        .map(|value| value.with_timezone(&Utc))
}

fn within_range(
    timestamp: DateTime<Utc>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> bool {
    since.is_none_or(|since| timestamp >= since) && until.is_none_or(|until| timestamp <= until)
}

fn history_csv(points: &[QuotaMetricsPoint]) -> String {
    let mut lines = Vec::with_capacity(points.len() + 1);
    lines.push(CSV_HEADER.to_owned());
    lines.extend(points.iter().map(|point| {
        let snapshot = point.snapshot;
        format!(
            "{},{},{},{},{},{}",
            point.timestamp.to_rfc3339(),
            snapshot.allowed,
            snapshot.blocked_user_minute,
            snapshot.blocked_user_daily,
            snapshot.blocked_ip_minute,
            snapshot.backend_fallbacks,
        )
    }));
    lines.join("\n")
}
