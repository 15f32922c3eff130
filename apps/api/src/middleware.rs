use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use clawcook_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

const METRICS_TOKEN_HEADER: &str = "x-metrics-token";

/// Guards the metrics endpoint when `METRICS_API_TOKEN` is configured.
pub async fn require_metrics_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if let Some(expected) = state.metrics_api_token.as_deref()
        && !presented_tokens(request.headers(), request.uri().query())
            .iter()
            .any(|token| token == expected)
    {
        return Err(AppError::Unauthorized("metrics access requires a valid token".to_owned()).into());
    }

    Ok(next.run(request).await)
}

/// Collects every token the caller offered, in header, bearer and query form.
fn presented_tokens(headers: &HeaderMap, query: Option<&str>) -> Vec<String> {
    let header_token = headers
        .get(METRICS_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bearer_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|value| value.trim().to_owned());
    let query_token = query.and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name == "token")
            .map(|(_, value)| value.into_owned())
    });

    [header_token, bearer_token, query_token]
        .into_iter()
        .flatten()
        .collect()
}
