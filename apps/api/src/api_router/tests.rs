use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::{DateTime, TimeZone, Utc};
use clawcook_application::{
    ActionGenerator, ActionRequest, ActionService, Clock, CounterStore, QuotaLimits, QuotaService,
    SubjectResolver,
};
use clawcook_core::{AppError, AppResult};
use clawcook_domain::{Handle, SubjectId};
use clawcook_infrastructure::InMemoryCounterStore;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::state::AppState;

use super::build_router;

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 30)
            .single()
            .unwrap_or_else(|| panic!("test"))
    }
}

struct DownCounterStore;

#[async_trait]
impl CounterStore for DownCounterStore {
    async fn increment_with_expiry(&self, _key: &str, _ttl_seconds: u64) -> AppResult<u64> {
        Err(AppError::Unavailable("connection refused".to_owned()))
    }

    async fn ping(&self) -> AppResult<()> {
        Err(AppError::Unavailable("connection refused".to_owned()))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

struct StaticResolver;

#[async_trait]
impl SubjectResolver for StaticResolver {
    async fn resolve_subject(&self, handle: &Handle) -> AppResult<SubjectId> {
        match handle.as_str() {
            "alice" => Ok(SubjectId::new(1)),
            "bob" => Ok(SubjectId::new(2)),
            other => Err(AppError::NotFound(format!("user '{other}' not found"))),
        }
    }
}

struct EchoGenerator;

#[async_trait]
impl ActionGenerator for EchoGenerator {
    async fn generate(&self, request: &ActionRequest) -> AppResult<Value> {
        Ok(json!({
            "kind": request.kind.as_str(),
            "handle": request.subject.handle().as_str(),
        }))
    }
}

fn test_router(
    remote_store: Option<Arc<dyn CounterStore>>,
    metrics_api_token: Option<&str>,
) -> Router {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock);
    let quota_service = QuotaService::new(
        Arc::new(InMemoryCounterStore::with_clock(clock.clone())),
        remote_store,
        QuotaLimits::default(),
        clock,
    );
    let app_state = AppState {
        action_service: ActionService::new(
            quota_service.clone(),
            Arc::new(StaticResolver),
            Arc::new(EchoGenerator),
        ),
        quota_service,
        metrics_api_token: metrics_api_token.map(str::to_owned),
    };

    build_router(app_state, "http://localhost:3000")
        .unwrap_or_else(|error| panic!("router should build: {error}"))
}

fn action_request(path: &str, username: &str, forwarded_for: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", forwarded_for)
        .body(Body::from(json!({ "username": username }).to_string()))
        .unwrap_or_else(|error| panic!("request: {error}"))
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .unwrap_or_else(|error| panic!("request: {error}"))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|error| panic!("body: {error}"));
    serde_json::from_slice(&bytes).unwrap_or_else(|error| panic!("json: {error}"))
}

#[tokio::test]
async fn sixth_roast_in_a_minute_is_rejected_with_429() {
    let router = test_router(None, None);

    for _ in 0..5 {
        let response = router
            .clone()
            .oneshot(action_request("/api/roast", "@Alice", "198.51.100.7"))
            .await
            .unwrap_or_else(|error| panic!("call: {error}"));
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["handle"], "alice");
    }

    let response = router
        .clone()
        .oneshot(action_request("/api/roast", "alice", "198.51.100.7"))
        .await
        .unwrap_or_else(|error| panic!("call: {error}"));
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = json_body(response).await;
    assert_eq!(
        body["message"],
        "Rate limit exceeded: max 5 requests per 60 seconds. Please retry after 60 seconds."
    );
}

#[tokio::test]
async fn roast_and_deploy_share_the_same_quota() {
    let router = test_router(None, None);

    for path in ["/api/roast", "/api/deploy", "/api/roast", "/api/deploy", "/api/roast"] {
        let response = router
            .clone()
            .oneshot(action_request(path, "bob", "198.51.100.8"))
            .await
            .unwrap_or_else(|error| panic!("call: {error}"));
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .oneshot(action_request("/api/deploy", "bob", "198.51.100.8"))
        .await
        .unwrap_or_else(|error| panic!("call: {error}"));
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn blank_username_is_a_bad_request() {
    let router = test_router(None, None);

    let response = router
        .oneshot(action_request("/api/roast", "  @ ", "198.51.100.7"))
        .await
        .unwrap_or_else(|error| panic!("call: {error}"));
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn remote_outage_keeps_serving_and_reports_degraded_health() {
    let router = test_router(Some(Arc::new(DownCounterStore)), None);

    let response = router
        .clone()
        .oneshot(action_request("/api/roast", "alice", "198.51.100.7"))
        .await
        .unwrap_or_else(|error| panic!("call: {error}"));
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(get_request("/health"))
        .await
        .unwrap_or_else(|error| panic!("call: {error}"));
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["counter_store"]["status"], "error");

    let response = router
        .oneshot(get_request("/api/metrics"))
        .await
        .unwrap_or_else(|error| panic!("call: {error}"));
    let body = json_body(response).await;
    assert_eq!(body["rate_limit"]["allowed"], 1);
    assert_eq!(body["rate_limit"]["backend_fallbacks"], 3);
}

#[tokio::test]
async fn memory_only_health_reports_store_disabled() {
    let router = test_router(None, None);

    let response = router
        .oneshot(get_request("/health"))
        .await
        .unwrap_or_else(|error| panic!("call: {error}"));
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["counter_store"]["status"], "disabled");
    assert_eq!(body["counter_store"]["backend"], "memory");
}

#[tokio::test]
async fn metrics_token_is_enforced_when_configured() {
    let router = test_router(None, Some("s3cret"));

    let response = router
        .clone()
        .oneshot(get_request("/api/metrics"))
        .await
        .unwrap_or_else(|error| panic!("call: {error}"));
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .clone()
        .oneshot(get_request("/api/metrics?token=wrong"))
        .await
        .unwrap_or_else(|error| panic!("call: {error}"));
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/metrics")
        .header("x-metrics-token", "s3cret")
        .body(Body::empty())
        .unwrap_or_else(|error| panic!("request: {error}"));
    let response = router
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|error| panic!("call: {error}"));
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(get_request("/api/metrics?token=s3cret&format=csv"))
        .await
        .unwrap_or_else(|error| panic!("call: {error}"));
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/csv; charset=utf-8")
    );
}

#[tokio::test]
async fn metrics_history_grows_with_each_poll() {
    let router = test_router(None, None);

    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(get_request("/api/metrics"))
            .await
            .unwrap_or_else(|error| panic!("call: {error}"));
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .oneshot(get_request("/api/metrics?history=2"))
        .await
        .unwrap_or_else(|error| panic!("call: {error}"));
    let body = json_body(response).await;
    assert_eq!(body["history"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["limits"]["user_per_day"], 40);
    assert_eq!(body["counter_store"], "memory");
}
