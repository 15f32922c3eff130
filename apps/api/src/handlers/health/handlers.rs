use super::checks::check_counter_store;
use super::*;

/// Reports counter store health.
///
/// A failing remote store marks the service `degraded` but keeps HTTP 200:
/// quota decisions continue on local counters.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let counter_store = check_counter_store(&state.quota_service).await;
    let status = if counter_store.status == "error" {
        "degraded"
    } else {
        "ok"
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status,
            ready: true,
            counter_store,
        }),
    )
}
