use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use clawcook_application::ActionKind;
use clawcook_domain::ClientAddress;
use serde_json::Value;

use crate::dto::ActionRequestBody;
use crate::error::ApiResult;
use crate::state::AppState;

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

pub async fn roast_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ActionRequestBody>,
) -> ApiResult<Json<Value>> {
    perform_action(&state, ActionKind::Roast, &headers, payload).await
}

pub async fn deploy_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ActionRequestBody>,
) -> ApiResult<Json<Value>> {
    perform_action(&state, ActionKind::Deploy, &headers, payload).await
}

async fn perform_action(
    state: &AppState,
    kind: ActionKind,
    headers: &HeaderMap,
    payload: ActionRequestBody,
) -> ApiResult<Json<Value>> {
    let outcome = state
        .action_service
        .perform(kind, &payload.username, client_address(headers))
        .await?;

    Ok(Json(outcome.payload))
}

pub(crate) fn client_address(headers: &HeaderMap) -> ClientAddress {
    ClientAddress::from_forwarded_for(
        headers
            .get(FORWARDED_FOR_HEADER)
            .and_then(|value| value.to_str().ok()),
    )
}
