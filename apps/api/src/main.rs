//! Clawcook API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use clawcook_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_router::build_router;
use crate::api_services::{build_app_state, spawn_counter_purge_task};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let runtime = build_app_state(&config).await?;
    let _purge_task = spawn_counter_purge_task(
        runtime.purge_targets,
        config.local_counter_purge_interval,
    );

    let app = build_router(runtime.app_state, &config.frontend_url)?;
    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(
        %address,
        counter_store = config.counter_store.label(),
        user_per_minute = config.quota_limits.user_per_minute(),
        user_per_day = config.quota_limits.user_per_day(),
        ip_per_minute = config.quota_limits.ip_per_minute(),
        "clawcook-api listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
