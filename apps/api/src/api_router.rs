use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use clawcook_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

#[cfg(test)]
mod tests;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let metrics_routes = Router::new()
        .route("/api/metrics", get(handlers::metrics::metrics_handler))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_metrics_token,
        ));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/api/roast", post(handlers::actions::roast_handler))
        .route("/api/deploy", post(handlers::actions::deploy_handler))
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
