use clawcook_application::{ActionService, QuotaService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub action_service: ActionService,
    pub quota_service: QuotaService,
    pub metrics_api_token: Option<String>,
}
