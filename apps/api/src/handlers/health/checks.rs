use clawcook_application::QuotaService;

use super::*;

pub(super) async fn check_counter_store(quota_service: &QuotaService) -> HealthDependencyStatus {
    let backend = quota_service.counter_store_name();

    match quota_service.ping_remote_store().await {
        None => HealthDependencyStatus {
            status: "disabled",
            backend,
            detail: None,
        },
        Some(Ok(())) => HealthDependencyStatus {
            status: "ok",
            backend,
            detail: None,
        },
        Some(Err(error)) => HealthDependencyStatus {
            status: "error",
            backend,
            detail: Some(format!("{backend} check failed: {error}")),
        },
    }
}
