use clawcook_core::{AppError, AppResult};

/// Rejects increments no store could honor.
pub(crate) fn validate_increment(key: &str, ttl_seconds: u64) -> AppResult<i64> {
    if key.trim().is_empty() {
        return Err(AppError::Validation(
            "counter key must not be empty".to_owned(),
        ));
    }

    if ttl_seconds == 0 {
        return Err(AppError::Validation(
            "counter ttl_seconds must be greater than zero".to_owned(),
        ));
    }

    i64::try_from(ttl_seconds)
        .map_err(|error| AppError::Validation(format!("invalid counter ttl: {error}")))
}

/// Converts a raw store count into a post-increment count.
pub(crate) fn checked_count(raw: i64, backend: &str) -> AppResult<u64> {
    u64::try_from(raw)
        .ok()
        .filter(|count| *count > 0)
        .ok_or_else(|| AppError::Unavailable(format!("{backend} returned invalid count {raw}")))
}
