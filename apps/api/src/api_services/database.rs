use std::time::Duration;

use clawcook_core::AppError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

const MIGRATION_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Builds a pool that connects on first use, so an unreachable database
/// surfaces as counter store errors instead of a failed startup.
pub fn connect_lazy_pool(
    database_url: &str,
    acquire_timeout: Duration,
) -> Result<PgPool, AppError> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(acquire_timeout)
        .connect_lazy(database_url)
        .map_err(|error| AppError::Validation(format!("invalid DATABASE_URL: {error}")))
}

/// Applies embedded migrations in the background, retrying until the
/// database accepts them.
pub fn spawn_migrations(pool: PgPool) {
    tokio::spawn(async move {
        loop {
            match sqlx::migrate!("../../crates/infrastructure/migrations")
                .run(&pool)
                .await
            {
                Ok(()) => {
                    info!("counter store migrations applied");
                    break;
                }
                Err(error) => {
                    warn!(
                        error = %error,
                        retry_in_seconds = MIGRATION_RETRY_DELAY.as_secs(),
                        "counter store migrations failed"
                    );
                    tokio::time::sleep(MIGRATION_RETRY_DELAY).await;
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_database_url_is_a_validation_error() {
        let result = connect_lazy_pool("not a database url", Duration::from_millis(200));

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
