use std::sync::Arc;

use clawcook_application::CounterStore;
use clawcook_core::{AppError, AppResult};
use clawcook_infrastructure::{PostgresCounterStore, RedisCounterStore, UpstashCounterStore};

use crate::api_config::{ApiConfig, CounterStoreConfig};

use super::super::database::{connect_lazy_pool, spawn_migrations};

pub(super) struct RemoteCounterStore {
    pub store: Option<Arc<dyn CounterStore>>,
    pub postgres_store: Option<PostgresCounterStore>,
}

/// Builds the configured remote store without contacting it, so startup
/// succeeds while the backend is down.
pub(super) fn build_remote_counter_store(config: &ApiConfig) -> AppResult<RemoteCounterStore> {
    let timeout = config.counter_store_timeout;

    let remote = match &config.counter_store {
        CounterStoreConfig::Memory => RemoteCounterStore {
            store: None,
            postgres_store: None,
        },
        CounterStoreConfig::Upstash {
            rest_url,
            rest_token,
        } => RemoteCounterStore {
            store: Some(Arc::new(UpstashCounterStore::new(
                reqwest::Client::new(),
                rest_url.clone(),
                rest_token.clone(),
                timeout,
            ))),
            postgres_store: None,
        },
        CounterStoreConfig::Redis { redis_url } => RemoteCounterStore {
            store: Some(Arc::new(RedisCounterStore::new(
                redis_client(redis_url)?,
                timeout,
            ))),
            postgres_store: None,
        },
        CounterStoreConfig::Postgres { database_url } => {
            let pool = connect_lazy_pool(database_url, timeout)?;
            spawn_migrations(pool.clone());
            let store = PostgresCounterStore::new(pool, timeout);
            RemoteCounterStore {
                store: Some(Arc::new(store.clone())),
                postgres_store: Some(store),
            }
        }
    };

    Ok(remote)
}

fn redis_client(redis_url: &str) -> AppResult<redis::Client> {
    redis::Client::open(redis_url)
        .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))
}
