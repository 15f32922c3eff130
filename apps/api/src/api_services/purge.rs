use std::sync::Arc;
use std::time::Duration;

use clawcook_infrastructure::{InMemoryCounterStore, PostgresCounterStore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Stores whose expired counters are swept periodically.
pub struct PurgeTargets {
    pub local_store: Arc<InMemoryCounterStore>,
    pub postgres_store: Option<PostgresCounterStore>,
}

pub fn spawn_counter_purge_task(targets: PurgeTargets, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            purge_once(&targets).await;
        }
    })
}

async fn purge_once(targets: &PurgeTargets) {
    let removed = targets.local_store.purge_expired().await;
    debug!(removed, "local counter purge finished");

    if let Some(postgres_store) = &targets.postgres_store {
        match postgres_store.purge_expired().await {
            Ok(removed) => debug!(removed, "postgres counter purge finished"),
            Err(error) => warn!(error = %error, "postgres counter purge failed"),
        }
    }
}
