use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use clawcook_application::{Clock, CounterStore, SystemClock};
use clawcook_core::AppResult;
use tokio::sync::Mutex;
use tracing::debug;

use crate::counter_store_support::validate_increment;

#[derive(Debug, Clone, Copy)]
struct CounterEntry {
    count: u64,
    expires_at: DateTime<Utc>,
}

/// In-process counter store used alone or as the local fallback.
pub struct InMemoryCounterStore {
    entries: Mutex<HashMap<String, CounterEntry>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCounterStore {
    /// Creates an empty store on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store reading time from `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Drops expired counters and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "purged expired local counters");
        }
        removed
    }

    /// Number of counters currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns true when no counters are held.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Default for InMemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment_with_expiry(&self, key: &str, ttl_seconds: u64) -> AppResult<u64> {
        let ttl = Duration::seconds(validate_increment(key, ttl_seconds)?);
        let now = self.clock.now();

        // Expiry check and write-back share one critical section.
        let mut entries = self.entries.lock().await;
        let entry = entries
            .entry(key.to_owned())
            .and_modify(|entry| {
                if now >= entry.expires_at {
                    entry.count = 1;
                } else {
                    entry.count = entry.count.saturating_add(1);
                }
                entry.expires_at = now + ttl;
            })
            .or_insert(CounterEntry {
                count: 1,
                expires_at: now + ttl,
            });

        Ok(entry.count)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use chrono::TimeZone;

    use super::*;

    struct SteppingClock {
        now: StdMutex<DateTime<Utc>>,
    }

    impl SteppingClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                now: StdMutex::new(
                    Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0)
                        .single()
                        .unwrap_or_else(|| panic!("test")),
                ),
            })
        }

        fn advance_seconds(&self, seconds: i64) {
            if let Ok(mut now) = self.now.lock() {
                *now += Duration::seconds(seconds);
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            match self.now.lock() {
                Ok(now) => *now,
                Err(poisoned) => *poisoned.into_inner(),
            }
        }
    }

    #[tokio::test]
    async fn first_increment_starts_at_one_and_counts_up() {
        let store = InMemoryCounterStore::with_clock(SteppingClock::new());

        assert_eq!(store.increment_with_expiry("k", 65).await.ok(), Some(1));
        assert_eq!(store.increment_with_expiry("k", 65).await.ok(), Some(2));
        assert_eq!(store.increment_with_expiry("other", 65).await.ok(), Some(1));
    }

    #[tokio::test]
    async fn expired_counter_starts_over() {
        let clock = SteppingClock::new();
        let store = InMemoryCounterStore::with_clock(clock.clone());

        assert_eq!(store.increment_with_expiry("k", 10).await.ok(), Some(1));
        assert_eq!(store.increment_with_expiry("k", 10).await.ok(), Some(2));

        clock.advance_seconds(10);
        assert_eq!(store.increment_with_expiry("k", 10).await.ok(), Some(1));
    }

    #[tokio::test]
    async fn every_increment_refreshes_the_ttl() {
        let clock = SteppingClock::new();
        let store = InMemoryCounterStore::with_clock(clock.clone());

        assert_eq!(store.increment_with_expiry("k", 10).await.ok(), Some(1));
        clock.advance_seconds(8);
        assert_eq!(store.increment_with_expiry("k", 10).await.ok(), Some(2));
        clock.advance_seconds(8);
        assert_eq!(store.increment_with_expiry("k", 10).await.ok(), Some(3));
    }

    #[tokio::test]
    async fn invalid_increments_are_rejected() {
        let store = InMemoryCounterStore::new();

        assert!(store.increment_with_expiry("k", 0).await.is_err());
        assert!(store.increment_with_expiry(" ", 10).await.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn purge_drops_only_expired_counters() {
        let clock = SteppingClock::new();
        let store = InMemoryCounterStore::with_clock(clock.clone());

        assert!(store.increment_with_expiry("short", 5).await.is_ok());
        assert!(store.increment_with_expiry("long", 500).await.is_ok());
        clock.advance_seconds(6);

        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_not_lost() {
        let store = Arc::new(InMemoryCounterStore::new());

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.increment_with_expiry("shared", 65).await
            }));
        }

        let mut counts = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(Ok(count)) => counts.push(count),
                Ok(Err(error)) => panic!("increment failed: {error}"),
                Err(error) => panic!("task failed: {error}"),
            }
        }

        counts.sort_unstable();
        assert_eq!(counts, (1..=50).collect::<Vec<u64>>());
    }
}
