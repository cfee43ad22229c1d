use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use shared::{Clock, SystemClock};

use super::{RevocationStore, StoreError};

/// Process-local revocation store for single-instance deployments and tests.
///
/// Each key maps to the Unix second at which it stops being live. Expired
/// keys are invisible to `contains` immediately. They are swept out by the
/// `register` call that grows the map past its sweep threshold, after which
/// the threshold becomes twice the surviving size. Sweeping cost is
/// therefore amortised over the inserts that preceded it.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<Entries>>,
    clock: Arc<dyn Clock>,
}

/// Smallest map size at which `register` bothers to sweep.
const MIN_SWEEP_AT: usize = 1_024;

#[derive(Debug)]
struct Entries {
    map: HashMap<String, u64>,
    sweep_at: usize,
}

impl Entries {
    fn sweep(&mut self, now: u64) {
        self.map.retain(|_, expires_at| now < *expires_at);
        self.sweep_at = (self.map.len() * 2).max(MIN_SWEEP_AT);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl MemoryStore {
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Entries {
                map: HashMap::new(),
                sweep_at: MIN_SWEEP_AT,
            })),
            clock,
        }
    }

    /// Number of keys still live.
    pub async fn live_count(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .read()
            .await
            .map
            .values()
            .filter(|&&expires_at| now < expires_at)
            .count()
    }
}

impl RevocationStore for MemoryStore {
    async fn register(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        if entries.map.len() >= entries.sweep_at {
            entries.sweep(now);
        }
        entries
            .map
            .insert(key.to_string(), now.saturating_add(ttl.as_secs()));
        Ok(())
    }

    async fn contains(&self, key: &str) -> Result<bool, StoreError> {
        let now = self.clock.now();
        Ok(self
            .entries
            .read()
            .await
            .map
            .get(key)
            .is_some_and(|&expires_at| now < expires_at))
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.map.remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ManualClock;

    fn store() -> (MemoryStore, ManualClock) {
        let clock = ManualClock::new(1_000);
        (MemoryStore::with_clock(Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn registered_key_is_live_until_ttl() {
        let (store, clock) = store();
        store.register("k", Duration::from_secs(60)).await.unwrap();
        assert!(store.contains("k").await.unwrap());

        clock.advance(Duration::from_secs(59));
        assert!(store.contains("k").await.unwrap());

        clock.advance(Duration::from_secs(1));
        assert!(!store.contains("k").await.unwrap());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let (store, _) = store();
        store.register("k", Duration::from_secs(60)).await.unwrap();
        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert!(!store.contains("k").await.unwrap());
    }

    #[tokio::test]
    async fn small_map_is_not_swept_on_every_register() {
        let (store, clock) = store();
        store.register("old", Duration::from_secs(10)).await.unwrap();
        clock.advance(Duration::from_secs(11));
        store.register("new", Duration::from_secs(10)).await.unwrap();

        assert_eq!(store.entries.read().await.map.len(), 2);
        assert_eq!(store.live_count().await, 1);
        assert!(!store.contains("old").await.unwrap());
    }

    #[tokio::test]
    async fn register_sweeps_expired_keys_past_threshold() {
        let (store, clock) = store();
        for i in 0..MIN_SWEEP_AT - 1 {
            store
                .register(&format!("old-{i}"), Duration::from_secs(10))
                .await
                .unwrap();
        }
        store.register("keep", Duration::from_secs(60)).await.unwrap();
        clock.advance(Duration::from_secs(11));

        store.register("new", Duration::from_secs(10)).await.unwrap();

        let entries = store.entries.read().await;
        assert_eq!(entries.map.len(), 2);
        assert_eq!(entries.sweep_at, MIN_SWEEP_AT);
        drop(entries);
        assert!(store.contains("keep").await.unwrap());
        assert!(store.contains("new").await.unwrap());
    }

    #[tokio::test]
    async fn threshold_grows_with_live_keys() {
        let (store, _) = store();
        for i in 0..=MIN_SWEEP_AT {
            store
                .register(&format!("live-{i}"), Duration::from_secs(60))
                .await
                .unwrap();
        }

        let entries = store.entries.read().await;
        assert_eq!(entries.map.len(), MIN_SWEEP_AT + 1);
        assert_eq!(entries.sweep_at, MIN_SWEEP_AT * 2);
    }

    #[tokio::test]
    async fn unknown_key_is_not_live() {
        let (store, _) = store();
        assert!(!store.contains("never-registered").await.unwrap());
        assert!(store.ping().await.is_ok());
    }
}
