use crate::domain::ports::KeyedStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;

struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
    eviction: Option<JoinHandle<()>>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }

    fn cancel_eviction(&self) {
        if let Some(handle) = &self.eviction {
            handle.abort();
        }
    }
}

type Entries<V> = Arc<RwLock<HashMap<String, Entry<V>>>>;

/// A thread-safe in-memory keyed store with per-entry expiry.
///
/// Uses `Arc<RwLock<HashMap<String, _>>>` so clones share the same entries.
/// Each entry put with a TTL gets its own eviction task; reads also check the
/// deadline so an expired entry is never returned, even before its eviction
/// task has run. Contents are lost when the process exits.
pub struct InMemoryStore<V> {
    entries: Entries<V>,
}

impl<V> Default for InMemoryStore<V> {
    fn default() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<V> Clone for InMemoryStore<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<V: Send + Sync + 'static> InMemoryStore<V> {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, including expired ones whose
    /// eviction task has not run yet.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn schedule_eviction(&self, key: String, ttl: Duration) -> JoinHandle<()> {
        // Weak so a dropped store is not kept alive by pending timers.
        let entries: Weak<RwLock<HashMap<String, Entry<V>>>> = Arc::downgrade(&self.entries);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let Some(entries) = entries.upgrade() else {
                return;
            };
            let mut entries = entries.write().await;
            if entries
                .get(&key)
                .is_some_and(|entry| entry.is_expired(Instant::now()))
            {
                entries.remove(&key);
                tracing::debug!(%key, "evicted expired entry");
            }
        })
    }
}

#[async_trait]
impl<V> KeyedStore<V> for InMemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    async fn put(&self, key: String, value: V, ttl: Option<Duration>) -> Result<()> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        let eviction = ttl.map(|ttl| self.schedule_eviction(key.clone(), ttl));

        let mut entries = self.entries.write().await;
        let previous = entries.insert(
            key,
            Entry {
                value,
                expires_at,
                eviction,
            },
        );
        if let Some(previous) = previous {
            previous.cancel_eviction();
        }
        Ok(())
    }

    async fn expire(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.remove(key) {
            entry.cancel_eviction();
        }
        Ok(())
    }
}
