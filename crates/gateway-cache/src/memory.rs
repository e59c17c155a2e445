//! Generic in-memory TTL cache with LRU eviction.

use lru::LruCache;
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Cache entry with its expiration deadline.
///
/// A TTL too large to represent as an instant leaves the entry without a
/// deadline.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    expires_at: Option<Instant>,
}

impl<T> CacheEntry<T> {
    fn new(data: T, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// Time-and-capacity bounded cache keyed by string.
///
/// Expiry is checked lazily: an expired entry is treated as a miss and removed
/// on lookup. When the cache is full, expired entries are swept first and the
/// least-recently-used live entry is evicted only if that frees nothing.
/// All mutations happen under one lock, so readers never observe a
/// half-written entry.
pub struct TtlCache<V> {
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
    ttl: Duration,
    capacity: NonZeroUsize,
}

impl<V> fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<V: Clone> TtlCache<V> {
    /// Create an empty cache. A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            capacity,
        }
    }

    /// Time-to-live applied to every inserted entry.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Returns a clone of the live entry for `key`, marking it recently used.
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.data.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(key);
            debug!(key, "Dropped expired cache entry");
        }
        None
    }

    /// Inserts or replaces the entry for `key` with a fresh expiration.
    pub async fn insert(&self, key: String, value: V) {
        let mut entries = self.entries.lock().await;

        if entries.len() >= self.capacity.get() && !entries.contains(&key) {
            let swept = sweep(&mut entries, Instant::now());
            if swept > 0 {
                debug!(swept, "Swept expired entries before insert");
            }
        }

        if let Some((evicted, _)) = entries.push(key.clone(), CacheEntry::new(value, self.ttl)) {
            if evicted != key {
                debug!(evicted = %evicted, "Evicted least recently used cache entry");
            }
        }
    }

    /// Removes the entry for `key`, returning its value if it was still live.
    pub async fn remove(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .pop(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.data)
    }

    /// Removes every expired entry. Returns the number removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        sweep(&mut entries, Instant::now())
    }

    /// Removes every entry.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn sweep<V>(entries: &mut LruCache<String, CacheEntry<V>>, now: Instant) -> usize {
    let expired: Vec<String> = entries
        .iter()
        .filter(|(_, entry)| entry.is_expired(now))
        .map(|(key, _)| key.clone())
        .collect();

    for key in &expired {
        entries.pop(key);
    }
    expired.len()
}
