//! In-memory key/value cache with per-entry TTL.
//!
//! Entries expire lazily on read and are also removed by an optional
//! background sweep. There is no size bound: every distinct key stays until it
//! expires or is deleted.

use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Longest lifetime an entry can get; larger TTLs are clamped to it.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Cached value with its expiry deadline.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl.min(MAX_TTL)).unwrap_or(now);

        Self { value, expires_at }
    }

    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Configuration for a TTL cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL used by [`TtlCache::insert`].
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
        }
    }
}

/// Thread-safe cache with per-entry TTL.
pub struct TtlCache<K, V> {
    entries: DashMap<K, CacheEntry<V>>,
    config: CacheConfig,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    /// Create a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// Get a value if present and not expired.
    pub fn get(&self, key: &K) -> Option<V> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_valid() {
                debug!(key = ?key, "Cache hit");
                return Some(entry.value.clone());
            }
            debug!(key = ?key, "Cache entry expired");
            drop(entry);
            // Re-check under the write lock; a concurrent set may have refreshed it.
            self.entries.remove_if(key, |_, e| !e.is_valid());
            return None;
        }

        debug!(key = ?key, "Cache miss");
        None
    }

    /// Store a value for `ttl`.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        self.entries.insert(key, CacheEntry::new(value, ttl));
    }

    /// Store a value with the default TTL.
    pub fn insert(&self, key: K, value: V) {
        self.set(key, value, self.config.default_ttl);
    }

    /// Remove a key. Returns whether anything was stored under it.
    pub fn delete(&self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every expired entry, returning how many were dropped.
    pub fn evict_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_valid());
        before.saturating_sub(self.entries.len())
    }

    /// Return the cached value, or run `load` and cache its `Ok` result.
    ///
    /// Errors are returned to the caller and nothing is stored. Concurrent
    /// misses on the same key each run their own loader.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        key: K,
        ttl: Duration,
        load: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let value = load().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }

    pub fn stats(&self) -> CacheStats {
        let total = self.entries.len();
        let valid = self.entries.iter().filter(|e| e.is_valid()).count();

        CacheStats {
            total_entries: total,
            valid_entries: valid,
            expired_entries: total.saturating_sub(valid),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Start a background task that evicts expired entries every `interval`.
    ///
    /// The task only holds a weak reference and exits once the cache is
    /// dropped, the handle is dropped, or [`SweeperHandle::stop`] is called.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let cache = Arc::downgrade(self);
        let period = interval.clamp(Duration::from_millis(1), MAX_TTL);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(cache) = cache.upgrade() else {
                            break;
                        };
                        let removed = cache.evict_expired();
                        if removed > 0 {
                            debug!(removed, remaining = cache.len(), "Swept expired cache entries");
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }

            debug!("Cache sweeper stopped");
        });

        SweeperHandle {
            shutdown_tx,
            handle,
        }
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running cache sweeper.
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper to stop and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.handle.await;
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}
