//! Secret cache for reducing backend calls
//!
//! A bounded in-memory cache with least-recently-used eviction and two
//! independent expiry timers:
//!
//! - **expire-after-write**: measured from insertion, never reset by reads
//! - **expire-after-access**: measured from the most recent read or write
//!
//! An entry is gone as soon as either timer elapses.
//!
//! [`SecretCache::get_or_compute`] runs at most one computation per key at a
//! time. Concurrent callers for the same key await the same shared future and
//! all observe its result, success or failure. Failures are never stored, so
//! the next call after a failure computes again. Computations for different
//! keys run in parallel; the internal lock is only held for bookkeeping and
//! never across a computation.

use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::error::Result;

/// Default maximum number of cached entries.
pub const DEFAULT_MAXIMUM_SIZE: usize = 1000;
/// Default expire-after-write (45 minutes).
pub const DEFAULT_EXPIRE_AFTER_WRITE: Duration = Duration::from_secs(45 * 60);
/// Default expire-after-access (15 minutes).
pub const DEFAULT_EXPIRE_AFTER_ACCESS: Duration = Duration::from_secs(15 * 60);

/// Default maximum number of cached user secrets.
pub const DEFAULT_USER_SECRET_MAXIMUM_SIZE: usize = 50_000;
/// Default expire-after-write for user secrets (60 minutes).
pub const DEFAULT_USER_SECRET_EXPIRE_AFTER_WRITE: Duration = Duration::from_secs(60 * 60);
/// Default expire-after-access for user secrets (20 minutes).
pub const DEFAULT_USER_SECRET_EXPIRE_AFTER_ACCESS: Duration = Duration::from_secs(20 * 60);

/// Size and expiry limits for a [`SecretCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    pub maximum_size: usize,
    pub expire_after_write: Duration,
    pub expire_after_access: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            maximum_size: DEFAULT_MAXIMUM_SIZE,
            expire_after_write: DEFAULT_EXPIRE_AFTER_WRITE,
            expire_after_access: DEFAULT_EXPIRE_AFTER_ACCESS,
        }
    }
}

impl CacheSettings {
    /// Limits used for decrypted user secrets.
    pub fn user_secrets() -> Self {
        Self {
            maximum_size: DEFAULT_USER_SECRET_MAXIMUM_SIZE,
            expire_after_write: DEFAULT_USER_SECRET_EXPIRE_AFTER_WRITE,
            expire_after_access: DEFAULT_USER_SECRET_EXPIRE_AFTER_ACCESS,
        }
    }
}

type SharedComputation<V> = Shared<BoxFuture<'static, Result<V>>>;

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    written_at: Instant,
    accessed_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, now: Instant) -> Self {
        Self { value, written_at: now, accessed_at: now }
    }

    fn is_expired(&self, now: Instant, settings: &CacheSettings) -> bool {
        now.duration_since(self.written_at) >= settings.expire_after_write
            || now.duration_since(self.accessed_at) >= settings.expire_after_access
    }
}

struct InFlight<V: Clone> {
    id: u64,
    computation: SharedComputation<V>,
}

struct CacheState<K: Hash + Eq, V: Clone> {
    entries: LruCache<K, CacheEntry<V>>,
    in_flight: HashMap<K, InFlight<V>>,
    next_flight_id: u64,
}

impl<K: Hash + Eq + Clone, V: Clone> CacheState<K, V> {
    /// Returns a live entry, recording the access. Expired entries are dropped.
    fn lookup(&mut self, key: &K, now: Instant, settings: &CacheSettings) -> Option<V> {
        let expired = self.entries.peek(key)?.is_expired(now, settings);
        if expired {
            self.entries.pop(key);
            debug!("Cache entry expired");
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.accessed_at = now;
        Some(entry.value.clone())
    }
}

/// Bounded, dual-TTL cache with single-flight computation per key.
pub struct SecretCache<K: Hash + Eq, V: Clone> {
    state: Arc<Mutex<CacheState<K, V>>>,
    settings: CacheSettings,
}

impl<K, V> SecretCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a new cache with the given limits
    pub fn new(settings: CacheSettings) -> Self {
        let capacity = NonZeroUsize::new(settings.maximum_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Arc::new(Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                in_flight: HashMap::new(),
                next_flight_id: 0,
            })),
            settings,
        }
    }

    /// Create a new cache with default limits (1000 entries, 45m write, 15m access)
    pub fn with_default_settings() -> Self {
        Self::new(CacheSettings::default())
    }

    /// Returns the cached value for `key`, computing it with `compute` on a miss.
    ///
    /// `compute` is only called by the caller that starts a computation; its
    /// future may outlive that caller and is driven by whoever is awaiting it.
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let (flight_id, computation) = {
            let mut state = self.state.lock().await;
            if let Some(value) = state.lookup(&key, Instant::now(), &self.settings) {
                debug!("Cache hit");
                return Ok(value);
            }

            match state.in_flight.get(&key) {
                Some(flight) => {
                    debug!("Joining in-flight computation");
                    (flight.id, flight.computation.clone())
                }
                None => {
                    debug!("Cache miss, starting computation");
                    let id = state.next_flight_id;
                    state.next_flight_id += 1;
                    let computation = compute().boxed().shared();
                    state
                        .in_flight
                        .insert(key.clone(), InFlight { id, computation: computation.clone() });
                    (id, computation)
                }
            }
        };

        let result = computation.await;
        self.complete(&key, flight_id, &result).await;
        result
    }

    /// Retires a finished computation, storing its value if it succeeded.
    ///
    /// Only the first waiter to get here does anything; a computation that
    /// was discarded by [`SecretCache::clear`] or [`SecretCache::invalidate`]
    /// is not stored.
    async fn complete(&self, key: &K, flight_id: u64, result: &Result<V>) {
        let mut state = self.state.lock().await;
        let owns_flight = state.in_flight.get(key).is_some_and(|flight| flight.id == flight_id);
        if !owns_flight {
            return;
        }

        state.in_flight.remove(key);
        match result {
            Ok(value) => {
                let entry = CacheEntry::new(value.clone(), Instant::now());
                if state.entries.push(key.clone(), entry).is_some() {
                    debug!("Evicted least recently used cache entry");
                }
            }
            Err(error) => {
                debug!(error_code = error.error_code(), "Computation failed, not caching");
            }
        }
    }

    /// Returns a live cached value without computing one.
    pub async fn get_if_present(&self, key: &K) -> Option<V> {
        let mut state = self.state.lock().await;
        state.lookup(key, Instant::now(), &self.settings)
    }

    /// Invalidate a specific cache entry
    pub async fn invalidate(&self, key: &K) {
        let mut state = self.state.lock().await;
        state.entries.pop(key);
        state.in_flight.remove(key);
    }

    /// Clear all cache entries
    ///
    /// Computations already running finish for their waiters, but their
    /// results are not stored.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        let count = state.entries.len();
        state.entries.clear();
        state.in_flight.clear();
        debug!(count = count, "Cleared secret cache");
    }

    /// Remove expired entries (cleanup)
    pub async fn cleanup_expired(&self) {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let expired: Vec<K> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, &self.settings))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            state.entries.pop(key);
        }
        if !expired.is_empty() {
            debug!(count = expired.len(), "Removed expired cache entries");
        }
    }

    /// Number of stored entries, including expired ones not yet cleaned up
    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.entries.is_empty()
    }

    /// Number of computations currently running
    pub async fn in_flight(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }
}

impl<K: Hash + Eq, V: Clone> Clone for SecretCache<K, V> {
    fn clone(&self) -> Self {
        Self { state: Arc::clone(&self.state), settings: self.settings }
    }
}

impl<K: Hash + Eq, V: Clone> fmt::Debug for SecretCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretCache").field("settings", &self.settings).finish()
    }
}
