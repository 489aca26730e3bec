//! Cache Engine Module
//!
//! Public Set/Get API layered on the [`Store`], with expiry, capacity
//! eviction and the sweeper lifecycle.
//!
//! # Locking
//! One `RwLock` guards the store. Set and purge passes take the write lock.
//! Get scans under the read lock and, if it meets an expired match before a
//! live one, retries the whole scan under the write lock so the removal
//! never happens under shared access.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::cache::stats::StatsCounters;
use crate::cache::{CacheStats, Entry, Store};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::tasks::Sweeper;

// == Cached Value ==
/// A live hit returned by [`TtlCache::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedValue {
    /// The stored payload
    pub value: Bytes,
    /// Time left before the entry expires
    pub ttl: Duration,
}

// == Shared State ==
/// State shared between the engine handle and its sweeper.
#[derive(Debug)]
pub(crate) struct Shared {
    store: RwLock<Store>,
    stats: StatsCounters,
    capacity: usize,
}

enum SharedScan {
    Hit(CachedValue),
    Miss,
    NeedsRemoval,
}

impl Shared {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            store: RwLock::new(Store::new()),
            stats: StatsCounters::default(),
            capacity,
        }
    }

    // == Set ==
    pub(crate) fn set(&self, key: Bytes, value: Bytes, ttl: Duration) {
        let now = Instant::now();
        let entry = Entry::new(key, value, ttl, now);

        let mut store = self.store.write();
        store.insert_front(entry);

        let count = store.count();
        if count > self.capacity {
            if evict_oldest_expired(&mut store, now) {
                self.stats.record_eviction();
                debug!("Evicted oldest expired entry at {} entries", count);
            } else {
                debug!(
                    "Cache over capacity ({} > {}) with no expired entry to evict",
                    count, self.capacity
                );
            }
        }
    }

    // == Get ==
    pub(crate) fn get(&self, key: &[u8]) -> Option<CachedValue> {
        let scan = {
            let store = self.store.read();
            scan_shared(&store, key, Instant::now())
        };

        let found = match scan {
            SharedScan::Hit(hit) => Some(hit),
            SharedScan::Miss => None,
            SharedScan::NeedsRemoval => {
                let mut store = self.store.write();
                let (found, removed) = scan_exclusive(&mut store, key, Instant::now());
                self.stats.record_expired_removed(removed);
                found
            }
        };

        match found {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        found
    }

    // == Purge Expired ==
    /// Removes expired entries from the head, stopping at the first live one.
    ///
    /// Expired entries behind a live one stay linked until Get or eviction
    /// reaches them.
    pub(crate) fn purge_expired(&self) -> usize {
        let removed = {
            let mut store = self.store.write();
            purge_from_head(&mut store, Instant::now())
        };
        self.stats.record_sweep(removed as u64);
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.store.read().count()
    }
}

fn scan_shared(store: &Store, key: &[u8], now: Instant) -> SharedScan {
    match store.find_all(key).next().and_then(|id| store.get(id)) {
        Some(entry) if entry.is_expired(now) => SharedScan::NeedsRemoval,
        Some(entry) => SharedScan::Hit(CachedValue {
            value: entry.value.clone(),
            ttl: entry.ttl_remaining(now),
        }),
        None => SharedScan::Miss,
    }
}

/// Returns the first live match and how many expired matches were removed on the way.
fn scan_exclusive(
    store: &mut Store,
    key: &[u8],
    now: Instant,
) -> (Option<CachedValue>, u64) {
    let mut removed = 0;
    let mut cursor = store.matches(key);

    while let Some(id) = cursor.next_in(store) {
        let Some(entry) = store.get(id) else {
            break;
        };
        if !entry.is_expired(now) {
            let hit = CachedValue {
                value: entry.value.clone(),
                ttl: entry.ttl_remaining(now),
            };
            return (Some(hit), removed);
        }
        store.remove(id);
        removed += 1;
    }

    (None, removed)
}

/// Removes the expired entry closest to the tail, if any. At most one.
fn evict_oldest_expired(store: &mut Store, now: Instant) -> bool {
    let victim = store
        .iter_rev()
        .find(|(_, entry)| entry.is_expired(now))
        .map(|(id, _)| id);

    match victim {
        Some(id) => store.remove(id).is_some(),
        None => false,
    }
}

fn purge_from_head(store: &mut Store, now: Instant) -> usize {
    let mut removed = 0;
    while let Some(id) = store.head() {
        match store.get(id) {
            Some(entry) if entry.is_expired(now) => {
                store.remove(id);
                removed += 1;
            }
            _ => break,
        }
    }
    removed
}

// == TTL Cache ==
/// Embedded key-value cache with per-entry TTL and a background sweeper.
///
/// Set and Get are synchronous and may be called from any thread. The
/// sweeper runs as a Tokio task and must be shut down with [`stop`](Self::stop).
///
/// # Example
/// ```no_run
/// # async fn example() -> mini_ttl_cache::Result<()> {
/// use std::time::Duration;
/// use mini_ttl_cache::TtlCache;
///
/// let cache = TtlCache::new();
/// cache.set("DJ", "Dante J", Duration::from_secs(5));
///
/// if let Some(hit) = cache.get("DJ") {
///     println!("{:?} expires in {:?}", hit.value, hit.ttl);
/// }
///
/// cache.stop().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TtlCache {
    shared: Arc<Shared>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl TtlCache {
    // == Constructor ==
    /// Creates an engine with the default configuration and starts its sweeper.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime, like `tokio::spawn`.
    /// Use [`with_config`](Self::with_config) for a fallible variant.
    pub fn new() -> Self {
        Self::start(Config::default(), &Handle::current())
    }

    /// Creates an engine from `config` and starts its sweeper on the current runtime.
    ///
    /// # Errors
    /// - `InvalidConfig` if the configuration fails validation
    /// - `NoRuntime` if no Tokio runtime is running
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;
        Ok(Self::start(config, &runtime))
    }

    fn start(config: Config, runtime: &Handle) -> Self {
        let shared = Arc::new(Shared::new(config.capacity));
        let sweeper = Sweeper::spawn(Arc::clone(&shared), config.sweep_interval(), runtime);

        Self {
            shared,
            sweeper: Mutex::new(Some(sweeper)),
        }
    }

    // == Set ==
    /// Inserts a new entry as the most recent one, expiring after `ttl`.
    ///
    /// Older entries with the same key are left in place. If the store then
    /// holds more than `capacity` entries, the oldest expired entry (if any)
    /// is evicted.
    pub fn set(&self, key: impl Into<Bytes>, value: impl Into<Bytes>, ttl: Duration) {
        self.shared.set(key.into(), value.into(), ttl);
    }

    // == Get ==
    /// Returns the most recently inserted live entry for `key`.
    ///
    /// Expired entries with this key found before the live one are removed.
    /// `None` is the normal miss outcome.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<CachedValue> {
        self.shared.get(key.as_ref())
    }

    // == Stop ==
    /// Signals the sweeper to exit and waits for it to finish.
    ///
    /// Set and Get keep working afterwards; only background reclamation stops.
    ///
    /// # Errors
    /// - `AlreadyStopped` on a second call
    /// - `Sweeper` if the sweeper task panicked
    pub async fn stop(&self) -> Result<()> {
        let sweeper = self.sweeper.lock().take().ok_or(CacheError::AlreadyStopped)?;
        sweeper.shutdown().await
    }

    /// Returns true once [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.sweeper.lock().is_none()
    }

    /// Runs one purge pass now, the same one the sweeper runs on each tick.
    pub fn purge_expired(&self) -> usize {
        self.shared.purge_expired()
    }

    /// Number of linked entries, expired or not. Walks the whole store.
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Returns true if no entries are linked.
    pub fn is_empty(&self) -> bool {
        self.shared.store.read().is_empty()
    }

    /// Soft bound above which a Set attempts one eviction.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.shared.stats.snapshot(self.len())
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TtlCache {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.get_mut().take() {
            warn!("TtlCache dropped without stop(); cancelling sweeper");
            sweeper.cancel();
        }
    }
}
