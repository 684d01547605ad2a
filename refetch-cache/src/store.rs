//! TTL cache store for successful read responses.
//!
//! Freshness is `now - stored_at < ttl`. Expired entries are not removed by
//! reads; they stay visible to [`CacheStore::get_stale`] and to `size()`
//! until the periodic sweep drops everything older than the TTL.
//!
//! Every invalidation (`invalidate_prefix`, `clear`) advances an epoch.
//! A read captures the epoch before going to the network and stores its
//! response with [`CacheStore::set_if_unchanged`], so a response fetched
//! before an invalidation never lands in the cache after it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use refetch_core::{CacheSettings, RequestFingerprint};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::observer::{CacheObserver, CacheStats, FnObserver, LookupEvent, ObserverId};

/// Configuration for the cache store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Lifetime of an entry.
    pub ttl: Duration,
    /// Interval between sweeps of expired entries.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            ttl: settings.ttl(),
            sweep_interval: settings.sweep_interval(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Arc<Value>,
    stored_at: Instant,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// In-memory response cache keyed by request fingerprint.
pub struct CacheStore {
    config: CacheConfig,
    entries: RwLock<HashMap<RequestFingerprint, CacheEntry>>,
    observers: RwLock<Vec<(ObserverId, Arc<dyn CacheObserver>)>>,
    next_observer_id: AtomicU64,
    counters: Counters,
    epoch: AtomicU64,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

/// Shortest sweep period `create` will schedule.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

impl CacheStore {
    /// Create a store without a background sweeper.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
            observers: RwLock::new(Vec::new()),
            next_observer_id: AtomicU64::new(0),
            counters: Counters::default(),
            epoch: AtomicU64::new(0),
            sweeper: Mutex::new(None),
        }
    }

    /// Create a shared store and start its periodic sweep.
    ///
    /// Must be called inside a tokio runtime. The sweep task only holds a
    /// weak reference: it stops on [`CacheStore::shutdown`] or once the last
    /// `Arc` is dropped. The sweep period is at least [`MIN_SWEEP_INTERVAL`].
    pub fn create(config: CacheConfig) -> Arc<Self> {
        let interval = config.sweep_interval.max(MIN_SWEEP_INTERVAL);
        let store = Arc::new(Self::new(config));
        let weak = Arc::downgrade(&store);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            loop {
                ticker.tick().await;
                let Some(store) = weak.upgrade() else {
                    break;
                };
                store.sweep();
            }
        });

        *store.sweeper.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        tracing::debug!(
            ttl_ms = store.config.ttl.as_millis() as u64,
            sweep_interval_ms = interval.as_millis() as u64,
            "Cache store created"
        );
        store
    }

    /// Stop the periodic sweep. Entries stay readable.
    pub fn shutdown(&self) {
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::debug!("Cache sweeper stopped");
        }
    }

    /// Returns true while a sweep task is attached.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Fresh value for `key`, or `None` if absent or older than the TTL.
    ///
    /// Does not touch statistics or observers, and never deletes.
    pub fn get(&self, key: &RequestFingerprint) -> Option<Arc<Value>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() < self.config.ttl {
            Some(Arc::clone(&entry.value))
        } else {
            None
        }
    }

    /// Counted read: like [`CacheStore::get`] but records a hit or miss and
    /// notifies observers.
    pub fn lookup(&self, key: &RequestFingerprint) -> Option<Arc<Value>> {
        let value = self.get(key);
        match value {
            Some(_) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "Cache hit");
                self.notify(|observer| observer.on_hit(key));
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "Cache miss");
                self.notify(|observer| observer.on_miss(key));
            }
        }
        value
    }

    /// Value for `key` regardless of age, with how old it is.
    pub fn get_stale(&self, key: &RequestFingerprint) -> Option<(Arc<Value>, Duration)> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .map(|entry| (Arc::clone(&entry.value), entry.stored_at.elapsed()))
    }

    /// Store `value` under `key`, resetting its age.
    pub fn set(&self, key: RequestFingerprint, value: Arc<Value>) {
        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
    }

    /// Current invalidation epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Store `value` only if no invalidation happened since `epoch` was
    /// read. Returns true if the value was stored.
    pub fn set_if_unchanged(&self, key: RequestFingerprint, value: Arc<Value>, epoch: u64) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if self.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!(key = %key, "Skipping cache fill from before an invalidation");
            return false;
        }
        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
        true
    }

    /// Remove one entry. Returns true if it existed.
    pub fn delete(&self, key: &RequestFingerprint) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    /// Remove every entry, for every principal, whose path starts with
    /// `prefix`. Returns the number removed.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let before = entries.len();
        entries.retain(|key, _| !key.path_starts_with(prefix));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(prefix, removed, "Invalidated cache entries");
        }
        removed
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        self.epoch.fetch_add(1, Ordering::SeqCst);
        entries.clear();
    }

    /// Number of entries, expired ones included until the next sweep.
    pub fn size(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn keys(&self) -> Vec<RequestFingerprint> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Drop every entry older than the TTL. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let ttl = self.config.ttl;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.stored_at.elapsed() <= ttl);
        let removed = before - entries.len();
        drop(entries);

        if removed > 0 {
            self.counters
                .evictions
                .fetch_add(removed as u64, Ordering::Relaxed);
            tracing::debug!(removed, "Swept expired cache entries");
        }
        removed
    }

    /// Register a callback for cache hits.
    pub fn on_hit<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&RequestFingerprint) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnObserver::new(LookupEvent::Hit, callback)))
    }

    /// Register a callback for cache misses.
    pub fn on_miss<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&RequestFingerprint) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnObserver::new(LookupEvent::Miss, callback)))
    }

    pub fn subscribe(&self, observer: Arc<dyn CacheObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer_id.fetch_add(1, Ordering::Relaxed));
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, observer));
        id
    }

    /// Remove an observer. Returns true if it was registered.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            entry_count: self.size() as u64,
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }

    /// Zero the hit, miss and eviction counters.
    pub fn reset_stats(&self) {
        self.counters.hits.store(0, Ordering::Relaxed);
        self.counters.misses.store(0, Ordering::Relaxed);
        self.counters.evictions.store(0, Ordering::Relaxed);
    }

    fn notify(&self, event: impl Fn(&dyn CacheObserver)) {
        // Snapshot so callbacks may (un)subscribe without deadlocking.
        let observers: Vec<Arc<dyn CacheObserver>> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            event(observer.as_ref());
        }
    }
}

impl Drop for CacheStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("config", &self.config)
            .field("size", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn key(path: &str, token: Option<&str>) -> RequestFingerprint {
        RequestFingerprint::new(path, token)
    }

    fn store_with_ttl(ttl_ms: u64) -> CacheStore {
        CacheStore::new(CacheConfig::new().with_ttl(Duration::from_millis(ttl_ms)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_then_expired() {
        let store = store_with_ttl(5000);
        let k = key("/articles", Some("tokA"));
        store.set(k.clone(), Arc::new(json!({ "items": [] })));

        tokio::time::advance(Duration::from_millis(4999)).await;
        assert!(store.get(&k).is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(store.get(&k).is_none(), "entry at exactly TTL is not fresh");
        assert_eq!(store.size(), 1, "expired entry still counted until sweep");

        let (stale, age) = store.get_stale(&k).unwrap();
        assert_eq!(*stale, json!({ "items": [] }));
        assert_eq!(age, Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_resets_age() {
        let store = store_with_ttl(1000);
        let k = key("/notes", None);
        store.set(k.clone(), Arc::new(json!(1)));
        tokio::time::advance(Duration::from_millis(900)).await;
        store.set(k.clone(), Arc::new(json!(2)));
        tokio::time::advance(Duration::from_millis(900)).await;

        assert_eq!(*store.get(&k).unwrap(), json!(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_expired() {
        let store = store_with_ttl(1000);
        store.set(key("/old", None), Arc::new(json!("old")));
        tokio::time::advance(Duration::from_millis(1500)).await;
        store.set(key("/new", None), Arc::new(json!("new")));

        assert_eq!(store.sweep(), 1);
        assert_eq!(store.keys(), vec![key("/new", None)]);
        assert_eq!(store.stats().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_sweep_and_shutdown() {
        let store = CacheStore::create(
            CacheConfig::new()
                .with_ttl(Duration::from_millis(1000))
                .with_sweep_interval(Duration::from_millis(500)),
        );
        assert!(store.is_sweeping());
        store.set(key("/digests/2024-05-01", Some("t")), Arc::new(json!({})));

        // First sweep at 500ms keeps it, the one at 1500ms drops it.
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.size(), 1);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(store.size(), 0);

        store.shutdown();
        assert!(!store.is_sweeping());

        store.set(key("/calendar", None), Arc::new(json!([])));
        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(store.size(), 1, "no sweeping after shutdown");
    }

    #[test]
    fn test_principals_do_not_share_entries() {
        let store = CacheStore::new(CacheConfig::default());
        store.set(key("/auth/me", Some("alice")), Arc::new(json!({ "user": "alice" })));

        assert!(store.get(&key("/auth/me", Some("alice"))).is_some());
        assert!(store.get(&key("/auth/me", Some("bob"))).is_none());
        assert!(store.get(&key("/auth/me", None)).is_none());
    }

    #[test]
    fn test_delete_clear_keys() {
        let store = CacheStore::new(CacheConfig::default());
        store.set(key("/a", None), Arc::new(json!(1)));
        store.set(key("/b", None), Arc::new(json!(2)));

        assert!(store.delete(&key("/a", None)));
        assert!(!store.delete(&key("/a", None)));
        assert_eq!(store.keys(), vec![key("/b", None)]);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_invalidate_prefix_across_principals() {
        let store = CacheStore::new(CacheConfig::default());
        store.set(key("/journals?page=1", Some("a")), Arc::new(json!(1)));
        store.set(key("/journals/public?page=1", None), Arc::new(json!(2)));
        store.set(key("/notes?date=", Some("a")), Arc::new(json!(3)));

        assert_eq!(store.invalidate_prefix("/journals"), 2);
        assert_eq!(store.keys(), vec![key("/notes?date=", Some("a"))]);
    }

    #[test]
    fn test_fill_after_invalidation_is_skipped() {
        let store = CacheStore::new(CacheConfig::default());
        let k = key("/journals?page=1", Some("a"));

        let before = store.epoch();
        store.invalidate_prefix("/journals");
        assert!(!store.set_if_unchanged(k.clone(), Arc::new(json!("old")), before));
        assert!(store.get(&k).is_none());

        assert!(store.set_if_unchanged(k.clone(), Arc::new(json!("new")), store.epoch()));
        assert_eq!(*store.get(&k).unwrap(), json!("new"));

        let before = store.epoch();
        store.clear();
        assert!(!store.set_if_unchanged(k, Arc::new(json!("old")), before));
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_sweep_interval_is_clamped() {
        let store = CacheStore::create(
            CacheConfig::new()
                .with_ttl(Duration::from_millis(100))
                .with_sweep_interval(Duration::ZERO),
        );
        assert!(store.is_sweeping());
        store.set(key("/notes", None), Arc::new(json!([])));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(store.size(), 0);
        store.shutdown();
    }

    #[test]
    fn test_lookup_counts_and_notifies() {
        let store = CacheStore::new(CacheConfig::default());
        let hits = Arc::new(AtomicUsize::new(0));
        let misses = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        store.on_hit(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        let m = Arc::clone(&misses);
        let miss_id = store.on_miss(move |_| {
            m.fetch_add(1, Ordering::SeqCst);
        });

        let k = key("/articles", None);
        assert!(store.lookup(&k).is_none());
        store.set(k.clone(), Arc::new(json!([])));
        assert!(store.lookup(&k).is_some());
        assert!(store.lookup(&k).is_some());

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(misses.load(Ordering::SeqCst), 1);

        let stats = store.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);

        assert!(store.unsubscribe(miss_id));
        store.lookup(&key("/other", None));
        assert_eq!(misses.load(Ordering::SeqCst), 1);
        assert_eq!(store.stats().misses, 2);

        store.reset_stats();
        assert_eq!(store.stats().lookups(), 0);
    }

    #[test]
    fn test_plain_get_is_silent() {
        let store = CacheStore::new(CacheConfig::default());
        store.get(&key("/x", None));
        assert_eq!(store.stats(), CacheStats::default());
    }
}
