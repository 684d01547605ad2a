//! Cache hit/miss observers and usage statistics.

use refetch_core::RequestFingerprint;

/// Receives a callback for every counted cache lookup.
///
/// Both methods default to no-ops so an observer can care about only one
/// of them. Callbacks run synchronously on the caller's task and must not
/// block.
pub trait CacheObserver: Send + Sync {
    /// A lookup found a fresh entry.
    fn on_hit(&self, _key: &RequestFingerprint) {}

    /// A lookup found nothing fresh; a network call follows.
    fn on_miss(&self, _key: &RequestFingerprint) {}
}

/// Handle returned on registration, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

/// Which lookup outcome a closure observer listens to.
pub(crate) enum LookupEvent {
    Hit,
    Miss,
}

/// Adapts a closure into a [`CacheObserver`] for one event kind.
pub(crate) struct FnObserver<F> {
    event: LookupEvent,
    callback: F,
}

impl<F> FnObserver<F> {
    pub(crate) fn new(event: LookupEvent, callback: F) -> Self {
        Self { event, callback }
    }
}

impl<F> CacheObserver for FnObserver<F>
where
    F: Fn(&RequestFingerprint) + Send + Sync,
{
    fn on_hit(&self, key: &RequestFingerprint) {
        if matches!(self.event, LookupEvent::Hit) {
            (self.callback)(key);
        }
    }

    fn on_miss(&self, key: &RequestFingerprint) {
        if matches!(self.event, LookupEvent::Miss) {
            (self.callback)(key);
        }
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently in cache, stale ones included.
    pub entry_count: u64,
    /// Number of entries removed by sweeps.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Counted lookups (hits + misses).
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}
