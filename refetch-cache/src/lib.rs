//! Response cache with explicit freshness and in-flight deduplication.
//!
//! Two process-wide pieces of state live here, both constructed explicitly
//! and shared through `Arc` rather than held in globals:
//!
//! - [`CacheStore`]: maps a [`RequestFingerprint`] to the last successful
//!   response and when it was stored. Reads inside the TTL are fresh; older
//!   entries are invisible to [`CacheStore::get`] until a sweep removes them.
//! - [`PendingRequestRegistry`]: at most one in-flight read per fingerprint.
//!   Late callers join the running operation instead of starting another.
//!
//! # Example
//!
//! ```ignore
//! let store = CacheStore::create(CacheConfig::default());
//! store.on_hit(|key| tracing::debug!(%key, "served from cache"));
//!
//! let registry = Arc::new(PendingRequestRegistry::new());
//! let handle = registry.begin_or_join(key, || fetch_from_network().boxed());
//! let value = handle.await?;
//! ```
//!
//! [`RequestFingerprint`]: refetch_core::RequestFingerprint

pub mod observer;
pub mod pending;
pub mod store;

pub use observer::{CacheObserver, CacheStats, ObserverId};
pub use pending::{PendingHandle, PendingRequestRegistry, SharedRequest, SharedResult};
pub use store::{CacheConfig, CacheStore, MIN_SWEEP_INTERVAL};
