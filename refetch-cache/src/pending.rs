//! In-flight read deduplication.
//!
//! The first caller for a fingerprint starts the operation; everyone who
//! arrives before it settles gets a clone of the same shared future and
//! therefore the same `Arc` (or the same error). The operation is spawned,
//! so it always runs to settlement even if every caller goes away, and the
//! registry slot is released when it does.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use refetch_core::{ClientError, RequestFingerprint, TransportErrorKind};
use serde_json::Value;

/// Outcome every joiner of a deduplicated read observes.
pub type SharedResult = Result<Arc<Value>, ClientError>;

/// Cloneable handle to one in-flight read.
pub type SharedRequest = Shared<BoxFuture<'static, SharedResult>>;

/// Handle returned by [`PendingRequestRegistry::begin_or_join`].
#[derive(Clone)]
pub struct PendingHandle {
    request: SharedRequest,
    joined: bool,
}

impl PendingHandle {
    /// True if this caller joined an operation someone else started.
    pub fn joined(&self) -> bool {
        self.joined
    }

    pub fn into_shared(self) -> SharedRequest {
        self.request
    }
}

impl Future for PendingHandle {
    type Output = SharedResult;

    fn poll(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        self.request.poll_unpin(cx)
    }
}

struct PendingEntry {
    seq: u64,
    request: SharedRequest,
}

#[derive(Default)]
struct RegistryInner {
    entries: HashMap<RequestFingerprint, PendingEntry>,
    next_seq: u64,
}

/// Tracks at most one in-flight read per fingerprint.
#[derive(Default)]
pub struct PendingRequestRegistry {
    inner: Mutex<RegistryInner>,
}

impl PendingRequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the in-flight read for `key`, or start one with `producer`.
    ///
    /// `producer` is invoked only when no read is pending for `key`. Its
    /// future is spawned on the current tokio runtime; the slot is removed
    /// when it settles, after the future itself has finished (so anything
    /// it caches is visible before the slot disappears).
    pub fn begin_or_join<F, Fut>(self: &Arc<Self>, key: RequestFingerprint, producer: F) -> PendingHandle
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SharedResult> + Send + 'static,
    {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = inner.entries.get(&key) {
            tracing::debug!(key = %key, "Joining in-flight request");
            return PendingHandle {
                request: entry.request.clone(),
                joined: true,
            };
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;

        let guard = SettleGuard {
            registry: Arc::downgrade(self),
            key: key.clone(),
            seq,
        };
        let operation = producer();
        let task = tokio::spawn(async move {
            let _guard = guard;
            operation.await
        });

        let request = async move {
            match task.await {
                Ok(result) => result,
                Err(join_err) => {
                    let reason = if join_err.is_panic() { "panicked" } else { "was aborted" };
                    Err(ClientError::transport(
                        TransportErrorKind::Other,
                        format!("request task {}", reason),
                    ))
                }
            }
        }
        .boxed()
        .shared();

        tracing::debug!(key = %key, "Starting in-flight request");
        inner.entries.insert(
            key,
            PendingEntry {
                seq,
                request: request.clone(),
            },
        );

        PendingHandle {
            request,
            joined: false,
        }
    }

    /// Number of reads currently in flight.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &RequestFingerprint) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .contains_key(key)
    }

    /// Detach every in-flight read whose path starts with `prefix`. The
    /// operations keep running for their current callers, but later
    /// callers start fresh ones. Returns the number detached.
    pub fn forget_prefix(&self, prefix: &str) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = inner.entries.len();
        inner.entries.retain(|key, _| !key.path_starts_with(prefix));
        let removed = before - inner.entries.len();
        if removed > 0 {
            tracing::debug!(prefix, removed, "Detached in-flight reads");
        }
        removed
    }

    fn settle(&self, key: &RequestFingerprint, seq: u64) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        // Only remove the slot this operation registered.
        if inner.entries.get(key).is_some_and(|entry| entry.seq == seq) {
            inner.entries.remove(key);
            tracing::trace!(key = %key, "In-flight request settled");
        }
    }
}

impl std::fmt::Debug for PendingRequestRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequestRegistry")
            .field("in_flight", &self.len())
            .finish()
    }
}

/// Releases a registry slot when the spawned operation ends, however it
/// ends (completion, panic or abort).
struct SettleGuard {
    registry: Weak<PendingRequestRegistry>,
    key: RequestFingerprint,
    seq: u64,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.settle(&self.key, self.seq);
        }
    }
}
