//! Background refresh scheduling.
//!
//! One driver task serves every registered binding. It sleeps until the
//! earliest binding is due (or until the registration set changes), ticks
//! the due bindings, and reschedules them one interval later. Bindings are
//! held weakly; a dropped binding is pruned on the next pass.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Something the scheduler can revalidate.
pub trait BackgroundRefresh: Send + Sync {
    /// Start a background revalidation if one is warranted. Returns true
    /// if an operation was started.
    fn background_tick(self: Arc<Self>) -> bool;
}

/// Handle identifying one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

struct Registration {
    target: Weak<dyn BackgroundRefresh>,
    interval: Duration,
    next_due: Instant,
}

struct SchedulerInner {
    entries: Mutex<HashMap<RegistrationId, Registration>>,
    next_id: AtomicU64,
    wake: Arc<Notify>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for SchedulerInner {
    fn drop(&mut self) {
        let driver = self.driver.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = driver.take() {
            handle.abort();
        }
    }
}

/// Shared background-refresh scheduler. Clones drive the same registry.
#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Arc<SchedulerInner>,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshScheduler {
    /// Create a scheduler. The driver task starts on the first
    /// registration, which must happen inside a tokio runtime.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                entries: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                wake: Arc::new(Notify::new()),
                driver: Mutex::new(None),
            }),
        }
    }

    /// Tick `target` every `interval`, starting one interval from now.
    pub fn register(&self, target: Weak<dyn BackgroundRefresh>, interval: Duration) -> RegistrationId {
        let id = RegistrationId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let registration = Registration {
            target,
            interval,
            next_due: Instant::now() + interval,
        };
        let count = {
            let mut entries = self.entries();
            entries.insert(id, registration);
            entries.len()
        };
        tracing::debug!(
            registration = id.0,
            interval_ms = interval.as_millis() as u64,
            registered = count,
            "Background refresh registered"
        );

        self.ensure_driver();
        self.inner.wake.notify_one();
        id
    }

    /// Stop ticking a registration. Returns false if it was not registered.
    pub fn deregister(&self, id: RegistrationId) -> bool {
        let removed = self.entries().remove(&id).is_some();
        if removed {
            tracing::debug!(registration = id.0, "Background refresh deregistered");
            self.inner.wake.notify_one();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the driver task. Registrations are kept; the next `register`
    /// restarts it.
    pub fn shutdown(&self) {
        let handle = self
            .inner
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::debug!("Refresh scheduler stopped");
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<RegistrationId, Registration>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_driver(&self) {
        let mut driver = self
            .inner
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if driver.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        let wake = Arc::clone(&self.inner.wake);
        *driver = Some(tokio::spawn(drive(weak, wake)));
    }
}

impl std::fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("registered", &self.len())
            .field("running", &self.is_running())
            .finish()
    }
}

async fn drive(inner: Weak<SchedulerInner>, wake: Arc<Notify>) {
    loop {
        let next_due = {
            let Some(inner) = inner.upgrade() else {
                break;
            };
            let mut entries = inner.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.retain(|_, registration| registration.target.strong_count() > 0);
            let earliest = entries.values().map(|registration| registration.next_due).min();
            earliest
        };

        match next_due {
            None => wake.notified().await,
            Some(due) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(due) => {}
                    _ = wake.notified() => continue,
                }
            }
        }

        let due_targets = {
            let Some(inner) = inner.upgrade() else {
                break;
            };
            let now = Instant::now();
            let mut entries = inner.entries.lock().unwrap_or_else(PoisonError::into_inner);
            let due: Vec<Arc<dyn BackgroundRefresh>> = entries
                .values_mut()
                .filter(|registration| registration.next_due <= now)
                .filter_map(|registration| {
                    registration.next_due = now + registration.interval;
                    registration.target.upgrade()
                })
                .collect();
            due
        };

        for target in due_targets {
            let started = target.background_tick();
            tracing::trace!(started, "Background tick");
        }
    }
}
