//! Per-binding fetch state and the snapshots consumers read.

use std::time::Duration;

use chrono::Utc;
use refetch_core::{ClientError, Timestamp};
use tokio::time::Instant;

/// When a binding last applied a successful result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchStamp {
    /// Monotonic instant, used for staleness.
    pub instant: Instant,
    /// Wall-clock time, for display.
    pub at: Timestamp,
}

impl FetchStamp {
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
            at: Utc::now(),
        }
    }
}

/// Mutable state of one binding.
#[derive(Debug, Clone)]
pub struct FetchState<T> {
    pub data: Option<T>,
    /// True only while a foreground operation is outstanding.
    pub loading: bool,
    pub error: Option<ClientError>,
    pub last_fetched: Option<FetchStamp>,
    /// A background revalidation is in flight.
    pub revalidating: bool,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            last_fetched: None,
            revalidating: false,
        }
    }
}

impl<T: Clone> FetchState<T> {
    /// Never fetched, or the last success is older than `stale_time`.
    pub fn is_stale(&self, stale_time: Duration) -> bool {
        match self.last_fetched {
            None => true,
            Some(stamp) => stamp.instant.elapsed() > stale_time,
        }
    }

    /// Record a successful result.
    pub fn apply_success(&mut self, data: T) {
        self.data = Some(data);
        self.error = None;
        self.last_fetched = Some(FetchStamp::now());
    }

    /// Record a foreground failure.
    pub fn apply_failure(&mut self, error: ClientError, keep_data: bool) {
        self.error = Some(error);
        if !keep_data {
            self.data = None;
        }
    }

    pub fn snapshot(&self, stale_time: Duration) -> FetchSnapshot<T> {
        FetchSnapshot {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
            last_fetched: self.last_fetched.map(|stamp| stamp.at),
            is_stale: self.is_stale(stale_time),
        }
    }
}

/// Read-only view of a binding at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSnapshot<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<ClientError>,
    pub last_fetched: Option<Timestamp>,
    pub is_stale: bool,
}

impl<T> FetchSnapshot<T> {
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
