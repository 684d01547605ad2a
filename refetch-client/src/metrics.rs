//! Request metrics: round-trip samples and a combined snapshot with cache stats.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use refetch_cache::CacheStats;
use serde::Serialize;

/// Number of round-trip samples kept for the rolling average.
pub const RESPONSE_SAMPLE_CAPACITY: usize = 100;

/// Rolling window of network round-trip durations.
#[derive(Debug)]
pub struct ResponseTimes {
    samples: Mutex<VecDeque<Duration>>,
    capacity: usize,
}

impl Default for ResponseTimes {
    fn default() -> Self {
        Self::with_capacity(RESPONSE_SAMPLE_CAPACITY)
    }
}

impl ResponseTimes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Record one sample, dropping the oldest once the window is full.
    pub fn record(&self, elapsed: Duration) {
        let mut samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(elapsed);
    }

    /// Mean of the current window; zero when empty.
    pub fn average(&self) -> Duration {
        let samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        if samples.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = samples.iter().sum();
        total / samples.len() as u32
    }

    pub fn len(&self) -> usize {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Point-in-time view of client performance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientMetrics {
    pub cache_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    /// Average network round-trip in milliseconds.
    pub avg_response_time_ms: f64,
    pub total_requests: u64,
}

impl ClientMetrics {
    pub fn from_parts(stats: &CacheStats, cache_size: usize, average: Duration) -> Self {
        Self {
            cache_size,
            hits: stats.hits,
            misses: stats.misses,
            hit_rate: stats.hit_rate(),
            avg_response_time_ms: average.as_secs_f64() * 1000.0,
            total_requests: stats.lookups(),
        }
    }
}
