//! Generation-based cancellation tokens.
//!
//! Every operation a binding starts carries a token stamped with the
//! binding's generation at issue time. Issuing a newer token, superseding,
//! or detaching the binding makes every older token report cancelled.
//! Tokens are only consulted where results are applied.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use refetch_core::ClientError;

#[derive(Debug, Default)]
struct SourceState {
    generation: AtomicU64,
    detached: AtomicBool,
}

/// Issues tokens for one binding.
#[derive(Debug, Clone, Default)]
pub struct TokenSource {
    state: Arc<SourceState>,
}

impl TokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation and return its token. Older tokens become
    /// superseded.
    pub fn issue(&self) -> CancellationToken {
        let generation = self.state.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.token_for(generation)
    }

    /// Token for the current generation, without superseding anything.
    pub fn current(&self) -> CancellationToken {
        self.token_for(self.generation())
    }

    /// Invalidate every outstanding token.
    pub fn supersede(&self) {
        self.state.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Invalidate every token, present and future.
    pub fn detach(&self) {
        self.state.detached.store(true, Ordering::SeqCst);
    }

    pub fn is_detached(&self) -> bool {
        self.state.detached.load(Ordering::SeqCst)
    }

    pub fn generation(&self) -> u64 {
        self.state.generation.load(Ordering::SeqCst)
    }

    fn token_for(&self, generation: u64) -> CancellationToken {
        CancellationToken {
            generation,
            source: Arc::clone(&self.state),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Cancellation state of one operation. Clones share the explicit
/// `cancel` flag.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    generation: u64,
    source: Arc<SourceState>,
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cancel this operation only.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// A newer generation exists or the binding is detached.
    pub fn is_superseded(&self) -> bool {
        self.source.detached.load(Ordering::SeqCst)
            || self.source.generation.load(Ordering::SeqCst) != self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst) || self.is_superseded()
    }

    /// `Err(ClientError::Cancelled)` once the token is cancelled.
    pub fn check(&self) -> Result<(), ClientError> {
        if self.is_cancelled() {
            Err(ClientError::Cancelled)
        } else {
            Ok(())
        }
    }
}
