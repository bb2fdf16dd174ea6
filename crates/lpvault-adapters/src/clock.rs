//! Shared simulated clock.
//!
//! Clones share the same underlying counter, so a test (or the daemon's
//! ticker) can advance time seen by a yield source it no longer owns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A manually advanced clock, in seconds.
#[derive(Clone, Debug, Default)]
pub struct SimClock {
    now: Arc<AtomicU64>,
}

impl SimClock {
    /// Create a clock starting at `start` seconds.
    pub fn new(start: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Current time in seconds.
    pub fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    /// Move the clock forward by `secs`. Returns the new time.
    pub fn advance(&self, secs: u64) -> u64 {
        let previous = self.now.fetch_add(secs, Ordering::SeqCst);
        let now = previous.saturating_add(secs);
        tracing::trace!(secs, now, "clock: advanced");
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance() {
        let clock = SimClock::new(1_000);
        assert_eq!(clock.now(), 1_000);
        assert_eq!(clock.advance(60), 1_060);
        assert_eq!(clock.now(), 1_060);
    }

    #[test]
    fn test_clones_share_time() {
        let clock = SimClock::new(0);
        let handle = clock.clone();
        handle.advance(3_600);
        assert_eq!(clock.now(), 3_600);
    }
}
