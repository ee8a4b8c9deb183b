//! Wall-clock sources for the readiness gate.
//!
//! The runner never calls the system clock directly; it asks a [`Clock`]
//! so the gate can be driven deterministically in tests.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Source of the current time as unix seconds.
pub trait Clock {
    fn now(&self) -> i64;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Manually driven clock.
///
/// Clones share the same instant, so a test can keep one handle and
/// advance time while the runner holds another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    /// Create a clock frozen at `now`.
    pub fn new(now: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now)),
        }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move forward by `seconds`.
    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(100);
        let handle = clock.clone();

        handle.advance(60);
        assert_eq!(clock.now(), 160);

        handle.set(5);
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn test_system_clock_is_past_epoch() {
        // Any real clock is well past the five minute default cooldown.
        assert!(SystemClock.now() > 300);
    }
}
