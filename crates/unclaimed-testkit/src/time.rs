//! Time control for deterministic tests

use std::sync::atomic::{AtomicU64, Ordering};
use unclaimed_core::{PhysicalClock, UnixSeconds};

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Freeze the clock at `now`
    pub fn new(now: UnixSeconds) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Jump to `now`
    pub fn set(&self, now: UnixSeconds) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move forward by `secs`
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl PhysicalClock for ManualClock {
    fn now_secs(&self) -> UnixSeconds {
        self.now.load(Ordering::SeqCst)
    }
}
