//! Physical time source
//!
//! The registry only needs wall-clock seconds, and only when a self-claim
//! freshness window is configured. Tests inject a controllable clock.

use crate::identifiers::UnixSeconds;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock time in whole seconds since the Unix epoch
pub trait PhysicalClock: Send + Sync {
    /// Current time
    fn now_secs(&self) -> UnixSeconds;
}

/// Clock backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl PhysicalClock for SystemClock {
    fn now_secs(&self) -> UnixSeconds {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
