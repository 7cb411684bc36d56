//! Time sources for document timestamps.

use crate::ports::outbound::TimeSource;
use std::time::{SystemTime, UNIX_EPOCH};

// ============================================================================
// SystemTimeSource
// ============================================================================

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl SystemTimeSource {
    /// Create a new system time source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> u64 {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
    }
}

// ============================================================================
// FixedTimeSource
// ============================================================================

/// Always returns the same instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedTimeSource(pub u64);

impl TimeSource for FixedTimeSource {
    fn now_millis(&self) -> u64 {
        self.0
    }
}
