//! Runtime and compile-time level filtering

use super::log_level::LogLevel;
use std::sync::atomic::{AtomicU8, Ordering};

/// Highest level compiled into the binary.
///
/// Selected with the `max_level_*` cargo features. The logging macros compare
/// against this constant, so calls above it are removed by the optimizer.
pub const STATIC_MAX_LEVEL: LogLevel = if cfg!(feature = "max_level_off") {
    LogLevel::Off
} else if cfg!(feature = "max_level_error") {
    LogLevel::Error
} else if cfg!(feature = "max_level_warn") {
    LogLevel::Warn
} else if cfg!(feature = "max_level_info") {
    LogLevel::Info
} else {
    LogLevel::Debug
};

/// Runtime severity threshold, readable without a lock
#[derive(Debug)]
pub struct LevelGate {
    threshold: AtomicU8,
}

impl LevelGate {
    pub const fn new(level: LogLevel) -> Self {
        Self {
            threshold: AtomicU8::new(level as u8),
        }
    }

    /// True iff `level` is at or below the current threshold
    #[inline]
    pub fn admit(&self, level: LogLevel) -> bool {
        level.as_u8() <= self.threshold.load(Ordering::Acquire)
    }

    #[inline]
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.threshold.load(Ordering::Acquire)).unwrap_or(LogLevel::Off)
    }

    #[inline]
    pub fn set_level(&self, level: LogLevel) {
        self.threshold.store(level.as_u8(), Ordering::Release);
    }

    /// Set the threshold from a raw value; out-of-range values are ignored.
    ///
    /// Returns whether the threshold was changed.
    pub fn set_raw(&self, raw: u8) -> bool {
        match LogLevel::from_u8(raw) {
            Some(level) => {
                self.set_level(level);
                true
            }
            None => false,
        }
    }
}

impl Default for LevelGate {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}
