//! Millisecond conversions shared by playback positions and lyric offsets.
//!
//! Conversions saturate instead of truncating; the limits are far beyond any
//! track length.

use std::time::Duration;

/// Extension trait for saturating `Duration` conversions.
pub trait DurationExt {
    /// Milliseconds as `u64`, saturating at `u64::MAX`.
    fn as_millis_u64(&self) -> u64;

    /// Whole seconds rounded half-up to the nearest second, saturating at `u32::MAX`.
    fn as_rounded_secs_u32(&self) -> u32;
}

impl DurationExt for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }

    fn as_rounded_secs_u32(&self) -> u32 {
        let rounded = self.as_millis_u64().saturating_add(500) / 1000;
        u32::try_from(rounded).unwrap_or(u32::MAX)
    }
}

/// Convert a millisecond count to whole seconds, rounded half-up.
#[must_use]
pub fn millis_to_rounded_secs(millis: u64) -> u32 {
    Duration::from_millis(millis).as_rounded_secs_u32()
}
