//! Locating the active lyric line for a playback position.

use crate::lrc::{TimedLine, Timeline};
use crate::time::DurationExt;
use std::time::Duration;

/// Active line and the line right after it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchResult<'a> {
    /// Last line whose offset is at or before the position
    pub current: Option<&'a TimedLine>,
    /// Line immediately after `current` in the timeline
    pub next: Option<&'a TimedLine>,
    /// Index of `current` within the timeline
    pub current_index: Option<usize>,
}

impl Timeline {
    /// Find the current and next line for a playback position in milliseconds.
    ///
    /// Scans forward, advancing `current` (and the `next` line that follows it)
    /// until an entry starts after `position_ms`. Before the first entry nothing
    /// has been accepted yet, so both `current` and `next` stay `None`.
    #[must_use]
    pub fn match_position(&self, position_ms: u64) -> MatchResult<'_> {
        let mut result = MatchResult::default();

        for (index, line) in self.lines().iter().enumerate() {
            if line.offset_ms() > position_ms {
                break;
            }
            result.current = Some(line);
            result.current_index = Some(index);
            result.next = self.get(index + 1);
        }

        result
    }

    /// Same as [`Timeline::match_position`] for a `Duration` position
    #[must_use]
    pub fn match_at(&self, position: Duration) -> MatchResult<'_> {
        self.match_position(position.as_millis_u64())
    }
}
