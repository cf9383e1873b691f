//! Quiet-hours gate for the poll loop
//!
//! Polling is suppressed during a configured daily window, expressed as local
//! hours in a fixed reference offset from UTC. The window is inclusive at the
//! start hour and exclusive at the end hour, and may wrap past midnight. The
//! gate is a pure function of the clock: every one of the 24 hours is either
//! quiet or active, with no gaps.

use chrono::{DateTime, FixedOffset, Timelike, Utc};

/// Decides whether polling should run at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleGate {
    offset: FixedOffset,
    quiet_start: u32,
    quiet_end: u32,
}

impl ScheduleGate {
    /// Build a gate for a quiet window `[quiet_start, quiet_end)` in local
    /// hours at `utc_offset_hours`. Equal start and end means no quiet
    /// window. Inputs are validated by config loading; this constructor
    /// only asserts them in debug builds.
    pub fn new(utc_offset_hours: i8, quiet_start: u8, quiet_end: u8) -> Self {
        debug_assert!((-12..=14).contains(&utc_offset_hours));
        debug_assert!(quiet_start < 24 && quiet_end < 24);
        let offset = FixedOffset::east_opt(i32::from(utc_offset_hours) * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
        Self {
            offset,
            quiet_start: u32::from(quiet_start),
            quiet_end: u32::from(quiet_end),
        }
    }

    /// True when polling should execute at `now`; false inside the quiet
    /// window.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        let hour = now.with_timezone(&self.offset).hour();
        !self.is_quiet_hour(hour)
    }

    fn is_quiet_hour(&self, hour: u32) -> bool {
        if self.quiet_start == self.quiet_end {
            // Degenerate window: always active
            false
        } else if self.quiet_start < self.quiet_end {
            (self.quiet_start..self.quiet_end).contains(&hour)
        } else {
            // Wraps past midnight, e.g. [22, 6)
            hour >= self.quiet_start || hour < self.quiet_end
        }
    }
}
