//! Business-hours gate.
//!
//! A daily time-of-day window outside which actuation is suppressed.
//! Windows whose start is later than their end wrap around midnight
//! (e.g. 22:00–06:00 is the overnight window).  Bounds are inclusive.

use chrono::{NaiveTime, Timelike};
use log::warn;

use crate::error::ConfigParseError;

/// Borrowed view of the configured window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours<'a> {
    pub enabled: bool,
    pub start: &'a str,
    pub end: &'a str,
}

impl BusinessHours<'_> {
    /// Whether `now` falls inside the window.  A disabled gate is always
    /// open.  Malformed bounds are an error.
    pub fn contains(&self, now: NaiveTime) -> Result<bool, ConfigParseError> {
        if !self.enabled {
            return Ok(true);
        }
        let start = parse_time_of_day(self.start)?;
        let end = parse_time_of_day(self.end)?;
        Ok(within(start, end, now))
    }

    /// Like [`contains`](Self::contains), but a malformed window is
    /// logged and treated as open.
    pub fn admits(&self, now: NaiveTime) -> bool {
        self.contains(now).unwrap_or_else(|e| {
            warn!("business hours: {e}; gate left open");
            true
        })
    }
}

/// Inclusive window test, wrapping past midnight when `start > end`.
pub fn within(start: NaiveTime, end: NaiveTime, now: NaiveTime) -> bool {
    if start <= end {
        start <= now && now <= end
    } else {
        now >= start || now <= end
    }
}

/// Parse a time of day: `HH:MM`, `HH:MM:SS`, `HH:MM:SS.fff` or `HH`.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, ConfigParseError> {
    let s = raw.trim();
    let invalid = || ConfigParseError::InvalidTime(raw.to_owned());

    let parsed = match s.matches(':').count() {
        0 => s
            .parse::<u32>()
            .ok()
            .filter(|_| s.len() == 2)
            .and_then(|h| NaiveTime::from_hms_opt(h, 0, 0)),
        1 => NaiveTime::parse_from_str(s, "%H:%M").ok(),
        2 => NaiveTime::parse_from_str(s, "%H:%M:%S%.f").ok(),
        _ => None,
    };
    // chrono accepts a leap second (:60); a time of day never carries one.
    parsed
        .filter(|t| t.nanosecond() < 1_000_000_000)
        .ok_or_else(invalid)
}
