//! System clock adapter.
//!
//! Monotonic readings come from `std::time::Instant`, wall-clock readings
//! from the local timezone via `chrono`.

use std::time::Instant;

use chrono::{DateTime, Local};

use crate::app::ports::TimePort;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl TimePort for SystemClock {
    fn monotonic(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Local> {
        Local::now()
    }
}
