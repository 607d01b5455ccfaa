//! Host clock adapter.
//!
//! Implements [`Clock`] with `std::time::Instant` for monotonic uptime and
//! `chrono::Local` for the operator's calendar date.

use std::time::Instant;

use chrono::{Local, NaiveDate};

use crate::app::ports::Clock;

pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Clock for SystemClock {
    /// Milliseconds since construction (monotonic, saturates at `u64::MAX`).
    fn uptime_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn local_date(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
