//! Daily drop-counter reset scheduler.
//!
//! The runtime ticks this once a minute with today's local date.  When the
//! date differs from the last confirmed reset, the scheduler asks for the
//! remote counter to be zeroed.
//!
//! ```text
//!            tick(today != last)          write ok
//!   Idle ───────────────────────▶ Pending ─────────▶ Idle (last = date)
//!    ▲                               │
//!    └────────── write failed ───────┘   (retried on the next tick)
//! ```
//!
//! `last_reset` only advances after the write succeeds, so a failing store
//! never silently skips a day.  While a write is pending no second request
//! is issued, so the counter is never zeroed twice for the same date.

use chrono::NaiveDate;
use log::{info, warn};

/// Reset bookkeeping for the `status/drops_today` counter.
#[derive(Debug, Clone, Default)]
pub struct DailyResetScheduler {
    /// Date of the last confirmed reset.
    last_reset: Option<NaiveDate>,
    /// Date of the reset write currently in flight.
    pending: Option<NaiveDate>,
}

impl DailyResetScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tick the scheduler.  Returns the date to reset for, if a reset
    /// write should be started now.
    pub fn tick(&mut self, today: NaiveDate) -> Option<NaiveDate> {
        if let Some(in_flight) = self.pending {
            if in_flight != today {
                info!("Reset: {} still in flight, {} waits for next tick", in_flight, today);
            }
            return None;
        }
        if self.last_reset == Some(today) {
            return None;
        }
        info!("Reset: day rollover ({:?} -> {}), zeroing drop counter", self.last_reset, today);
        self.pending = Some(today);
        Some(today)
    }

    /// Record the outcome of the reset write for `date`.
    /// Returns `true` if the reset was accepted as the new last reset.
    pub fn complete(&mut self, date: NaiveDate, succeeded: bool) -> bool {
        if self.pending != Some(date) {
            warn!("Reset: ignoring stale completion for {}", date);
            return false;
        }
        self.pending = None;
        if succeeded {
            self.last_reset = Some(date);
            true
        } else {
            warn!("Reset: write for {} failed, will retry", date);
            false
        }
    }

    /// Date of the last confirmed reset.
    pub fn last_reset(&self) -> Option<NaiveDate> {
        self.last_reset
    }

    /// Whether a reset write is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
