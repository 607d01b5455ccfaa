//! Canonical feeder state and the read-only view published to the UI.
//!
//! `CanonicalState` is the engine's single source of truth.  It is mutated
//! only by subscription events and by the side effects of successful
//! commands, always on the engine's own control flow.

use chrono::NaiveDate;
use serde_json::Value;

use crate::notify::NotificationState;
use crate::paths;

/// Engine lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnginePhase {
    /// Waiting for the initial snapshot read.
    #[default]
    Initializing,
    /// Snapshot done (or failed); subscriptions drive state.
    Live,
}

/// The live feeder readings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CanonicalState {
    /// Seconds until the next scheduled feed.
    pub countdown_remaining_secs: u64,
    /// Feed drops since the last daily reset.
    pub drops_today: u64,
    /// Raw stock reading in store units (larger = emptier).
    pub stock_remaining: f64,
    /// Date of the last confirmed daily counter reset.
    pub last_reset_date: Option<NaiveDate>,
    /// True once any stock reading has been received.
    pub stock_observed: bool,
}

impl CanonicalState {
    /// Populate from an initial snapshot tree.  Missing or malformed fields
    /// keep their zero value.
    pub fn from_snapshot(tree: &Value) -> Self {
        let mut state = Self::default();
        if let Some(n) = paths::lookup(tree, paths::COUNTDOWN_REMAINING).and_then(paths::as_count) {
            state.countdown_remaining_secs = n;
        }
        if let Some(n) = paths::lookup(tree, paths::DROPS_TODAY).and_then(paths::as_count) {
            state.drops_today = n;
        }
        if let Some(s) = paths::lookup(tree, paths::STOCK_REMAINING).and_then(paths::as_number) {
            state.stock_remaining = s;
            state.stock_observed = true;
        }
        state
    }
}

/// Everything the presentation layer needs on a redraw tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineView {
    pub phase: EnginePhase,
    pub state: CanonicalState,
    /// 0 = full, 1 = empty.
    pub fill_fraction: f64,
    /// Percentage of food remaining, 0–100.
    pub display_percent: u8,
    pub notification: NotificationState,
    /// Commands written to the store but not yet confirmed.
    pub dispatches_in_flight: usize,
}
