//! Stock threshold policy.
//!
//! Maps a raw stock reading to a fill fraction and a notification decision.
//! The reading comes from a distance sensor, so a *larger* value means
//! *less* food:
//!
//! ```text
//!   0 ──── full ──── low ────────────── empty ──── capacity
//!   │ Full  │  Low   │     mid-range     │  Empty   │
//!   fill=0.0                             fill=1.0
//! ```
//!
//! ## Hysteresis
//!
//! Readings hover around the thresholds under sensor noise, so the
//! decision carries one bit of prior state:
//!
//! | reading          | Normal                    | ShowingEmpty             |
//! |------------------|---------------------------|--------------------------|
//! | `>= empty`       | Empty → ShowingEmpty      | (none)                   |
//! | `<= full`        | Full                      | Full → Normal            |
//! | `<= low`         | Low                       | ClearEmpty → Normal      |
//! | mid-range        | (none)                    | ClearEmpty → Normal      |
//!
//! A warning never fires straight out of ShowingEmpty: the first reading
//! below the empty threshold only clears the latch.
//!
//! [`evaluate`] is pure: the caller owns the [`HysteresisState`] and feeds
//! the returned `next` back in on the following reading.

use crate::config::ThresholdConfig;
use crate::notify::Severity;

/// Whether the persistent "container empty" banner is being asserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HysteresisState {
    #[default]
    Normal,
    ShowingEmpty,
}

/// What the notification layer should do after a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing new to show.
    None,
    /// Persistent error: the container ran empty.
    Empty,
    /// Transient success: the container is full.
    Full,
    /// Transient warning: stock is running low.
    Low,
    /// Left the empty state without reaching full; no new message.
    ClearEmpty,
}

impl Decision {
    /// Banner text, severity and persistence for decisions that show one.
    pub fn banner(self) -> Option<(&'static str, Severity, bool)> {
        match self {
            Self::Empty => Some(("Container empty", Severity::Error, true)),
            Self::Full => Some(("Container full", Severity::Success, false)),
            Self::Low => Some(("Stock low", Severity::Warning, false)),
            Self::None | Self::ClearEmpty => None,
        }
    }
}

/// Result of one policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// 0 = full, 1 = empty.
    pub fill_fraction: f64,
    pub decision: Decision,
    /// Hysteresis state to carry into the next evaluation.
    pub next: HysteresisState,
}

/// Normalise a raw reading into `[0, 1]` (0 = full, 1 = empty).
pub fn fill_fraction(t: &ThresholdConfig, stock: f64) -> f64 {
    if stock <= t.full_threshold {
        0.0
    } else if stock >= t.empty_threshold {
        1.0
    } else {
        (stock - t.full_threshold) / (t.empty_threshold - t.full_threshold)
    }
}

/// Percentage of food remaining, as shown on the gauge.
pub fn display_percent(fill_fraction: f64) -> u8 {
    ((1.0 - fill_fraction) * 100.0).clamp(0.0, 100.0).round() as u8
}

/// Evaluate one stock reading against the thresholds.
pub fn evaluate(t: &ThresholdConfig, stock: f64, state: HysteresisState) -> Evaluation {
    let showing_empty = state == HysteresisState::ShowingEmpty;

    let (decision, next) = if stock >= t.empty_threshold {
        if showing_empty {
            (Decision::None, HysteresisState::ShowingEmpty)
        } else {
            (Decision::Empty, HysteresisState::ShowingEmpty)
        }
    } else if stock <= t.full_threshold {
        // Re-emitted on every evaluation at this level, not only on the
        // transition out of ShowingEmpty.
        (Decision::Full, HysteresisState::Normal)
    } else if stock <= t.low_threshold && !showing_empty {
        (Decision::Low, HysteresisState::Normal)
    } else if showing_empty {
        (Decision::ClearEmpty, HysteresisState::Normal)
    } else {
        (Decision::None, HysteresisState::Normal)
    };

    Evaluation {
        fill_fraction: fill_fraction(t, stock),
        decision,
        next,
    }
}
