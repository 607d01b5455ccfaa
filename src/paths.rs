//! Store key-path assignments shared with the feeder firmware.
//!
//! Single source of truth: the device reads `commands/*` and writes
//! `status/*` / `data/*` under exactly these paths.  Changing any of them
//! breaks interop with deployed feeders.

use serde_json::Value;

// ---------------------------------------------------------------------------
// Live fields (device → engine)
// ---------------------------------------------------------------------------

/// Seconds until the next scheduled feed (integer).
pub const COUNTDOWN_REMAINING: &str = "data/countdown_remaining";
/// Feed drops since the last daily reset (integer).
pub const DROPS_TODAY: &str = "status/drops_today";
/// Raw stock-sensor reading; larger means emptier (number).
pub const STOCK_REMAINING: &str = "status/stock_remaining";

// ---------------------------------------------------------------------------
// Command fields (engine → device)
// ---------------------------------------------------------------------------

/// Feeder mode command (integer, see [`MODE_MANUAL_FEED`] / [`MODE_FLUSH`]).
pub const COMMAND_MODE: &str = "commands/mode";
/// Requested feed interval in seconds (integer).
pub const COMMAND_COUNTDOWN: &str = "commands/countdown";

/// `commands/mode` value requesting one manual feed drop.
pub const MODE_MANUAL_FEED: i64 = 1;
/// `commands/mode` value requesting a flush cycle.
pub const MODE_FLUSH: i64 = 2;

/// Root path passed to `read_once` for the initial snapshot.
pub const ROOT: &str = "";

// ---------------------------------------------------------------------------
// Subscribed fields
// ---------------------------------------------------------------------------

/// The three live fields the engine subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Countdown,
    DropsToday,
    StockRemaining,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Countdown, Field::DropsToday, Field::StockRemaining];

    /// Store path for this field.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Countdown => COUNTDOWN_REMAINING,
            Self::DropsToday => DROPS_TODAY,
            Self::StockRemaining => STOCK_REMAINING,
        }
    }
}

/// Split a slash-separated path into its non-empty segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Resolve `path` inside a snapshot tree.  `None` if any segment is missing.
pub fn lookup<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(tree, |node, key| node.get(key))
}

/// Decode a store value as a non-negative integer.
///
/// Firmware sometimes writes counters as floats (`12.0`); those are
/// truncated.  Negative numbers saturate to zero.
pub fn as_count(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    if value.as_i64().is_some() {
        return Some(0);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite())
        .map(|f| if f <= 0.0 { 0 } else { f as u64 })
}

/// Decode a store value as a real number.
pub fn as_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|f| f.is_finite())
}
