//! Port traits: the hexagonal boundary between engine logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ FeederControlEngine (domain)
//! ```
//!
//! Driven adapters (remote store, clock, task runner, event sinks) implement
//! these traits.  The [`FeederControlEngine`](super::service::FeederControlEngine)
//! consumes them via generics, so the domain core never touches the network
//! or wall clock directly.
//!
//! ## Consistency notes
//!
//! - **FieldStore** is eventually consistent.  A successful `write` only
//!   means the store accepted it; the device may act on it later.
//! - Subscriptions deliver the *latest* value, not every intermediate one.

use core::fmt;
use core::time::Duration;

use chrono::NaiveDate;
use serde_json::Value;

use super::commands::CommandIntent;
use super::state::CanonicalState;

// ───────────────────────────────────────────────────────────────
// Remote field store (driven adapter: engine ↔ shared KV store)
// ───────────────────────────────────────────────────────────────

/// The shared key/value store the feeder device also reads and writes.
///
/// Paths are slash-separated (`status/drops_today`); see [`crate::paths`].
#[allow(async_fn_in_trait)]
pub trait FieldStore {
    type Subscription: FieldSubscription;

    /// Open a change stream for `path`.  The first event carries the
    /// current value, the way a realtime listener attaches.
    fn subscribe(&self, path: &'static str) -> Self::Subscription;

    /// Read the whole tree under `root` once.
    async fn read_once(&self, root: &str) -> Result<Value, StoreError>;

    /// Overwrite the value at `path`.
    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Server-side atomic `value += delta` at `path`.
    async fn increment(&self, path: &str, delta: i64) -> Result<(), StoreError>;
}

/// A per-path change stream opened by [`FieldStore::subscribe`].
#[allow(async_fn_in_trait)]
pub trait FieldSubscription {
    /// Wait for the next change event.
    ///
    /// Returns `None` when the stream has closed, and `Some(None)` for an
    /// event that carries no value (the path was deleted or is unset).
    async fn next_change(&mut self) -> Option<Option<Value>>;
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: wall clock → domain)
// ───────────────────────────────────────────────────────────────

pub trait Clock {
    /// Milliseconds since the engine started (monotonic).
    fn uptime_ms(&self) -> u64;

    /// Today's date in the operator's local time zone.
    fn local_date(&self) -> NaiveDate;
}

// ───────────────────────────────────────────────────────────────
// Task port (domain → async runtime)
// ───────────────────────────────────────────────────────────────

/// Deferred work the engine asks the runtime to perform.
///
/// Every job finishes by posting an [`EngineEvent`](crate::events::EngineEvent)
/// back into the mailbox, so the engine observes the outcome on its own
/// control flow.  The engine never awaits.
pub trait TaskPort {
    /// Post `DismissExpired { generation }` after `after` has elapsed.
    /// Arming a new timer cancels the previous one.
    fn arm_dismiss_timer(&mut self, generation: u64, after: Duration);

    /// Drop any armed dismissal timer without firing it.
    fn cancel_dismiss_timer(&mut self);

    /// Write 0 to the remote drop counter, then post `ResetWritten`.
    fn write_counter_reset(&mut self, date: NaiveDate);

    /// Run the command dispatcher against `snapshot`, then post
    /// `DispatchFinished`.
    fn run_dispatch(&mut self, intent: CommandIntent, snapshot: CanonicalState);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`FieldStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// No connection to the store backend.
    Disconnected,
    /// The store's security rules refused the operation.
    PermissionDenied,
    /// The operation did not complete in time.
    Timeout,
    /// The target holds a value of the wrong type (e.g. increment on a string).
    TypeMismatch,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "store disconnected"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::Timeout => write!(f, "timed out"),
            Self::TypeMismatch => write!(f, "type mismatch"),
        }
    }
}

impl core::error::Error for StoreError {}
