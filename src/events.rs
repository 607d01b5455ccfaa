//! Engine mailbox and inbound event types.
//!
//! Events are produced by:
//! - Subscription pumps (field changes from the shared store)
//! - Timers (reset check, stock poll, notification dismissal)
//! - Completed store jobs (reset writes, command dispatches)
//! - The operator (command intents, shutdown)
//!
//! Events are consumed by the engine loop, one at a time, in arrival order.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Subscriptions│────▶│              │     │              │
//! │ Timers       │────▶│   Mailbox    │────▶│  Engine loop │
//! │ Store jobs   │────▶│  (bounded)   │     │  (consumer)  │
//! │ Operator     │────▶│              │     │              │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```

use chrono::NaiveDate;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use serde_json::Value;

use crate::app::commands::CommandIntent;
use crate::app::ports::StoreError;
use crate::dispatch::DispatchReceipt;
use crate::error::DispatchError;
use crate::paths::Field;

/// Mailbox depth.  Senders wait when it is full; the operator handle uses
/// `try_send` and reports the drop instead.
pub const MAILBOX_DEPTH: usize = 32;

/// Single-consumer engine mailbox.  `Sync`, so operator threads may post.
pub type Mailbox = Channel<CriticalSectionRawMutex, EngineEvent, MAILBOX_DEPTH>;

/// Everything that can change engine state.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    // ── Store ─────────────────────────────────────────────
    /// The initial snapshot read finished.
    SnapshotLoaded(Result<Value, StoreError>),
    /// A subscribed field changed.  `None` means the event carried no value.
    FieldChanged { field: Field, value: Option<Value> },

    // ── Timers ────────────────────────────────────────────
    /// Daily reset check (1/min).
    ResetCheckTick,
    /// Stock re-evaluation (every 30s).
    StockPollTick,
    /// A transient notification's dismissal timer fired.
    DismissExpired { generation: u64 },

    // ── Job completions ───────────────────────────────────
    /// The drop-counter reset write for `date` finished.
    ResetWritten { date: NaiveDate, result: Result<(), StoreError> },
    /// A command dispatch finished.
    DispatchFinished {
        intent: CommandIntent,
        result: Result<DispatchReceipt, DispatchError>,
    },

    // ── Operator ──────────────────────────────────────────
    /// Validate and send a command.
    Command(CommandIntent),
    /// Hide the current banner.
    DismissNotification,
    /// Stop the engine and release every timer and subscription.
    Shutdown,
}
