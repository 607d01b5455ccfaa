//! Outbound application events.
//!
//! The [`FeederControlEngine`](super::service::FeederControlEngine) emits
//! these through the [`EventSink`](super::ports::EventSink) port.  Adapters
//! on the other side decide what to do with them.

use chrono::NaiveDate;

use crate::error::{DispatchError, Error};
use crate::notify::Severity;

use super::commands::CommandIntent;
use super::state::EnginePhase;

/// Structured events emitted by the engine core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The engine moved between lifecycle phases.
    PhaseChanged { from: EnginePhase, to: EnginePhase },

    /// A new banner replaced the current one.
    Notified {
        text: String,
        severity: Severity,
        persistent: bool,
    },

    /// The visible banner was hidden (auto-dismiss or explicit).
    Dismissed,

    /// The remote drop counter was zeroed for `date`.
    CounterReset(NaiveDate),

    /// A command reached the store.
    CommandSent(CommandIntent),

    /// A command was refused or partially applied.
    CommandFailed {
        intent: CommandIntent,
        error: DispatchError,
    },

    /// A non-fatal fault the engine absorbed.
    Fault(Error),
}
