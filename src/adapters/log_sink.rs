//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each engine event as one log line.
//! A push-notification or UI adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] through the `log` facade.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::PhaseChanged { from, to } => {
                info!("PHASE | {:?} -> {:?}", from, to);
            }
            AppEvent::Notified { text, severity, persistent } => {
                info!(
                    "NOTIFY | {:?}{} | {}",
                    severity,
                    if *persistent { " (persistent)" } else { "" },
                    text
                );
            }
            AppEvent::Dismissed => {
                info!("NOTIFY | dismissed");
            }
            AppEvent::CounterReset(date) => {
                info!("RESET | drops_today zeroed for {}", date);
            }
            AppEvent::CommandSent(intent) => {
                info!("CMD | {} sent", intent.label());
            }
            AppEvent::CommandFailed { intent, error } => {
                warn!("CMD | {} failed: {}", intent.label(), error);
            }
            AppEvent::Fault(e) => {
                warn!("FAULT | {}", e);
            }
        }
    }
}
