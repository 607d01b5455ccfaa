//! Feeder control engine: the hexagonal core.
//!
//! [`FeederControlEngine`] owns the canonical feeder state, the stock
//! hysteresis latch, the notification center, and the daily reset
//! scheduler.  It never awaits: every event is handled synchronously and
//! any store work is handed to the [`TaskPort`], whose jobs report back
//! through the mailbox as further events.
//!
//! ```text
//!  EngineEvent ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!                  │     FeederControlEngine      │
//!    TaskPort  ◀── │ State · Policy · Notify · Reset │
//!                  └─────────────────────────────┘
//! ```

use core::ops::ControlFlow;

use log::{debug, info, warn};
use serde_json::Value;

use crate::config::EngineConfig;
use crate::dispatch::{CommandDispatcher, DispatchReceipt};
use crate::error::{DispatchError, Error};
use crate::events::EngineEvent;
use crate::notify::{NotificationCenter, NotificationState, Severity};
use crate::paths::{self, Field};
use crate::policy::{self, Decision, HysteresisState};
use crate::scheduler::DailyResetScheduler;

use super::commands::CommandIntent;
use super::events::AppEvent;
use super::ports::{Clock, EventSink, StoreError, TaskPort};
use super::state::{CanonicalState, EnginePhase, EngineView};

// ───────────────────────────────────────────────────────────────
// FeederControlEngine
// ───────────────────────────────────────────────────────────────

pub struct FeederControlEngine<C: Clock> {
    config: EngineConfig,
    clock: C,
    phase: EnginePhase,
    state: CanonicalState,
    hysteresis: HysteresisState,
    fill_fraction: f64,
    notifications: NotificationCenter,
    reset: DailyResetScheduler,
    dispatcher: CommandDispatcher,
    /// Dispatches handed to the task port and not yet finished.
    in_flight: usize,
}

impl<C: Clock> FeederControlEngine<C> {
    /// Construct the engine in `Initializing` with zero-valued state.
    pub fn new(config: EngineConfig, clock: C) -> Self {
        let dismiss_after = config.notification_dismiss();
        let dispatcher = CommandDispatcher::new(&config);
        Self {
            config,
            clock,
            phase: EnginePhase::Initializing,
            state: CanonicalState::default(),
            hysteresis: HysteresisState::Normal,
            fill_fraction: 0.0,
            notifications: NotificationCenter::new(dismiss_after),
            reset: DailyResetScheduler::new(),
            dispatcher,
            in_flight: 0,
        }
    }

    // ── Event handling ────────────────────────────────────────

    /// Apply one mailbox event.  Returns `Break` on shutdown.
    pub fn handle(
        &mut self,
        event: EngineEvent,
        tasks: &mut impl TaskPort,
        sink: &mut impl EventSink,
    ) -> ControlFlow<()> {
        match event {
            EngineEvent::SnapshotLoaded(result) => self.on_snapshot(result, tasks, sink),
            EngineEvent::FieldChanged { field, value } => self.on_field(field, value, tasks, sink),
            EngineEvent::ResetCheckTick => self.on_reset_check(tasks),
            EngineEvent::StockPollTick => {
                if self.phase == EnginePhase::Live && self.state.stock_observed {
                    self.evaluate_stock(tasks, sink);
                }
            }
            EngineEvent::DismissExpired { generation } => {
                if self.notifications.expire(generation) {
                    sink.emit(&AppEvent::Dismissed);
                }
            }
            EngineEvent::ResetWritten { date, result } => {
                if self.reset.complete(date, result.is_ok()) {
                    self.state.drops_today = 0;
                    self.state.last_reset_date = Some(date);
                    sink.emit(&AppEvent::CounterReset(date));
                } else if let Err(e) = result {
                    self.notify_error(&format!("Daily counter reset failed: {e}"), tasks, sink);
                    sink.emit(&AppEvent::Fault(Error::Write(e)));
                }
            }
            EngineEvent::Command(intent) => self.on_command(intent, tasks, sink),
            EngineEvent::DispatchFinished { intent, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.on_dispatch_result(intent, result, tasks, sink);
            }
            EngineEvent::DismissNotification => {
                self.notifications.dismiss();
                tasks.cancel_dismiss_timer();
                sink.emit(&AppEvent::Dismissed);
            }
            EngineEvent::Shutdown => {
                info!("Engine: shutdown requested");
                tasks.cancel_dismiss_timer();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn state(&self) -> &CanonicalState {
        &self.state
    }

    pub fn hysteresis(&self) -> HysteresisState {
        self.hysteresis
    }

    pub fn notification(&self) -> &NotificationState {
        self.notifications.current()
    }

    pub fn dispatches_in_flight(&self) -> usize {
        self.in_flight
    }

    /// Snapshot for the presentation layer.
    pub fn view(&self) -> EngineView {
        EngineView {
            phase: self.phase,
            state: self.state,
            fill_fraction: self.fill_fraction,
            display_percent: policy::display_percent(self.fill_fraction),
            notification: self.notifications.current().clone(),
            dispatches_in_flight: self.in_flight,
        }
    }

    // ── Store events ──────────────────────────────────────────

    fn on_snapshot(
        &mut self,
        result: Result<Value, StoreError>,
        tasks: &mut impl TaskPort,
        sink: &mut impl EventSink,
    ) {
        if self.phase == EnginePhase::Live {
            warn!("Engine: duplicate snapshot ignored");
            return;
        }

        let last_reset_date = self.state.last_reset_date;
        let failure = match result {
            Ok(tree) => {
                self.state = CanonicalState {
                    last_reset_date,
                    ..CanonicalState::from_snapshot(&tree)
                };
                info!(
                    "Engine: snapshot loaded (countdown={}s drops={} stock={:.2})",
                    self.state.countdown_remaining_secs,
                    self.state.drops_today,
                    self.state.stock_remaining
                );
                None
            }
            Err(e) => {
                warn!("Engine: snapshot read failed ({}), running on zero values", e);
                self.state = CanonicalState {
                    last_reset_date,
                    ..CanonicalState::default()
                };
                Some(e)
            }
        };

        self.set_phase(EnginePhase::Live, sink);

        // The stock subscription opens with the current reading and runs
        // the policy then; evaluating here too would show its banner twice.
        if let Some(e) = failure {
            self.notify_error(&format!("Could not load feeder data: {e}"), tasks, sink);
            sink.emit(&AppEvent::Fault(Error::Initialization(e)));
        }
    }

    fn on_field(
        &mut self,
        field: Field,
        value: Option<Value>,
        tasks: &mut impl TaskPort,
        sink: &mut impl EventSink,
    ) {
        if self.phase != EnginePhase::Live {
            debug!("Engine: {:?} change before snapshot, ignored", field);
            return;
        }
        let Some(value) = value else {
            debug!("Engine: {} carried no value, keeping previous", field.path());
            return;
        };

        match field {
            Field::Countdown => match paths::as_count(&value) {
                Some(secs) => self.state.countdown_remaining_secs = secs,
                None => warn!("Engine: malformed {} = {}", field.path(), value),
            },
            Field::DropsToday => match paths::as_count(&value) {
                Some(n) => self.state.drops_today = n,
                None => warn!("Engine: malformed {} = {}", field.path(), value),
            },
            Field::StockRemaining => match paths::as_number(&value) {
                Some(stock) => {
                    self.state.stock_remaining = stock;
                    self.state.stock_observed = true;
                    self.evaluate_stock(tasks, sink);
                }
                None => warn!("Engine: malformed {} = {}", field.path(), value),
            },
        }
    }

    // ── Timers ────────────────────────────────────────────────

    fn on_reset_check(&mut self, tasks: &mut impl TaskPort) {
        if self.phase != EnginePhase::Live {
            return;
        }
        if let Some(date) = self.reset.tick(self.clock.local_date()) {
            tasks.write_counter_reset(date);
        }
    }

    /// Run the threshold policy on the current reading and route its
    /// decision to the notification center.
    fn evaluate_stock(&mut self, tasks: &mut impl TaskPort, sink: &mut impl EventSink) {
        let eval = policy::evaluate(&self.config.thresholds, self.state.stock_remaining, self.hysteresis);
        self.fill_fraction = eval.fill_fraction;
        if eval.next != self.hysteresis {
            debug!("Engine: hysteresis {:?} -> {:?}", self.hysteresis, eval.next);
        }
        self.hysteresis = eval.next;

        if eval.decision == Decision::ClearEmpty {
            let current = self.notifications.current();
            let empty_banner = Decision::Empty.banner().map(|(text, ..)| text);
            if current.persistent && current.is_visible() && Some(current.text.as_str()) == empty_banner {
                self.notifications.dismiss();
                tasks.cancel_dismiss_timer();
                sink.emit(&AppEvent::Dismissed);
            }
            return;
        }

        if let Some((text, severity, persistent)) = eval.decision.banner() {
            self.notify(text, severity, persistent, tasks, sink);
        }
    }

    // ── Commands ──────────────────────────────────────────────

    fn on_command(&mut self, intent: CommandIntent, tasks: &mut impl TaskPort, sink: &mut impl EventSink) {
        if let Err(e) = self.dispatcher.check(intent, &self.state) {
            self.on_dispatch_result(intent, Err(e), tasks, sink);
            return;
        }
        self.in_flight += 1;
        debug!("Engine: dispatching {:?} ({} in flight)", intent, self.in_flight);
        tasks.run_dispatch(intent, self.state);
    }

    fn on_dispatch_result(
        &mut self,
        intent: CommandIntent,
        result: Result<DispatchReceipt, DispatchError>,
        tasks: &mut impl TaskPort,
        sink: &mut impl EventSink,
    ) {
        match result {
            Ok(receipt) => {
                let text = match receipt {
                    DispatchReceipt::Fed => "Feeding".to_string(),
                    DispatchReceipt::Flushing => "Flushing".to_string(),
                    DispatchReceipt::IntervalSet { seconds } => {
                        self.state.countdown_remaining_secs = seconds;
                        format!("Feed interval set to {seconds}s")
                    }
                };
                self.notify(&text, Severity::Success, false, tasks, sink);
                sink.emit(&AppEvent::CommandSent(intent));
            }
            Err(error) => {
                let text = match error {
                    DispatchError::Blocked(reason) => format!("Cannot feed: {reason}"),
                    other => format!("Command '{}' failed: {other}", intent.label()),
                };
                self.notify_error(&text, tasks, sink);
                sink.emit(&AppEvent::CommandFailed { intent, error });
            }
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn set_phase(&mut self, to: EnginePhase, sink: &mut impl EventSink) {
        let from = self.phase;
        if from != to {
            self.phase = to;
            sink.emit(&AppEvent::PhaseChanged { from, to });
        }
    }

    fn notify_error(&mut self, text: &str, tasks: &mut impl TaskPort, sink: &mut impl EventSink) {
        self.notify(text, Severity::Error, false, tasks, sink);
    }

    fn notify(
        &mut self,
        text: &str,
        severity: Severity,
        persistent: bool,
        tasks: &mut impl TaskPort,
        sink: &mut impl EventSink,
    ) {
        let now = self.clock.uptime_ms();
        if persistent {
            self.notifications.show_persistent(text, severity, now);
            tasks.cancel_dismiss_timer();
        } else {
            let ticket = self.notifications.show_transient(text, severity, now);
            tasks.arm_dismiss_timer(ticket.generation, ticket.after);
        }
        sink.emit(&AppEvent::Notified {
            text: text.to_string(),
            severity,
            persistent,
        });
    }
}
