//! Recording mock adapters for integration tests.
//!
//! Every port call is captured so tests can assert on the full history
//! without a network, real timers, or a wall clock.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use chrono::NaiveDate;
use fishfeeder::app::commands::CommandIntent;
use fishfeeder::app::events::AppEvent;
use fishfeeder::app::ports::{Clock, EventSink, FieldStore, FieldSubscription, StoreError, TaskPort};
use fishfeeder::app::state::CanonicalState;
use serde_json::Value;

// ── Store call record ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    ReadOnce(String),
    Write(String, Value),
    Increment(String, i64),
}

// ── MockStore ─────────────────────────────────────────────────

/// Records writes and increments; injected faults fail before recording.
#[derive(Default)]
pub struct MockStore {
    pub calls: RefCell<Vec<StoreCall>>,
    snapshot: RefCell<Option<Result<Value, StoreError>>>,
    write_faults: RefCell<HashMap<String, StoreError>>,
    increment_failures: Cell<u32>,
    changes: RefCell<HashMap<&'static str, VecDeque<Option<Value>>>>,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Result<Value, StoreError>) -> Self {
        let store = Self::new();
        *store.snapshot.borrow_mut() = Some(snapshot);
        store
    }

    pub fn fail_write(&self, path: &str, error: StoreError) {
        self.write_faults.borrow_mut().insert(path.to_string(), error);
    }

    pub fn fail_increments(&self, count: u32) {
        self.increment_failures.set(count);
    }

    /// Queue change events delivered to the next subscriber of `path`.
    pub fn queue_changes(&self, path: &'static str, changes: Vec<Option<Value>>) {
        self.changes.borrow_mut().insert(path, changes.into());
    }

    /// Successful writes and increments, in order.
    pub fn mutations(&self) -> Vec<StoreCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| !matches!(c, StoreCall::ReadOnce(_)))
            .cloned()
            .collect()
    }
}

impl FieldStore for MockStore {
    type Subscription = MockSubscription;

    fn subscribe(&self, path: &'static str) -> MockSubscription {
        MockSubscription {
            changes: self.changes.borrow_mut().remove(path).unwrap_or_default(),
        }
    }

    async fn read_once(&self, root: &str) -> Result<Value, StoreError> {
        self.calls.borrow_mut().push(StoreCall::ReadOnce(root.to_string()));
        self.snapshot
            .borrow()
            .clone()
            .unwrap_or(Ok(Value::Null))
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        if let Some(e) = self.write_faults.borrow().get(path) {
            return Err(*e);
        }
        self.calls.borrow_mut().push(StoreCall::Write(path.to_string(), value));
        Ok(())
    }

    async fn increment(&self, path: &str, delta: i64) -> Result<(), StoreError> {
        if let Some(e) = self.write_faults.borrow().get(path) {
            return Err(*e);
        }
        let remaining = self.increment_failures.get();
        if remaining > 0 {
            self.increment_failures.set(remaining - 1);
            return Err(StoreError::Timeout);
        }
        self.calls.borrow_mut().push(StoreCall::Increment(path.to_string(), delta));
        Ok(())
    }
}

/// Replays queued changes, then closes.
pub struct MockSubscription {
    changes: VecDeque<Option<Value>>,
}

impl FieldSubscription for MockSubscription {
    async fn next_change(&mut self) -> Option<Option<Value>> {
        self.changes.pop_front()
    }
}

// ── RecordingTasks ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TaskCall {
    ArmDismiss { generation: u64, after: Duration },
    CancelDismiss,
    ResetWrite(NaiveDate),
    Dispatch { intent: CommandIntent, snapshot: CanonicalState },
}

#[derive(Default)]
pub struct RecordingTasks {
    pub calls: Vec<TaskCall>,
}

#[allow(dead_code)]
impl RecordingTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the most recently armed dismissal timer.
    pub fn last_armed(&self) -> Option<u64> {
        self.calls.iter().rev().find_map(|c| match c {
            TaskCall::ArmDismiss { generation, .. } => Some(*generation),
            _ => None,
        })
    }

    pub fn reset_writes(&self) -> Vec<NaiveDate> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                TaskCall::ResetWrite(d) => Some(*d),
                _ => None,
            })
            .collect()
    }

    pub fn dispatches(&self) -> Vec<(CommandIntent, CanonicalState)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                TaskCall::Dispatch { intent, snapshot } => Some((*intent, *snapshot)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl TaskPort for RecordingTasks {
    fn arm_dismiss_timer(&mut self, generation: u64, after: Duration) {
        self.calls.push(TaskCall::ArmDismiss { generation, after });
    }

    fn cancel_dismiss_timer(&mut self) {
        self.calls.push(TaskCall::CancelDismiss);
    }

    fn write_counter_reset(&mut self, date: NaiveDate) {
        self.calls.push(TaskCall::ResetWrite(date));
    }

    fn run_dispatch(&mut self, intent: CommandIntent, snapshot: CanonicalState) {
        self.calls.push(TaskCall::Dispatch { intent, snapshot });
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts of every `Notified` event, in order.
    pub fn notifications(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Notified { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── ManualClock ───────────────────────────────────────────────

/// Test clock; clones share the same time, so a test can keep one handle
/// while the engine owns another.
#[derive(Clone)]
pub struct ManualClock {
    uptime_ms: Rc<Cell<u64>>,
    date: Rc<Cell<NaiveDate>>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            uptime_ms: Rc::new(Cell::new(0)),
            date: Rc::new(Cell::new(date)),
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.uptime_ms.set(self.uptime_ms.get() + ms);
    }

    pub fn set_date(&self, date: NaiveDate) {
        self.date.set(date);
    }
}

impl Clock for ManualClock {
    fn uptime_ms(&self) -> u64 {
        self.uptime_ms.get()
    }

    fn local_date(&self) -> NaiveDate {
        self.date.get()
    }
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}
