//! In-process field store adapter.
//!
//! Implements [`FieldStore`] over a `serde_json::Value` tree.  Used by the
//! operator console (seeded with a demo tree and a simulated device) and by
//! tests that need a real store without a network.
//!
//! Semantics follow the hosted realtime database the feeder talks to:
//!
//! - A new subscriber first receives the path's current value (or an
//!   empty event if the path is unset), then every later change.
//! - Subscriptions are latest-value: a slow reader sees only the newest
//!   value, never a backlog.
//! - `increment` treats a missing path as 0.
//!
//! Faults can be injected per operation for degraded-mode tests.

use core::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{debug, info};
use serde_json::{Map, Value};

use crate::app::ports::{FieldStore, FieldSubscription, StoreError};
use crate::paths;

/// One subscriber's mailbox: holds only the newest change.
type ChangeSignal = Signal<CriticalSectionRawMutex, Change>;

#[derive(Debug, Clone)]
enum Change {
    Value(Option<Value>),
    Closed,
}

#[derive(Default)]
struct Inner {
    tree: Value,
    subscribers: Vec<(&'static str, Arc<ChangeSignal>)>,
    read_fault: Option<StoreError>,
    /// Per-path write/increment faults.  Persist until cleared.
    write_faults: BTreeMap<String, StoreError>,
    /// Remaining increment failures before increments succeed again.
    increment_failures: u32,
    closed: bool,
}

/// Shared in-memory store.  Clones share the same tree.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<CriticalSectionRawMutex, RefCell<Inner>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_tree(Value::Object(Map::new()))
    }

    /// Create a store seeded with `tree`.
    pub fn with_tree(tree: Value) -> Self {
        info!("MemoryStore: initialised");
        Self {
            inner: Arc::new(Mutex::new(RefCell::new(Inner {
                tree,
                ..Inner::default()
            }))),
        }
    }

    /// Current value at `path`, if any.
    pub fn get(&self, path: &str) -> Option<Value> {
        self.inner.lock(|c| paths::lookup(&c.borrow().tree, path).cloned())
    }

    /// Device-side write: bypasses fault injection and notifies subscribers.
    pub fn set(&self, path: &str, value: Value) {
        self.apply(path, value);
    }

    /// Fail every `read_once` with `fault` until cleared with `None`.
    pub fn fail_reads(&self, fault: Option<StoreError>) {
        self.inner.lock(|c| c.borrow_mut().read_fault = fault);
    }

    /// Fail writes and increments on `path` with `fault` until cleared.
    pub fn fail_writes(&self, path: &str, fault: Option<StoreError>) {
        self.inner.lock(|c| {
            let mut inner = c.borrow_mut();
            match fault {
                Some(e) => {
                    inner.write_faults.insert(path.to_string(), e);
                }
                None => {
                    inner.write_faults.remove(path);
                }
            }
        });
    }

    /// Fail the next `count` increments with `Timeout`.
    pub fn fail_increments(&self, count: u32) {
        self.inner.lock(|c| c.borrow_mut().increment_failures = count);
    }

    /// Close every subscription.  Later subscribers are closed immediately.
    pub fn close(&self) {
        let signals = self.inner.lock(|c| {
            let mut inner = c.borrow_mut();
            inner.closed = true;
            core::mem::take(&mut inner.subscribers)
        });
        for (_, signal) in signals {
            signal.signal(Change::Closed);
        }
        info!("MemoryStore: closed");
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock(|c| {
            let mut inner = c.borrow_mut();
            inner.subscribers.retain(|(_, s)| Arc::strong_count(s) > 1);
            inner.subscribers.len()
        })
    }

    // ── Internal ──────────────────────────────────────────────

    fn check_write(&self, path: &str) -> Result<(), StoreError> {
        self.inner.lock(|c| match c.borrow().write_faults.get(path) {
            Some(e) => Err(*e),
            None => Ok(()),
        })
    }

    /// Write `value` at `path` and fan the change out.
    fn apply(&self, path: &str, value: Value) {
        let notify = self.inner.lock(|c| {
            let mut inner = c.borrow_mut();
            set_path(&mut inner.tree, path, value);
            inner.subscribers.retain(|(_, s)| Arc::strong_count(s) > 1);
            let inner = &*inner;
            inner
                .subscribers
                .iter()
                .filter(|(sub, _)| overlaps(sub, path))
                .map(|(sub, signal)| (signal.clone(), paths::lookup(&inner.tree, sub).cloned()))
                .collect::<Vec<_>>()
        });
        for (signal, value) in notify {
            signal.signal(Change::Value(value));
        }
    }
}

impl FieldStore for MemoryStore {
    type Subscription = MemorySubscription;

    fn subscribe(&self, path: &'static str) -> MemorySubscription {
        let signal = Arc::new(ChangeSignal::new());
        self.inner.lock(|c| {
            let mut inner = c.borrow_mut();
            if inner.closed {
                signal.signal(Change::Closed);
            } else {
                signal.signal(Change::Value(paths::lookup(&inner.tree, path).cloned()));
                inner.subscribers.push((path, signal.clone()));
            }
        });
        debug!("MemoryStore: subscribed to {}", path);
        MemorySubscription { signal }
    }

    async fn read_once(&self, root: &str) -> Result<Value, StoreError> {
        self.inner.lock(|c| {
            let inner = c.borrow();
            if let Some(e) = inner.read_fault {
                return Err(e);
            }
            Ok(paths::lookup(&inner.tree, root).cloned().unwrap_or(Value::Null))
        })
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.check_write(path)?;
        self.apply(path, value);
        Ok(())
    }

    async fn increment(&self, path: &str, delta: i64) -> Result<(), StoreError> {
        self.check_write(path)?;
        let current = self.inner.lock(|c| {
            let mut inner = c.borrow_mut();
            if inner.increment_failures > 0 {
                inner.increment_failures -= 1;
                return Err(StoreError::Timeout);
            }
            match paths::lookup(&inner.tree, path) {
                None | Some(Value::Null) => Ok(0),
                Some(v) => v.as_i64().ok_or(StoreError::TypeMismatch),
            }
        })?;
        self.apply(path, Value::from(current.saturating_add(delta)));
        Ok(())
    }
}

/// Change stream returned by [`MemoryStore::subscribe`].
pub struct MemorySubscription {
    signal: Arc<ChangeSignal>,
}

impl FieldSubscription for MemorySubscription {
    async fn next_change(&mut self) -> Option<Option<Value>> {
        match self.signal.wait().await {
            Change::Value(v) => Some(v),
            Change::Closed => {
                // Stay closed for any later call.
                self.signal.signal(Change::Closed);
                None
            }
        }
    }
}

// ── Tree helpers ──────────────────────────────────────────────

/// True if a write at `written` can change the value seen at `subscribed`.
fn overlaps(subscribed: &str, written: &str) -> bool {
    let mut a = paths::segments(subscribed);
    let mut b = paths::segments(written);
    loop {
        match (a.next(), b.next()) {
            (Some(x), Some(y)) if x == y => {}
            (Some(_), Some(_)) => return false,
            _ => return true,
        }
    }
}

/// Set `value` at `path`, creating intermediate objects as needed.
fn set_path(tree: &mut Value, path: &str, value: Value) {
    let mut node = tree;
    for segment in paths::segments(path) {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else { return };
        node = map.entry(segment.to_string()).or_insert(Value::Null);
    }
    *node = value;
}
