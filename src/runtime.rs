//! Engine runtime: mailbox loop, timers, and store jobs.
//!
//! Runs on a single thread using `edge-executor` for cooperative task
//! scheduling and `async-io-mini` for reactor-driven timers.  The engine
//! loop is the only consumer of the mailbox; everything else is a task
//! that posts events into it.
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────────┐
//!  │  Engine thread                                               │
//!  │  futures_lite::block_on ─▶ LocalExecutor                     │
//!  │                                                              │
//!  │  ┌───────────┐ ┌──────────┐ ┌──────────┐ ┌────────────────┐  │
//!  │  │ Bootstrap │ │ Reset ⏱  │ │ Stock ⏱  │ │ Dismiss ⏱ (0-1)│  │
//!  │  │ + 3 pumps │ │ 1/min    │ │ 30s      │ │ per banner     │  │
//!  │  └─────┬─────┘ └────┬─────┘ └────┬─────┘ └───────┬────────┘  │
//!  │        │            │            │               │           │
//!  │        ▼            ▼            ▼               ▼           │
//!  │  ┌────────────────────── Mailbox ──────────────────────────┐ │
//!  │  └──────────────────────────┬──────────────────────────────┘ │
//!  │                             ▼                                │
//!  │                   FeederControlEngine ──▶ dispatch / reset   │
//!  │                             │              jobs (tasks)      │
//!  │                             ▼                                │
//!  │                        EngineView ◀── EngineHandle (any thread)
//!  └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every spawned task is owned by the runtime through its `Task` handle.
//! Replacing a handle cancels the old task; on shutdown the runtime cancels
//! every remaining task and waits for its future to be dropped, which
//! releases all timers and subscriptions.

use core::cell::RefCell;
use core::time::Duration;
use std::rc::Rc;
use std::sync::Arc;

use chrono::NaiveDate;
use edge_executor::{LocalExecutor, Task};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use futures_lite::future;
use log::{debug, info, warn};
use serde_json::Value;

use crate::app::commands::CommandIntent;
use crate::app::ports::{Clock, EventSink, FieldStore, FieldSubscription, TaskPort};
use crate::app::service::FeederControlEngine;
use crate::app::state::{CanonicalState, EngineView};
use crate::config::EngineConfig;
use crate::dispatch::CommandDispatcher;
use crate::error::Error;
use crate::events::{EngineEvent, Mailbox};
use crate::paths::{self, Field};

/// Executor task slots.  Bootstrap, two tickers, one dismiss timer, and
/// headroom for dispatch/reset jobs.
const TASK_SLOTS: usize = 64;

type Executor = LocalExecutor<'static, TASK_SLOTS>;

/// Latest engine view, published after every handled event.
type SharedView = Mutex<CriticalSectionRawMutex, RefCell<EngineView>>;

// ───────────────────────────────────────────────────────────────
// EngineHandle (any thread)
// ───────────────────────────────────────────────────────────────

/// Cloneable, `Send` handle for operator surfaces.
#[derive(Clone)]
pub struct EngineHandle {
    mailbox: Arc<Mailbox>,
    view: Arc<SharedView>,
}

impl EngineHandle {
    /// Queue an operator command.  Fails if the mailbox is full.
    pub fn submit(&self, intent: CommandIntent) -> Result<(), Error> {
        self.post(EngineEvent::Command(intent))
    }

    /// Hide the current banner.
    pub fn dismiss_notification(&self) -> Result<(), Error> {
        self.post(EngineEvent::DismissNotification)
    }

    /// Ask the engine loop to stop.  The runtime cancels every task on exit.
    pub fn shutdown(&self) -> Result<(), Error> {
        self.post(EngineEvent::Shutdown)
    }

    /// Latest published view.
    pub fn view(&self) -> EngineView {
        self.view.lock(|v| v.borrow().clone())
    }

    fn post(&self, event: EngineEvent) -> Result<(), Error> {
        self.mailbox.try_send(event).map_err(|_| {
            warn!("Runtime: mailbox full, operator event dropped");
            Error::MailboxFull
        })
    }
}

// ───────────────────────────────────────────────────────────────
// FeederRuntime (engine thread)
// ───────────────────────────────────────────────────────────────

pub struct FeederRuntime<S, C, E>
where
    S: FieldStore + Clone + 'static,
    C: Clock,
    E: EventSink,
{
    engine: FeederControlEngine<C>,
    config: EngineConfig,
    store: S,
    sink: E,
    mailbox: Arc<Mailbox>,
    view: Arc<SharedView>,
}

impl<S, C, E> FeederRuntime<S, C, E>
where
    S: FieldStore + Clone + 'static,
    C: Clock,
    E: EventSink,
{
    pub fn new(config: EngineConfig, store: S, clock: C, sink: E) -> Self {
        let engine = FeederControlEngine::new(config.clone(), clock);
        let view = Arc::new(Mutex::new(RefCell::new(engine.view())));
        Self {
            engine,
            config,
            store,
            sink,
            mailbox: Arc::new(Channel::new()),
            view,
        }
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            mailbox: self.mailbox.clone(),
            view: self.view.clone(),
        }
    }

    /// Run until shutdown.  Blocks the calling thread.
    pub fn run(self) {
        let executor: Rc<Executor> = Rc::new(LocalExecutor::new());
        future::block_on(executor.run(self.drive(executor.clone())));
    }

    async fn drive(mut self, executor: Rc<Executor>) {
        let mut jobs = RuntimeTasks {
            executor: executor.clone(),
            store: self.store.clone(),
            mailbox: self.mailbox.clone(),
            dispatcher: CommandDispatcher::new(&self.config),
            dismiss: None,
            jobs: Vec::new(),
        };

        let services: [Task<()>; 3] = [
            executor.spawn(bootstrap(self.store.clone(), self.mailbox.clone())),
            executor.spawn(ticker(
                self.config.reset_check_interval(),
                EngineEvent::ResetCheckTick,
                self.mailbox.clone(),
            )),
            executor.spawn(ticker(
                self.config.stock_poll_interval(),
                EngineEvent::StockPollTick,
                self.mailbox.clone(),
            )),
        ];

        info!(
            "Runtime: started (reset check {}s, stock poll {}s)",
            self.config.reset_check_interval_secs, self.config.stock_poll_interval_secs
        );

        loop {
            let event = self.mailbox.receive().await;
            let flow = self.engine.handle(event, &mut jobs, &mut self.sink);
            jobs.prune();
            self.publish();
            if flow.is_break() {
                break;
            }
        }

        info!("Runtime: stopping, cancelling {} job(s)", jobs.jobs.len());
        for task in services {
            task.cancel().await;
        }
        jobs.cancel_all().await;
        info!("Runtime: stopped");
    }

    fn publish(&self) {
        let view = self.engine.view();
        self.view.lock(|v| *v.borrow_mut() = view);
    }
}

// ───────────────────────────────────────────────────────────────
// TaskPort implementation
// ───────────────────────────────────────────────────────────────

struct RuntimeTasks<S> {
    executor: Rc<Executor>,
    store: S,
    mailbox: Arc<Mailbox>,
    dispatcher: CommandDispatcher,
    /// At most one dismissal timer; replacing it cancels the old one.
    dismiss: Option<Task<()>>,
    /// Dispatch and reset-write jobs still running.
    jobs: Vec<Task<()>>,
}

impl<S: FieldStore + Clone + 'static> RuntimeTasks<S> {
    fn prune(&mut self) {
        self.jobs.retain(|t| !t.is_finished());
    }

    /// Cancel every job and the dismiss timer, waiting until each future
    /// has been dropped.
    async fn cancel_all(&mut self) {
        if let Some(timer) = self.dismiss.take() {
            timer.cancel().await;
        }
        for job in self.jobs.drain(..) {
            job.cancel().await;
        }
    }
}

impl<S: FieldStore + Clone + 'static> TaskPort for RuntimeTasks<S> {
    fn arm_dismiss_timer(&mut self, generation: u64, after: Duration) {
        let mailbox = self.mailbox.clone();
        self.dismiss = Some(self.executor.spawn(async move {
            async_io_mini::Timer::after(after).await;
            mailbox.send(EngineEvent::DismissExpired { generation }).await;
        }));
    }

    fn cancel_dismiss_timer(&mut self) {
        self.dismiss = None;
    }

    fn write_counter_reset(&mut self, date: NaiveDate) {
        let store = self.store.clone();
        let mailbox = self.mailbox.clone();
        self.jobs.push(self.executor.spawn(async move {
            let result = store.write(paths::DROPS_TODAY, Value::from(0)).await;
            mailbox.send(EngineEvent::ResetWritten { date, result }).await;
        }));
    }

    fn run_dispatch(&mut self, intent: CommandIntent, snapshot: CanonicalState) {
        let store = self.store.clone();
        let mailbox = self.mailbox.clone();
        let dispatcher = self.dispatcher;
        self.jobs.push(self.executor.spawn(async move {
            let result = dispatcher.dispatch(&store, intent, &snapshot).await;
            mailbox.send(EngineEvent::DispatchFinished { intent, result }).await;
        }));
    }
}

// ───────────────────────────────────────────────────────────────
// Tasks
// ───────────────────────────────────────────────────────────────

/// Initial snapshot read, then the three field subscriptions.
///
/// Subscriptions open only after `SnapshotLoaded` is queued, so the engine
/// is always Live before the first change event reaches it.
async fn bootstrap<S: FieldStore>(store: S, mailbox: Arc<Mailbox>) {
    let snapshot = store.read_once(paths::ROOT).await;
    if let Err(e) = &snapshot {
        warn!("Runtime: snapshot read failed: {}", e);
    }
    mailbox.send(EngineEvent::SnapshotLoaded(snapshot)).await;

    let [countdown, drops, stock] = Field::ALL.map(|f| pump(store.subscribe(f.path()), f, mailbox.clone()));
    future::zip(countdown, future::zip(drops, stock)).await;
    debug!("Runtime: all subscriptions closed");
}

/// Forward every change on one subscription into the mailbox.
async fn pump<T: FieldSubscription>(mut sub: T, field: Field, mailbox: Arc<Mailbox>) {
    while let Some(value) = sub.next_change().await {
        mailbox.send(EngineEvent::FieldChanged { field, value }).await;
    }
    info!("Runtime: subscription {} closed", field.path());
}

/// Post `event` every `period`.  The first tick fires one period after start.
async fn ticker(period: Duration, event: EngineEvent, mailbox: Arc<Mailbox>) {
    loop {
        async_io_mini::Timer::after(period).await;
        mailbox.send(event.clone()).await;
    }
}
