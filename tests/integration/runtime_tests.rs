//! End-to-end tests: FeederRuntime on its own thread against a MemoryStore.
//!
//! These use real reactor timers, so assertions poll the published view
//! with a generous deadline instead of sleeping a fixed amount.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use fishfeeder::adapters::log_sink::LogEventSink;
use fishfeeder::adapters::memory_store::MemoryStore;
use fishfeeder::adapters::time::SystemClock;
use fishfeeder::app::commands::CommandIntent;
use fishfeeder::app::ports::StoreError;
use fishfeeder::app::state::{EngineView, EnginePhase};
use fishfeeder::config::EngineConfig;
use fishfeeder::paths;
use fishfeeder::runtime::{EngineHandle, FeederRuntime};
use serde_json::json;

const DEADLINE: Duration = Duration::from_secs(5);

fn seeded_store() -> MemoryStore {
    MemoryStore::with_tree(json!({
        "data": { "countdown_remaining": 120 },
        "status": { "drops_today": 4, "stock_remaining": 6.0 },
        "commands": { "mode": 0, "countdown": 120 }
    }))
}

fn fast_config() -> EngineConfig {
    EngineConfig {
        notification_dismiss_ms: 100,
        ..EngineConfig::default()
    }
}

fn start(config: EngineConfig, store: &MemoryStore) -> (EngineHandle, JoinHandle<()>) {
    let runtime = FeederRuntime::new(config, store.clone(), SystemClock::new(), LogEventSink::new());
    let handle = runtime.handle();
    let engine = thread::spawn(move || runtime.run());
    (handle, engine)
}

fn stop(handle: &EngineHandle, engine: JoinHandle<()>) {
    handle.shutdown().unwrap();
    engine.join().unwrap();
}

fn wait_for(handle: &EngineHandle, what: &str, pred: impl Fn(&EngineView) -> bool) -> EngineView {
    let start = Instant::now();
    loop {
        let view = handle.view();
        if pred(&view) {
            return view;
        }
        assert!(start.elapsed() < DEADLINE, "timed out waiting for {what}: {view:?}");
        thread::sleep(Duration::from_millis(10));
    }
}

fn wait_for_store(store: &MemoryStore, path: &str, expected: serde_json::Value) {
    let start = Instant::now();
    while store.get(path) != Some(expected.clone()) {
        assert!(start.elapsed() < DEADLINE, "timed out waiting for {path} = {expected}");
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn bootstraps_from_snapshot_and_follows_subscriptions() {
    let store = seeded_store();
    let (handle, engine) = start(fast_config(), &store);

    let view = wait_for(&handle, "live phase", |v| v.phase == EnginePhase::Live);
    assert_eq!(view.state.drops_today, 4);
    assert_eq!(view.display_percent, 56);

    store.set(paths::DROPS_TODAY, json!(5));
    wait_for(&handle, "drops update", |v| v.state.drops_today == 5);

    store.set(paths::STOCK_REMAINING, json!(12.0));
    let view = wait_for(&handle, "empty banner", |v| v.notification.is_visible());
    assert_eq!(view.notification.text.as_str(), "Container empty");
    assert!(view.notification.persistent);

    stop(&handle, engine);
}

#[test]
fn manual_feed_reaches_the_store() {
    let store = seeded_store();
    let (handle, engine) = start(fast_config(), &store);
    wait_for(&handle, "live phase", |v| v.phase == EnginePhase::Live);

    handle.submit(CommandIntent::ManualFeed).unwrap();
    wait_for_store(&store, paths::COMMAND_MODE, json!(1));
    wait_for_store(&store, paths::DROPS_TODAY, json!(5));

    wait_for(&handle, "feed settled", |v| {
        v.dispatches_in_flight == 0 && v.state.drops_today == 5
    });

    stop(&handle, engine);
}

#[test]
fn transient_banner_auto_dismisses() {
    let store = seeded_store();
    let (handle, engine) = start(fast_config(), &store);
    wait_for(&handle, "live phase", |v| v.phase == EnginePhase::Live);

    handle.submit(CommandIntent::Flush).unwrap();
    let view = wait_for(&handle, "flush banner", |v| v.notification.is_visible());
    assert_eq!(view.notification.text.as_str(), "Flushing");

    let view = wait_for(&handle, "auto dismissal", |v| !v.notification.is_visible());
    assert_eq!(view.notification.text.as_str(), "Flushing", "text kept after dismissal");

    stop(&handle, engine);
}

#[test]
fn failed_snapshot_still_goes_live() {
    let store = seeded_store();
    store.fail_reads(Some(StoreError::Timeout));
    let (handle, engine) = start(fast_config(), &store);

    let view = wait_for(&handle, "live phase", |v| v.phase == EnginePhase::Live);
    assert_eq!(
        view.notification.text.as_str(),
        "Could not load feeder data: timed out"
    );

    // Subscriptions still deliver the current values afterwards.
    wait_for(&handle, "subscribed drops", |v| v.state.drops_today == 4);

    stop(&handle, engine);
}

#[test]
fn daily_reset_zeroes_remote_counter() {
    let store = seeded_store();
    let config = EngineConfig {
        reset_check_interval_secs: 1,
        ..fast_config()
    };
    let (handle, engine) = start(config, &store);

    wait_for_store(&store, paths::DROPS_TODAY, json!(0));
    let view = wait_for(&handle, "local reset", |v| v.state.last_reset_date.is_some());
    assert_eq!(view.state.drops_today, 0);

    stop(&handle, engine);
}

#[test]
fn shutdown_releases_subscriptions() {
    let store = seeded_store();
    let (handle, engine) = start(fast_config(), &store);
    wait_for(&handle, "live phase", |v| v.phase == EnginePhase::Live);

    let start = Instant::now();
    while store.subscriber_count() < 3 {
        assert!(start.elapsed() < DEADLINE, "subscriptions never opened");
        thread::sleep(Duration::from_millis(10));
    }

    stop(&handle, engine);
    assert_eq!(store.subscriber_count(), 0);
}
