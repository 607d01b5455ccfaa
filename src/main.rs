//! FishFeeder operator console.
//!
//! Drives the control engine against an in-process store seeded with a
//! demo feeder, plus a simulated device that consumes commands and counts
//! down to scheduled feeds.
//!
//! ```text
//!  stdin thread ──▶ EngineHandle ──▶ ┌──────────────────┐
//!                                    │  engine thread   │
//!  device thread ──▶ MemoryStore ◀──▶│  FeederRuntime   │
//!                                    └──────────────────┘
//! ```
//!
//! Usage: `fishfeeder [config.json]`, then type `help`.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use serde_json::json;

use fishfeeder::adapters::log_sink::LogEventSink;
use fishfeeder::adapters::memory_store::MemoryStore;
use fishfeeder::adapters::sim_device::SimulatedFeeder;
use fishfeeder::adapters::time::SystemClock;
use fishfeeder::app::commands::CommandIntent;
use fishfeeder::config::EngineConfig;
use fishfeeder::error::Error;
use fishfeeder::runtime::{EngineHandle, FeederRuntime};

// ── Console commands ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum ConsoleCommand {
    Intent(CommandIntent),
    Dismiss,
    Refill,
    Status,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let mut words = line.split_whitespace();
    let cmd = match words.next() {
        Some("feed") => ConsoleCommand::Intent(CommandIntent::ManualFeed),
        Some("flush") => ConsoleCommand::Intent(CommandIntent::Flush),
        Some("interval") => {
            let arg = words.next().ok_or("usage: interval <secs>")?;
            let seconds = arg.parse::<u64>().map_err(|_| format!("not a number: {arg}"))?;
            ConsoleCommand::Intent(CommandIntent::SetInterval { seconds })
        }
        Some("dismiss") => ConsoleCommand::Dismiss,
        Some("refill") => ConsoleCommand::Refill,
        Some("status") => ConsoleCommand::Status,
        Some("help") => ConsoleCommand::Help,
        Some("quit" | "exit") => ConsoleCommand::Quit,
        Some(other) => return Err(format!("unknown command: {other}")),
        None => return Err(String::new()),
    };
    Ok(cmd)
}

const HELP: &str = "commands: feed | flush | interval <secs> | dismiss | refill | status | quit";

fn print_status(handle: &EngineHandle) {
    let v = handle.view();
    println!(
        "phase={:?} countdown={}s drops_today={} stock={:.2} food={}% in_flight={}",
        v.phase,
        v.state.countdown_remaining_secs,
        v.state.drops_today,
        v.state.stock_remaining,
        v.display_percent,
        v.dispatches_in_flight
    );
    if v.notification.is_visible() {
        println!("banner: {}", v.notification.text);
    }
}

/// Read operator lines until `quit` or EOF.
fn console_loop(handle: &EngineHandle, mut device: SimulatedFeeder, refill_reading: f64) {
    println!("{HELP}");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let cmd = match parse_command(&line) {
            Ok(cmd) => cmd,
            Err(msg) if msg.is_empty() => continue,
            Err(msg) => {
                println!("{msg}");
                continue;
            }
        };
        let posted = match cmd {
            ConsoleCommand::Intent(intent) => handle.submit(intent),
            ConsoleCommand::Dismiss => handle.dismiss_notification(),
            ConsoleCommand::Refill => {
                device.refill(refill_reading);
                Ok(())
            }
            ConsoleCommand::Status => {
                print_status(handle);
                Ok(())
            }
            ConsoleCommand::Help => {
                println!("{HELP}");
                Ok(())
            }
            ConsoleCommand::Quit => break,
        };
        if let Err(e) = posted {
            println!("engine busy: {e}");
        }
    }
}

// ── Config ────────────────────────────────────────────────────

fn load_config(path: &str) -> Result<EngineConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let config = EngineConfig::from_json(&text)
        .map_err(Error::from)
        .with_context(|| format!("parsing {path}"))?;
    Ok(config)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("FishFeeder console v{}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => match load_config(&path) {
            Ok(cfg) => {
                info!("Config loaded from {}", path);
                cfg
            }
            Err(e) => {
                warn!("Config load failed ({:#}), using defaults", e);
                EngineConfig::default()
            }
        },
        None => EngineConfig::default(),
    };

    let store = MemoryStore::with_tree(json!({
        "data": { "countdown_remaining": 120 },
        "status": { "drops_today": 0, "stock_remaining": 6.0 },
        "commands": { "mode": 0, "countdown": 120 }
    }));

    let runtime = FeederRuntime::new(config.clone(), store.clone(), SystemClock::new(), LogEventSink::new());
    let handle = runtime.handle();
    let engine = thread::Builder::new()
        .name("engine".into())
        .spawn(move || runtime.run())
        .context("spawning engine thread")?;

    let stop = Arc::new(AtomicBool::new(false));
    let device = thread::Builder::new()
        .name("sim-device".into())
        .spawn({
            let feeder = SimulatedFeeder::new(store.clone(), config.thresholds.capacity);
            let stop = stop.clone();
            move || feeder.run(stop)
        })
        .context("spawning device thread")?;

    let console = thread::Builder::new()
        .name("console".into())
        .spawn({
            let handle = handle.clone();
            let feeder = SimulatedFeeder::new(store.clone(), config.thresholds.capacity);
            let refill = config.thresholds.full_threshold;
            move || console_loop(&handle, feeder, refill)
        })
        .context("spawning console thread")?;

    if console.join().is_err() {
        warn!("Console thread panicked");
    }

    info!("Shutting down");
    while handle.shutdown().is_err() && !engine.is_finished() {
        thread::sleep(Duration::from_millis(10));
    }
    stop.store(true, Ordering::Relaxed);
    if engine.join().is_err() {
        warn!("Engine thread panicked");
    }
    store.close();
    if device.join().is_err() {
        warn!("Device thread panicked");
    }
    info!("Final state: {:?}", handle.view().state);
    Ok(())
}
