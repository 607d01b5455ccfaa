//! Simulated feeder device.
//!
//! Plays the hardware side of the shared store for the operator console:
//! picks up `commands/mode`, counts down `data/countdown_remaining`, and
//! drifts `status/stock_remaining` towards empty as portions drop.
//!
//! Not part of the engine; it only talks to a [`MemoryStore`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{debug, info};
use serde_json::Value;

use super::memory_store::MemoryStore;
use crate::paths;

/// Sensor units added to the stock reading per dropped portion.
const PORTION: f64 = 0.35;
/// Interval used when `commands/countdown` was never set.
const DEFAULT_INTERVAL_SECS: u64 = 4 * 3600;

pub struct SimulatedFeeder {
    store: MemoryStore,
    capacity: f64,
}

impl SimulatedFeeder {
    pub fn new(store: MemoryStore, capacity: f64) -> Self {
        Self { store, capacity }
    }

    /// Advance the device by `elapsed_secs`.
    pub fn step(&mut self, elapsed_secs: u64) {
        match self.read_u64(paths::COMMAND_MODE) {
            Some(m) if m == paths::MODE_MANUAL_FEED as u64 => {
                info!("SimDevice: manual feed");
                self.drop_portion();
                self.store.set(paths::COMMAND_MODE, Value::from(0));
            }
            Some(m) if m == paths::MODE_FLUSH as u64 => {
                info!("SimDevice: flush cycle");
                self.store.set(paths::COMMAND_MODE, Value::from(0));
            }
            _ => {}
        }

        let remaining = self.read_u64(paths::COUNTDOWN_REMAINING).unwrap_or(0);
        if remaining > elapsed_secs {
            self.store
                .set(paths::COUNTDOWN_REMAINING, Value::from(remaining - elapsed_secs));
            return;
        }

        info!("SimDevice: scheduled feed");
        self.drop_portion();
        let drops = self.read_u64(paths::DROPS_TODAY).unwrap_or(0);
        self.store.set(paths::DROPS_TODAY, Value::from(drops + 1));
        let interval = self
            .read_u64(paths::COMMAND_COUNTDOWN)
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_INTERVAL_SECS);
        self.store.set(paths::COUNTDOWN_REMAINING, Value::from(interval));
    }

    /// Top the container back up.
    pub fn refill(&mut self, reading: f64) {
        info!("SimDevice: refilled");
        self.store.set(paths::STOCK_REMAINING, Value::from(reading));
    }

    /// Step once a second until `stop` is raised.
    pub fn run(mut self, stop: Arc<AtomicBool>) {
        while !stop.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_secs(1));
            self.step(1);
        }
        debug!("SimDevice: stopped");
    }

    fn drop_portion(&mut self) {
        let stock = self
            .store
            .get(paths::STOCK_REMAINING)
            .as_ref()
            .and_then(paths::as_number)
            .unwrap_or(0.0);
        let next = (stock + PORTION).min(self.capacity);
        self.store.set(paths::STOCK_REMAINING, Value::from(next));
    }

    fn read_u64(&self, path: &str) -> Option<u64> {
        self.store.get(path).as_ref().and_then(paths::as_count)
    }
}
