//! FishFeeder control and notification engine.
//!
//! Keeps a live view of a remote fish feeder's state (countdown, daily
//! drop count, stock level), turns stock readings into operator
//! notifications, resets the daily counter at local midnight, and relays
//! operator commands to the device through a shared key/value store.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │   MemoryStore (FieldStore)  SystemClock  LogEventSink        │
//! │                                                              │
//! │  ────────────────── Port Trait Boundary ───────────────────  │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │          FeederControlEngine (pure logic)              │  │
//! │  │  Policy · Notifications · Daily reset · Dispatch guard │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  FeederRuntime (mailbox loop, timers, store jobs)            │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod notify;
pub mod paths;
pub mod policy;
pub mod runtime;
pub mod scheduler;
