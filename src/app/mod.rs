//! Application core: pure domain logic, zero I/O.
//!
//! This module holds the business rules for the feeder control engine:
//! canonical state, event handling, and command orchestration.  All
//! interaction with the store, the clock, and the async runtime happens
//! through **port traits** defined in [`ports`], so this layer is testable
//! without a network or real timers.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod state;
