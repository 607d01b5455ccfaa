//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements             | Connects to                  |
//! |----------------|------------------------|------------------------------|
//! | `log_sink`     | EventSink              | `log` facade                 |
//! | `memory_store` | FieldStore             | In-process JSON tree         |
//! | `time`         | Clock                  | `Instant` + local calendar   |
//! | `sim_device`   | (store peer)           | Simulated feeder hardware    |

pub mod log_sink;
pub mod memory_store;
pub mod sim_device;
pub mod time;
