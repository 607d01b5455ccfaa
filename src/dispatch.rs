//! Operator command dispatch.
//!
//! Validates a [`CommandIntent`] against a snapshot of [`CanonicalState`]
//! and writes the matching command fields to the store.
//!
//! | intent          | guard                           | writes                                          |
//! |-----------------|---------------------------------|-------------------------------------------------|
//! | `ManualFeed`    | not empty, above safety floor   | `commands/mode = 1`, `status/drops_today += 1`  |
//! | `Flush`         | none                            | `commands/mode = 2`                             |
//! | `SetInterval`   | `seconds > 0`                   | `commands/countdown`, `data/countdown_remaining`|
//!
//! The feed command and the counter increment are not transactional: once
//! the mode write lands the device may already have dropped food, so a
//! failed increment is reported but the mode write is never rolled back.

use log::{info, warn};
use serde_json::Value;

use crate::app::commands::CommandIntent;
use crate::app::ports::FieldStore;
use crate::app::state::CanonicalState;
use crate::config::{EngineConfig, ThresholdConfig};
use crate::error::{BlockReason, DispatchError};
use crate::paths;

/// What a successful dispatch changed, for the engine to mirror locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchReceipt {
    /// Feed command written and drop counter incremented.
    Fed,
    /// Flush command written.
    Flushing,
    /// Interval written and mirrored into the live countdown.
    IntervalSet { seconds: u64 },
}

#[derive(Debug, Clone, Copy)]
pub struct CommandDispatcher {
    thresholds: ThresholdConfig,
    safety_floor: f64,
    feed_count_retries: u8,
}

impl CommandDispatcher {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            thresholds: config.thresholds,
            safety_floor: config.feed_safety_floor,
            feed_count_retries: config.feed_count_retries,
        }
    }

    /// Guard check only; never touches the store.
    pub fn check(&self, intent: CommandIntent, state: &CanonicalState) -> Result<(), DispatchError> {
        match intent {
            CommandIntent::ManualFeed => {
                if state.stock_remaining >= self.thresholds.empty_threshold {
                    return Err(DispatchError::Blocked(BlockReason::ContainerEmpty));
                }
                if state.stock_remaining <= self.safety_floor {
                    return Err(DispatchError::Blocked(BlockReason::NoMaterial));
                }
                Ok(())
            }
            CommandIntent::Flush => Ok(()),
            CommandIntent::SetInterval { seconds } => {
                if seconds == 0 {
                    Err(DispatchError::InvalidInterval)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Validate `intent` against `state` and write it to the store.
    pub async fn dispatch<S: FieldStore>(
        &self,
        store: &S,
        intent: CommandIntent,
        state: &CanonicalState,
    ) -> Result<DispatchReceipt, DispatchError> {
        self.check(intent, state)?;

        match intent {
            CommandIntent::ManualFeed => {
                write_field(store, paths::COMMAND_MODE, Value::from(paths::MODE_MANUAL_FEED)).await?;
                self.record_drop(store).await?;
                info!("Dispatch: manual feed sent");
                Ok(DispatchReceipt::Fed)
            }
            CommandIntent::Flush => {
                write_field(store, paths::COMMAND_MODE, Value::from(paths::MODE_FLUSH)).await?;
                info!("Dispatch: flush sent");
                Ok(DispatchReceipt::Flushing)
            }
            CommandIntent::SetInterval { seconds } => {
                write_field(store, paths::COMMAND_COUNTDOWN, Value::from(seconds)).await?;
                write_field(store, paths::COUNTDOWN_REMAINING, Value::from(seconds)).await?;
                info!("Dispatch: interval set to {}s", seconds);
                Ok(DispatchReceipt::IntervalSet { seconds })
            }
        }
    }

    // ── Internal ──────────────────────────────────────────────

    async fn record_drop<S: FieldStore>(&self, store: &S) -> Result<(), DispatchError> {
        let mut attempt = 0;
        loop {
            match store.increment(paths::DROPS_TODAY, 1).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.feed_count_retries => {
                    attempt += 1;
                    warn!("Dispatch: drop count increment failed ({}), retry {}", e, attempt);
                }
                Err(e) => {
                    warn!("Dispatch: feed sent but drop count not recorded: {}", e);
                    return Err(DispatchError::FeedCountNotRecorded(e));
                }
            }
        }
    }
}

async fn write_field<S: FieldStore>(store: &S, path: &'static str, value: Value) -> Result<(), DispatchError> {
    store.write(path, value).await.map_err(|cause| {
        warn!("Dispatch: write to {} failed: {}", path, cause);
        DispatchError::WriteFailed { path, cause }
    })
}
