//! Engine configuration parameters
//!
//! Stock thresholds are calibrated against the feeder's distance sensor:
//! a *larger* reading means *less* food.  Everything else is timing and
//! dispatch tuning.  Values can be overridden from a JSON file.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Calibration points for the stock sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Largest plausible raw reading (sensor range).
    pub capacity: f64,
    /// Reading at or above which the container is empty.
    pub empty_threshold: f64,
    /// Reading at or below which the container is full.
    pub full_threshold: f64,
    /// Reading at or below which the "stock low" warning fires.
    pub low_threshold: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            capacity: 23.5,
            empty_threshold: 9.5,
            full_threshold: 3.2,
            low_threshold: 5.0,
        }
    }
}

impl ThresholdConfig {
    /// Check the ordering invariant `full < low < empty <= capacity`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let all = [
            self.capacity,
            self.empty_threshold,
            self.full_threshold,
            self.low_threshold,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::ValidationFailed("thresholds must be finite"));
        }
        if self.full_threshold >= self.low_threshold {
            return Err(ConfigError::ValidationFailed("full_threshold must be below low_threshold"));
        }
        if self.low_threshold >= self.empty_threshold {
            return Err(ConfigError::ValidationFailed("low_threshold must be below empty_threshold"));
        }
        if self.empty_threshold > self.capacity {
            return Err(ConfigError::ValidationFailed("empty_threshold exceeds capacity"));
        }
        Ok(())
    }
}

/// Core engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // --- Stock ---
    pub thresholds: ThresholdConfig,
    /// Manual feed is refused at or below this reading (no material).
    pub feed_safety_floor: f64,

    // --- Dispatch ---
    /// Extra attempts at the drop-counter increment after a feed was sent.
    pub feed_count_retries: u8,

    // --- Timing ---
    /// Daily reset check interval (seconds)
    pub reset_check_interval_secs: u32,
    /// Stock re-evaluation interval (seconds)
    pub stock_poll_interval_secs: u32,
    /// Transient notification lifetime (milliseconds)
    pub notification_dismiss_ms: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            feed_safety_floor: 0.5,

            feed_count_retries: 0,

            reset_check_interval_secs: 60, // 1/min
            stock_poll_interval_secs: 30,
            notification_dismiss_ms: 3000,
        }
    }
}

impl EngineConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;
        if !self.feed_safety_floor.is_finite() || self.feed_safety_floor < 0.0 {
            return Err(ConfigError::ValidationFailed("feed_safety_floor must be >= 0"));
        }
        if self.feed_safety_floor >= self.thresholds.empty_threshold {
            return Err(ConfigError::ValidationFailed("feed_safety_floor must be below empty_threshold"));
        }
        if self.feed_count_retries > 5 {
            return Err(ConfigError::ValidationFailed("feed_count_retries must be <= 5"));
        }
        if self.reset_check_interval_secs == 0 || self.reset_check_interval_secs > 3600 {
            return Err(ConfigError::ValidationFailed("reset_check_interval_secs must be 1..=3600"));
        }
        if self.stock_poll_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed("stock_poll_interval_secs must be > 0"));
        }
        if self.notification_dismiss_ms == 0 {
            return Err(ConfigError::ValidationFailed("notification_dismiss_ms must be > 0"));
        }
        Ok(())
    }

    pub fn reset_check_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.reset_check_interval_secs))
    }

    pub fn stock_poll_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.stock_poll_interval_secs))
    }

    pub fn notification_dismiss(&self) -> Duration {
        Duration::from_millis(u64::from(self.notification_dismiss_ms))
    }

    /// Parse and validate a JSON config.  Missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }
}
