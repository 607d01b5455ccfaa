//! Unified error types for the feeder engine.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! runtime's error reporting uniform.  All variants are `Copy` so they can be
//! carried through the mailbox and into notifications without allocation.
//!
//! None of these are fatal: the engine surfaces each one as a notification
//! and keeps running.

use core::fmt;

use crate::app::ports::StoreError;

// ---------------------------------------------------------------------------
// Top-level engine error
// ---------------------------------------------------------------------------

/// Every fallible engine operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The initial snapshot read failed; the engine runs on zero values.
    Initialization(StoreError),
    /// A store write or increment failed.
    Write(StoreError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// The engine mailbox is full or the engine has stopped.
    MailboxFull,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialization(e) => write!(f, "initialization: {e}"),
            Self::Write(e) => write!(f, "write: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::MailboxFull => write!(f, "engine mailbox full"),
        }
    }
}

impl core::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Dispatch errors
// ---------------------------------------------------------------------------

/// Why a guard refused a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// Stock reading at or above the empty threshold.
    ContainerEmpty,
    /// Stock reading at or below the safety floor.
    NoMaterial,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainerEmpty => write!(f, "container is empty"),
            Self::NoMaterial => write!(f, "no feed material detected"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// A guard condition prevented the command.  Nothing was written.
    Blocked(BlockReason),
    /// `SetInterval` with zero seconds.
    InvalidInterval,
    /// A command write failed.  `path` is the field that was not written.
    WriteFailed { path: &'static str, cause: StoreError },
    /// The feed command was written but the drop counter increment failed.
    /// The feed happened; the daily count is under-reported by one.
    FeedCountNotRecorded(StoreError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocked(reason) => write!(f, "blocked: {reason}"),
            Self::InvalidInterval => write!(f, "interval must be greater than zero"),
            Self::WriteFailed { path, cause } => write!(f, "write to {path} failed: {cause}"),
            Self::FeedCountNotRecorded(cause) => {
                write!(f, "feed sent but drop count not recorded: {cause}")
            }
        }
    }
}

impl core::error::Error for DispatchError {}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Config text failed to deserialize.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl core::error::Error for ConfigError {}
