//! Inbound operator commands.
//!
//! These represent actions requested from the presentation layer that the
//! [`CommandDispatcher`](crate::dispatch::CommandDispatcher) validates and
//! forwards to the feeder through the shared store.

/// Operator intents.  Consumed immediately; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandIntent {
    /// Drop one portion of food now.
    ManualFeed,

    /// Run the flush cycle.
    Flush,

    /// Change the feed interval.  `seconds` must be positive.
    SetInterval { seconds: u64 },
}

impl CommandIntent {
    /// Short operator-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ManualFeed => "feed",
            Self::Flush => "flush",
            Self::SetInterval { .. } => "interval",
        }
    }
}
