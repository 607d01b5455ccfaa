//! Advisory banner state with timed auto-dismissal.
//!
//! ## Dismissal lifecycle
//!
//! 1. `show_transient` bumps the generation counter and returns a
//!    [`DismissTicket`] carrying the new generation.
//! 2. The runtime arms a timer for `ticket.after`.
//! 3. When the timer fires, [`NotificationCenter::expire`] is called with
//!    the captured generation.  If anything was shown since, the
//!    generations differ and the call is a no-op.
//!
//! `show_persistent` and `dismiss` also bump the generation, so any
//! outstanding timer goes stale.  Newest call always wins.

use core::time::Duration;

use heapless::String;

/// Maximum banner length in bytes; longer text is truncated.
pub const TEXT_CAPACITY: usize = 96;

/// Banner severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Success,
}

/// The banner as the presentation layer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationState {
    /// Last shown text.  Kept after dismissal.
    pub text: String<TEXT_CAPACITY>,
    /// `None` while the banner is hidden.
    pub severity: Option<Severity>,
    pub persistent: bool,
    /// Uptime (ms) at which the current banner was shown.
    pub active_since: Option<u64>,
}

impl NotificationState {
    /// True while a banner is on screen.
    pub fn is_visible(&self) -> bool {
        self.severity.is_some()
    }
}

/// Returned by [`NotificationCenter::show_transient`]; the runtime arms a
/// timer for `after` and calls `expire(generation)` when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DismissTicket {
    pub generation: u64,
    pub after: Duration,
}

pub struct NotificationCenter {
    current: NotificationState,
    generation: u64,
    dismiss_after: Duration,
}

impl NotificationCenter {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            current: NotificationState::default(),
            generation: 0,
            dismiss_after,
        }
    }

    /// Show a banner that hides itself after the configured delay.
    pub fn show_transient(&mut self, text: &str, severity: Severity, now_ms: u64) -> DismissTicket {
        self.replace(text, severity, false, now_ms);
        DismissTicket {
            generation: self.generation,
            after: self.dismiss_after,
        }
    }

    /// Show a banner that stays until dismissed or superseded.
    pub fn show_persistent(&mut self, text: &str, severity: Severity, now_ms: u64) {
        self.replace(text, severity, true, now_ms);
    }

    /// Hide the banner.  Idempotent.
    pub fn dismiss(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.current.severity = None;
        self.current.persistent = false;
        self.current.active_since = None;
    }

    /// Auto-dismiss timer callback.  Returns `true` if the banner was hidden.
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation || !self.current.is_visible() {
            return false;
        }
        self.current.severity = None;
        self.current.active_since = None;
        true
    }

    pub fn current(&self) -> &NotificationState {
        &self.current
    }

    // ── Internal ──────────────────────────────────────────────

    fn replace(&mut self, text: &str, severity: Severity, persistent: bool, now_ms: u64) {
        self.generation = self.generation.wrapping_add(1);
        self.current = NotificationState {
            text: fit(text),
            severity: Some(severity),
            persistent,
            active_since: Some(now_ms),
        };
    }
}

/// Copy `text` into a fixed-capacity string, cutting at a char boundary.
fn fit(text: &str) -> String<TEXT_CAPACITY> {
    let mut out = String::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}
