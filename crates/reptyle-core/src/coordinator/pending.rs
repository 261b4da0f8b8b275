//! Single-slot holder for the filename of the next intercepted download.

use std::sync::Mutex;

/// Observable state of a [`PendingSlot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    Pending(String),
}

/// Holds at most one filename waiting for the next download-start event.
///
/// No queueing: a second `set` before a download starts discards the first
/// value. `take` empties the slot, so each `set` is honored at most once.
#[derive(Debug, Default)]
pub struct PendingSlot {
    inner: Mutex<Option<String>>,
}

impl PendingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `filename`, returning the value it replaced (if any).
    pub fn set(&self, filename: String) -> Option<String> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let previous = guard.replace(filename);
        if let Some(prev) = &previous {
            tracing::warn!(discarded = %prev, "pending filename overwritten before any download started");
        }
        previous
    }

    /// Removes and returns the pending filename.
    pub fn take(&self) -> Option<String> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    pub fn peek(&self) -> Option<String> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn state(&self) -> SlotState {
        match self.peek() {
            Some(name) => SlotState::Pending(name),
            None => SlotState::Idle,
        }
    }

    /// Puts back a value read earlier with [`peek`](Self::peek), undoing any
    /// change since. No overwrite warning is logged.
    pub fn restore(&self, previous: Option<String>) {
        tracing::debug!(restored = ?previous, "pending filename rolled back");
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        assert_eq!(PendingSlot::new().state(), SlotState::Idle);
    }

    #[test]
    fn set_overwrites_and_reports_previous() {
        let slot = PendingSlot::new();
        assert_eq!(slot.set("a.mp4".into()), None);
        assert_eq!(slot.set("b.mp4".into()), Some("a.mp4".into()));
        assert_eq!(slot.state(), SlotState::Pending("b.mp4".into()));
    }

    #[test]
    fn take_consumes_once() {
        let slot = PendingSlot::new();
        slot.set("a.mp4".into());
        assert_eq!(slot.take(), Some("a.mp4".into()));
        assert_eq!(slot.take(), None);
        assert_eq!(slot.state(), SlotState::Idle);
    }

    #[test]
    fn restore_undoes_later_changes() {
        let slot = PendingSlot::new();
        slot.set("a.mp4".into());
        let before = slot.peek();
        slot.set("b.mp4".into());
        slot.restore(before);
        assert_eq!(slot.state(), SlotState::Pending("a.mp4".into()));
        slot.restore(None);
        assert_eq!(slot.state(), SlotState::Idle);
    }
}
