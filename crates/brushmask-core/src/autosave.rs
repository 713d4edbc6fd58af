//! Autosave bookkeeping for annotations that own mask regions.
//!
//! Drawing a stroke pauses autosave so a half-drawn region is never
//! serialized. Pauses nest; saving is allowed again once every pause has been
//! matched by a resume.

use crate::host::AnnotationHost;
use std::cell::Cell;
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Tracks whether an annotation may be autosaved.
#[derive(Debug)]
pub struct AutosaveState {
    /// Auto-save interval.
    interval: Duration,
    /// Last save timestamp.
    last_save: Cell<Option<Instant>>,
    /// Whether the annotation has unsaved changes.
    dirty: Cell<bool>,
    /// Number of outstanding pauses.
    paused: Cell<u32>,
    /// Set when autosave resumes; the host saves on its next tick.
    save_requested: Cell<bool>,
}

impl Default for AutosaveState {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS))
    }
}

impl AutosaveState {
    /// Create autosave state with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_save: Cell::new(None),
            dirty: Cell::new(false),
            paused: Cell::new(0),
            save_requested: Cell::new(false),
        }
    }

    /// Get the auto-save interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Mark the annotation as having unsaved changes.
    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Check if autosave is currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused.get() > 0
    }

    /// Check if a save should run now (dirty, not paused, interval elapsed or resumed).
    pub fn should_save(&self) -> bool {
        if !self.dirty.get() || self.is_paused() {
            return false;
        }
        if self.save_requested.get() {
            return true;
        }
        match self.last_save.get() {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Record that the host saved the annotation.
    pub fn record_save(&self) {
        self.last_save.set(Some(Instant::now()));
        self.dirty.set(false);
        self.save_requested.set(false);
    }
}

impl AnnotationHost for AutosaveState {
    fn pause_autosave(&self) {
        self.paused.set(self.paused.get() + 1);
    }

    fn start_autosave(&self) {
        match self.paused.get() {
            0 => log::warn!("Autosave resumed without a matching pause"),
            1 => {
                self.paused.set(0);
                // Drawing changed the annotation; save on the next tick.
                self.dirty.set(true);
                self.save_requested.set(true);
            }
            n => self.paused.set(n - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::AutosavePause;

    #[test]
    fn test_autosave_dirty_flag() {
        let state = AutosaveState::default();
        assert!(!state.should_save());
        state.mark_dirty();
        assert!(state.should_save());
        state.record_save();
        assert!(!state.is_dirty());
        assert!(!state.should_save());
    }

    #[test]
    fn test_pause_blocks_save() {
        let state = AutosaveState::default();
        state.mark_dirty();
        {
            let _pause = AutosavePause::new(&state);
            assert!(state.is_paused());
            assert!(!state.should_save());
        }
        assert!(!state.is_paused());
        assert!(state.should_save());
    }

    #[test]
    fn test_nested_pauses() {
        let state = AutosaveState::new(Duration::from_secs(3600));
        state.record_save();
        let outer = AutosavePause::new(&state);
        let inner = AutosavePause::new(&state);
        drop(inner);
        assert!(state.is_paused());
        drop(outer);
        assert!(!state.is_paused());
        // Resume requests a save even though the interval has not elapsed.
        assert!(state.should_save());
    }

    #[test]
    fn test_unmatched_resume_is_ignored() {
        let state = AutosaveState::default();
        state.start_autosave();
        assert!(!state.is_paused());
        assert!(!state.is_dirty());
    }
}
