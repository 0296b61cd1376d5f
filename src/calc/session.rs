//! Per-session calculator state

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Maximum number of history entries kept
pub const HISTORY_CAPACITY: usize = 50;

/// One successful evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Transcript as received
    pub input: String,
    /// Numeric result
    pub result: f64,
    /// Operation label (e.g. "suma")
    pub operation: String,
    /// When the evaluation happened
    pub timestamp: DateTime<Local>,
}

impl HistoryEntry {
    /// Create an entry stamped with the current local time
    #[must_use]
    pub fn now(input: impl Into<String>, result: f64, operation: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            result,
            operation: operation.into(),
            timestamp: Local::now(),
        }
    }
}

/// Mutable session state owned by the dispatcher
///
/// `last_result` and `history` only change together, through [`Self::record`],
/// or through the explicit clear and undo operations.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    last_result: f64,
    history: VecDeque<HistoryEntry>,
    paused: bool,
    continuous_mode: bool,
}

impl SessionState {
    /// Fresh state: last result 0, empty history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously persisted history
    ///
    /// Only the newest `HISTORY_CAPACITY` entries are kept. The last result
    /// still starts at 0.
    #[must_use]
    pub fn with_history(entries: impl IntoIterator<Item = HistoryEntry>) -> Self {
        let mut history: VecDeque<HistoryEntry> = entries.into_iter().collect();
        while history.len() > HISTORY_CAPACITY {
            history.pop_front();
        }
        Self {
            history,
            ..Self::default()
        }
    }

    /// Value of the most recent successful evaluation
    #[must_use]
    pub const fn last_result(&self) -> f64 {
        self.last_result
    }

    /// History, oldest first
    #[must_use]
    pub const fn history(&self) -> &VecDeque<HistoryEntry> {
        &self.history
    }

    /// Up to `count` newest entries, oldest first
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &HistoryEntry> {
        self.history
            .iter()
            .skip(self.history.len().saturating_sub(count))
    }

    /// Record a successful evaluation
    ///
    /// Updates the last result and appends to history, evicting the oldest
    /// entry once the cap is reached.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.last_result = entry.result;
        if self.history.len() >= HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(entry);
    }

    /// Empty the history, returning how many entries were removed
    pub fn clear_history(&mut self) -> usize {
        let removed = self.history.len();
        self.history.clear();
        removed
    }

    /// Reset the last result to 0
    pub const fn clear_result(&mut self) {
        self.last_result = 0.0;
    }

    /// Drop the newest entry and restore the previous result
    ///
    /// The last result becomes the value of the entry now at the end of the
    /// history, or 0 when the history is empty.
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        let removed = self.history.pop_back()?;
        self.last_result = self.history.back().map_or(0.0, |entry| entry.result);
        Some(removed)
    }

    /// Whether replies are muted
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Set the pause flag
    pub const fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Flip the pause flag, returning the new value
    pub const fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Whether continuous (wake word) listening is on
    #[must_use]
    pub const fn is_continuous(&self) -> bool {
        self.continuous_mode
    }

    /// Set continuous listening
    pub const fn set_continuous(&mut self, on: bool) {
        self.continuous_mode = on;
    }

    /// Flip continuous listening, returning the new value
    pub const fn toggle_continuous(&mut self) -> bool {
        self.continuous_mode = !self.continuous_mode;
        self.continuous_mode
    }
}
