//! Wake word filtering for continuous mode
//!
//! In continuous mode every utterance is heard, but only those addressed to
//! the calculator are acted on. A wake word either prefixes the command
//! ("calculadora, cinco más tres") or arms the filter so the next utterance
//! is taken as the command.

use regex::Regex;

/// State of the wake word filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    /// Waiting for a wake word
    Idle,
    /// Wake word heard on its own; next utterance is the command
    Armed,
}

/// What to do with one transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WakeDecision {
    /// Not addressed to the calculator
    Ignore,
    /// Wake word alone; wait for the command
    Armed,
    /// Dispatch this command text
    Command(String),
}

/// Detects and strips wake words in transcripts
#[derive(Debug)]
pub struct WakeWordFilter {
    wake_words: Vec<String>,
    patterns: Vec<Regex>,
    state: FilterState,
}

impl WakeWordFilter {
    /// Create a filter for the given wake words
    ///
    /// Words are lower-cased, trimmed and deduplicated; longer phrases are
    /// tried first so "oye calculadora" is stripped whole rather than leaving
    /// "oye". A wake word only matches as whole words.
    #[must_use]
    pub fn new(wake_words: &[String]) -> Self {
        let mut normalized: Vec<String> = wake_words
            .iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        normalized.sort();
        normalized.dedup();
        normalized.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));

        let mut kept = Vec::with_capacity(normalized.len());
        let mut patterns = Vec::with_capacity(normalized.len());
        for word in normalized {
            match Regex::new(&format!(r"\b{}\b", regex::escape(&word))) {
                Ok(pattern) => {
                    kept.push(word);
                    patterns.push(pattern);
                }
                Err(e) => tracing::warn!(wake_word = %word, error = %e, "skipping wake word"),
            }
        }

        tracing::debug!(wake_words = ?kept, "wake word filter initialized");

        Self {
            wake_words: kept,
            patterns,
            state: FilterState::Idle,
        }
    }

    /// Decide what to do with a transcript
    pub fn filter(&mut self, transcript: &str) -> WakeDecision {
        let normalized = transcript.trim().to_lowercase();

        if self.state == FilterState::Armed {
            self.reset();
            let command = self.strip(&normalized).unwrap_or(normalized);
            return if command.is_empty() {
                WakeDecision::Ignore
            } else {
                WakeDecision::Command(command)
            };
        }

        match self.strip(&normalized) {
            Some(rest) if rest.is_empty() => {
                tracing::info!(transcript = %normalized, "wake word detected");
                self.state = FilterState::Armed;
                WakeDecision::Armed
            }
            Some(rest) => {
                tracing::info!(transcript = %normalized, "wake word detected");
                WakeDecision::Command(rest)
            }
            None => WakeDecision::Ignore,
        }
    }

    /// Remove the first wake word found, returning the remaining command
    fn strip(&self, text: &str) -> Option<String> {
        self.patterns.iter().find_map(|pattern| {
            pattern.find(text).map(|found| {
                let before = &text[..found.start()];
                let after = &text[found.end()..];
                format!("{before} {after}")
                    .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | '!'))
                    .to_string()
            })
        })
    }

    /// Return to idle
    pub const fn reset(&mut self) {
        self.state = FilterState::Idle;
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> FilterState {
        self.state
    }

    /// Check if the next utterance will be taken as a command
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.state == FilterState::Armed
    }

    /// Configured wake words, longest first
    #[must_use]
    pub fn wake_words(&self) -> &[String] {
        &self.wake_words
    }
}
