//! Speech collaborators
//!
//! The calculator core never touches audio. Recognition and synthesis are
//! capabilities injected into the shell: a [`Listen`] source that yields
//! transcripts and a [`Speak`] sink that renders replies. Console versions
//! of both live in [`console`].

pub mod console;
mod wake_word;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use console::{ConsoleSpeaker, LineListener};
pub use wake_word::{FilterState, WakeDecision, WakeWordFilter};

use crate::Result;
use crate::config::SpeechConfig;

/// Why a listen attempt produced no transcript
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    /// Nothing was heard before the timeout
    #[error("listen timed out")]
    Timeout,

    /// Audio was captured but could not be understood
    #[error("speech not understood")]
    Unintelligible,

    /// The recognition service failed
    #[error("recognition service error: {0}")]
    Service(String),

    /// The input source is exhausted
    #[error("input closed")]
    Closed,
}

/// Source of transcripts
#[async_trait]
pub trait Listen: Send {
    /// Wait up to `timeout` for one utterance
    ///
    /// Transcripts are returned lower-cased.
    async fn listen(&mut self, timeout: Duration) -> std::result::Result<String, RecognitionError>;
}

/// Sink for spoken replies
#[async_trait]
pub trait Speak: Send {
    /// Render `text` using the current speech settings
    ///
    /// # Errors
    ///
    /// Returns error if the output cannot be written
    async fn speak(&mut self, text: &str, settings: &SpeechConfig) -> Result<()>;
}
