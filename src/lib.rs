//! Calculadora por voz - spoken Spanish arithmetic
//!
//! Turns a recognized transcript such as "raíz cuadrada de dieciséis" into a
//! computed value and a Spanish reply, while keeping a running result and a
//! bounded history.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Collaborators                       │
//! │        Listen (transcripts)  │  Speak (replies)      │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                     Shell                            │
//! │   Listener task  │  Wake words  │  Pause  │  Persist │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Calculator core                      │
//! │  Normalize  │  Classify  │  Rule table  │  Format    │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod calc;
pub mod config;
pub mod error;
pub mod history;
pub mod shell;
pub mod voice;

pub use calc::{
    Classification, CommandDispatcher, CommandTag, HistoryEntry, InvalidReason, MatchOutcome,
    OperationKind, OperationMatcher, Outcome, SessionState, classify, format_result,
    handle_recognition_error, handle_transcript, normalize,
};
pub use config::Config;
pub use error::{Error, Result};
pub use history::HistoryStore;
pub use shell::{Flow, Shell};
pub use voice::{Listen, RecognitionError, Speak};
