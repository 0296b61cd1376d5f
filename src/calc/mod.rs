//! Calculator core
//!
//! Pure transcript handling: number-word normalization, command
//! classification, the ordered operation rule table, result formatting and
//! the session state they act on. Nothing in here performs I/O.

mod classify;
mod dispatch;
mod format;
mod normalize;
mod rules;
mod session;

pub use classify::{Classification, CommandTag, classify};
pub use dispatch::{
    CommandDispatcher, HISTORY_READBACK, Outcome, SPEECH_RATE_STEP, VOLUME_STEP,
    handle_recognition_error, handle_transcript,
};
pub use format::format_result;
pub use normalize::{digits_for, normalize};
pub use rules::{
    Arity, Evaluation, InvalidReason, MAX_FACTORIAL, MatchOutcome, OperationKind,
    OperationMatcher, OperationRule,
};
pub use session::{HISTORY_CAPACITY, HistoryEntry, SessionState};
