//! Error types for the voice calculator

use thiserror::Error;

/// Result type alias for calculator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised outside the evaluation core
///
/// Arithmetic domain problems are not errors in this sense; they travel as
/// [`crate::calc::InvalidReason`] values inside an outcome.
#[derive(Debug, Error)]
pub enum Error {
    /// History log error
    #[error("history error: {0}")]
    History(String),

    /// Speech output error
    #[error("speech error: {0}")]
    Speech(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("toml serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
