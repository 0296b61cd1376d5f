//! TOML configuration file loading and saving
//!
//! Supports `~/.config/calculadora-voz/config.toml` as a persistent config
//! source. All fields are optional: the file is a partial overlay on top of
//! defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ConfigFile {
    /// Speech output settings
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// Speech recognition settings
    #[serde(default)]
    pub recognition: RecognitionFileConfig,

    /// Calculator behaviour
    #[serde(default)]
    pub calculator: CalculatorFileConfig,
}

/// Speech output configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SpeechFileConfig {
    /// Words per minute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<u32>,

    /// Output volume (0.1 to 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
}

/// Speech recognition configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RecognitionFileConfig {
    /// Language tag passed to the recognizer (e.g. "es-ES")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Seconds to wait for an utterance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Prefer offline engines when both are available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_preferred: Option<bool>,

    /// Allow offline recognition at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_recognition: Option<bool>,
}

/// Calculator configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CalculatorFileConfig {
    /// Decimal digits in spoken results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal_precision: Option<usize>,

    /// Print extra detail to the console
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,

    /// Persist the history log on exit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_history: Option<bool>,

    /// Activation phrases for continuous mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wake_words: Option<Vec<String>>,

    /// Directory holding the history log
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

/// Load a TOML config file from an explicit path
///
/// Missing, unreadable and malformed files all fall back to defaults.
pub fn load_config_file_from(path: &Path) -> ConfigFile {
    if !path.exists() {
        return ConfigFile::default();
    }

    match read_config_file(path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            ConfigFile::default()
        }
    }
}

/// Read and parse a config file
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Write a config file, creating parent directories as needed
///
/// # Errors
///
/// Returns error if serialization or the write fails
pub fn save_config_file(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), "saved config file");
    Ok(())
}

/// Return the config file path: `~/.config/calculadora-voz/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("calculadora-voz").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_parses() {
        let fc: ConfigFile = toml::from_str(
            r#"
            [speech]
            rate = 200

            [calculator]
            decimal_precision = 2
            "#,
        )
        .unwrap();

        assert_eq!(fc.speech.rate, Some(200));
        assert_eq!(fc.speech.volume, None);
        assert_eq!(fc.calculator.decimal_precision, Some(2));
        assert!(fc.recognition.language.is_none());
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "speech = [not toml").unwrap();

        let fc = load_config_file_from(&path);
        assert!(fc.speech.rate.is_none());
        assert!(matches!(read_config_file(&path), Err(crate::Error::Toml(_))));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let fc = load_config_file_from(&dir.path().join("absent.toml"));
        assert!(fc.calculator.wake_words.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut fc = ConfigFile::default();
        fc.speech.volume = Some(0.5);
        fc.recognition.language = Some("es-MX".to_string());
        save_config_file(&fc, &path).unwrap();

        let loaded = load_config_file_from(&path);
        assert_eq!(loaded.speech.volume, Some(0.5));
        assert_eq!(loaded.recognition.language.as_deref(), Some("es-MX"));
    }
}
