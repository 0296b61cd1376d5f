//! Configuration management for the voice calculator

pub mod file;

use std::path::PathBuf;

/// Slowest allowed speech rate (words per minute)
pub const MIN_SPEECH_RATE: u32 = 100;

/// Fastest allowed speech rate (words per minute)
pub const MAX_SPEECH_RATE: u32 = 300;

/// Quietest allowed volume
pub const MIN_VOLUME: f32 = 0.1;

/// Loudest allowed volume
pub const MAX_VOLUME: f32 = 1.0;

/// Largest accepted decimal precision
pub const MAX_DECIMAL_PRECISION: usize = 12;

/// Voice calculator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Speech output settings
    pub speech: SpeechConfig,

    /// Speech recognition settings
    pub recognition: RecognitionConfig,

    /// Decimal digits used when a result is not integral
    pub decimal_precision: usize,

    /// Print extra detail after each evaluation
    pub verbose: bool,

    /// Persist the history log on exit
    pub save_history: bool,

    /// Activation phrases for continuous mode
    pub wake_words: Vec<String>,

    /// Directory holding the history log
    pub data_dir: PathBuf,
}

/// Speech output configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechConfig {
    /// Words per minute, within `MIN_SPEECH_RATE..=MAX_SPEECH_RATE`
    pub rate: u32,

    /// Output volume, within `MIN_VOLUME..=MAX_VOLUME`
    pub volume: f32,
}

/// Speech recognition configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    /// Language tag for the recognizer
    pub language: String,

    /// Seconds to wait for an utterance
    pub timeout_secs: u64,

    /// Prefer offline engines
    pub offline_preferred: bool,

    /// Allow offline recognition
    pub offline_recognition: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speech: SpeechConfig {
                rate: 180,
                volume: 0.9,
            },
            recognition: RecognitionConfig {
                language: "es-ES".to_string(),
                timeout_secs: 10,
                offline_preferred: true,
                offline_recognition: true,
            },
            decimal_precision: 4,
            verbose: true,
            save_history: true,
            wake_words: default_wake_words(),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Build configuration from a file overlay (env > toml > default)
    ///
    /// Unusable environment overrides are logged and ignored.
    #[must_use]
    pub fn from_file(fc: file::ConfigFile) -> Self {
        let defaults = Self::default();

        let speech = SpeechConfig {
            rate: env_parse("CALCULADORA_RATE")
                .or(fc.speech.rate)
                .unwrap_or(defaults.speech.rate)
                .clamp(MIN_SPEECH_RATE, MAX_SPEECH_RATE),
            volume: env_parse("CALCULADORA_VOLUME")
                .or(fc.speech.volume)
                .unwrap_or(defaults.speech.volume)
                .clamp(MIN_VOLUME, MAX_VOLUME),
        };

        let recognition = RecognitionConfig {
            language: std::env::var("CALCULADORA_LANGUAGE")
                .ok()
                .or(fc.recognition.language)
                .unwrap_or(defaults.recognition.language),
            timeout_secs: env_parse("CALCULADORA_TIMEOUT")
                .or(fc.recognition.timeout)
                .unwrap_or(defaults.recognition.timeout_secs),
            offline_preferred: fc
                .recognition
                .offline_preferred
                .unwrap_or(defaults.recognition.offline_preferred),
            offline_recognition: fc
                .recognition
                .offline_recognition
                .unwrap_or(defaults.recognition.offline_recognition),
        };

        let wake_words = fc
            .calculator
            .wake_words
            .filter(|words| !words.is_empty())
            .unwrap_or(defaults.wake_words);

        Self {
            speech,
            recognition,
            decimal_precision: env_parse("CALCULADORA_PRECISION")
                .or(fc.calculator.decimal_precision)
                .unwrap_or(defaults.decimal_precision)
                .min(MAX_DECIMAL_PRECISION),
            verbose: fc.calculator.verbose.unwrap_or(defaults.verbose),
            save_history: fc.calculator.save_history.unwrap_or(defaults.save_history),
            wake_words,
            data_dir: std::env::var("CALCULADORA_DATA_DIR")
                .ok()
                .or(fc.calculator.data_dir)
                .map_or(defaults.data_dir, PathBuf::from),
        }
    }

    /// Convert into the on-disk schema
    #[must_use]
    pub fn to_file(&self) -> file::ConfigFile {
        file::ConfigFile {
            speech: file::SpeechFileConfig {
                rate: Some(self.speech.rate),
                volume: Some(self.speech.volume),
            },
            recognition: file::RecognitionFileConfig {
                language: Some(self.recognition.language.clone()),
                timeout: Some(self.recognition.timeout_secs),
                offline_preferred: Some(self.recognition.offline_preferred),
                offline_recognition: Some(self.recognition.offline_recognition),
            },
            calculator: file::CalculatorFileConfig {
                decimal_precision: Some(self.decimal_precision),
                verbose: Some(self.verbose),
                save_history: Some(self.save_history),
                wake_words: Some(self.wake_words.clone()),
                data_dir: Some(self.data_dir.display().to_string()),
            },
        }
    }

    /// Overlay `base` with every value that differs from `since`
    ///
    /// Values that came from the environment or from defaults stay out of
    /// the file unless a command changed them afterwards.
    #[must_use]
    pub fn changes_onto(&self, since: &Self, mut base: file::ConfigFile) -> file::ConfigFile {
        let now = self.to_file();
        let before = since.to_file();

        keep_changed(&mut base.speech.rate, now.speech.rate, before.speech.rate);
        keep_changed(&mut base.speech.volume, now.speech.volume, before.speech.volume);
        keep_changed(
            &mut base.recognition.language,
            now.recognition.language,
            before.recognition.language,
        );
        keep_changed(
            &mut base.recognition.timeout,
            now.recognition.timeout,
            before.recognition.timeout,
        );
        keep_changed(
            &mut base.recognition.offline_preferred,
            now.recognition.offline_preferred,
            before.recognition.offline_preferred,
        );
        keep_changed(
            &mut base.recognition.offline_recognition,
            now.recognition.offline_recognition,
            before.recognition.offline_recognition,
        );
        keep_changed(
            &mut base.calculator.decimal_precision,
            now.calculator.decimal_precision,
            before.calculator.decimal_precision,
        );
        keep_changed(
            &mut base.calculator.verbose,
            now.calculator.verbose,
            before.calculator.verbose,
        );
        keep_changed(
            &mut base.calculator.save_history,
            now.calculator.save_history,
            before.calculator.save_history,
        );
        keep_changed(
            &mut base.calculator.wake_words,
            now.calculator.wake_words,
            before.calculator.wake_words,
        );
        keep_changed(
            &mut base.calculator.data_dir,
            now.calculator.data_dir,
            before.calculator.data_dir,
        );

        base
    }

    /// Change the speech rate by `delta`, clamped, returning the new rate
    pub fn adjust_speech_rate(&mut self, delta: i32) -> u32 {
        let current = i64::from(self.speech.rate);
        let next = (current + i64::from(delta))
            .clamp(i64::from(MIN_SPEECH_RATE), i64::from(MAX_SPEECH_RATE));
        self.speech.rate = u32::try_from(next).unwrap_or(MAX_SPEECH_RATE);
        self.speech.rate
    }

    /// Change the volume by `delta`, clamped, returning the new volume
    ///
    /// The result is rounded to one decimal so repeated steps stay exact.
    pub fn adjust_volume(&mut self, delta: f32) -> f32 {
        let next = ((self.speech.volume + delta) * 10.0).round() / 10.0;
        self.speech.volume = next.clamp(MIN_VOLUME, MAX_VOLUME);
        self.speech.volume
    }

    /// Path of the persisted history log
    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("historial.json")
    }
}

fn keep_changed<T: PartialEq>(slot: &mut Option<T>, now: Option<T>, before: Option<T>) {
    if now != before {
        *slot = now;
    }
}

/// Read an optional environment override
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    parse_override(key, std::env::var(key).ok())
}

/// Parse a raw override, ignoring it with a warning when unusable
fn parse_override<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    raw.trim().parse().map_or_else(
        |_| {
            tracing::warn!(key, value = %raw, "invalid environment override, ignoring");
            None
        },
        Some,
    )
}

fn default_wake_words() -> Vec<String> {
    ["calculadora", "oye calculadora", "hey calculadora"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Return the XDG data directory for the history log
///
/// Uses `~/.local/share/calculadora-voz/` on Linux
fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "calculadora", "calculadora-voz").map_or_else(
        || PathBuf::from(".calculadora-voz"),
        |d| d.data_dir().to_path_buf(),
    )
}
