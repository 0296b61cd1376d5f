//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use calculadora_voz::config::SpeechConfig;
use calculadora_voz::{CommandDispatcher, Config, Listen, RecognitionError, Speak};

/// Listener that replays a fixed script, then reports the input closed
pub struct ScriptedListener {
    script: VecDeque<Result<String, RecognitionError>>,
}

impl ScriptedListener {
    /// Script of plain transcripts
    pub fn lines(lines: &[&str]) -> Self {
        Self::new(lines.iter().map(|l| Ok((*l).to_string())))
    }

    /// Script mixing transcripts and recognition failures
    pub fn new(script: impl IntoIterator<Item = Result<String, RecognitionError>>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Listen for ScriptedListener {
    async fn listen(&mut self, _timeout: Duration) -> Result<String, RecognitionError> {
        self.script.pop_front().unwrap_or(Err(RecognitionError::Closed))
    }
}

/// Speaker that keeps every reply
#[derive(Default)]
pub struct RecordingSpeaker {
    pub spoken: Vec<String>,
}

#[async_trait]
impl Speak for RecordingSpeaker {
    async fn speak(&mut self, text: &str, _settings: &SpeechConfig) -> calculadora_voz::Result<()> {
        self.spoken.push(text.to_string());
        Ok(())
    }
}

/// Default configuration with data kept under `dir`
pub fn test_config(dir: &Path) -> Config {
    Config {
        data_dir: dir.to_path_buf(),
        ..Config::default()
    }
}

/// Dispatcher over default configuration
pub fn dispatcher() -> CommandDispatcher {
    CommandDispatcher::new(Config::default())
}
