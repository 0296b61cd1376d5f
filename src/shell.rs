//! Interactive shell
//!
//! Owns the dispatcher and drives it from a listener. A spawned task feeds
//! heard transcripts through a channel; the shell handles them one at a
//! time, applies the continuous-mode wake word filter, mutes replies while
//! paused and persists configuration and history on the way out.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::Result;
use crate::calc::{CommandDispatcher, CommandTag, Outcome};
use crate::config::Config;
use crate::config::file::{self, ConfigFile};
use crate::history::HistoryStore;
use crate::voice::{Listen, RecognitionError, Speak, WakeDecision, WakeWordFilter};

/// Consecutive recognition errors before the troubleshooting hint
pub const MAX_CONSECUTIVE_ERRORS: u32 = 5;

const GREETING: &str = "Calculadora por voz lista. Di una operación como 'cinco más tres', \
o di 'ayuda' para conocer todas las opciones.";

const ARMED_REPLY: &str = "Te escucho";

const TROUBLESHOOTING_HINT: &str = "Estoy teniendo problemas para entenderte. \
Habla claro y cerca del micrófono, o di 'ayuda' para ver ejemplos.";

const INTERRUPTED_REPLY: &str = "Interrumpido. ¡Hasta luego!";

type Heard = std::result::Result<String, RecognitionError>;

/// Whether the loop keeps going after a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Wait for the next transcript
    Continue,
    /// Persist and stop
    Stop,
}

/// Interactive calculator session
pub struct Shell<S> {
    dispatcher: CommandDispatcher,
    speaker: S,
    wake: WakeWordFilter,
    history: Option<HistoryStore>,
    config_path: Option<PathBuf>,
    saved_file: ConfigFile,
    saved_config: Config,
    consecutive_errors: u32,
}

impl<S: Speak> Shell<S> {
    /// Create a shell that persists nothing
    #[must_use]
    pub fn new(dispatcher: CommandDispatcher, speaker: S) -> Self {
        let wake = WakeWordFilter::new(&dispatcher.config().wake_words);
        let saved_config = dispatcher.config().clone();
        Self {
            dispatcher,
            speaker,
            wake,
            history: None,
            config_path: None,
            saved_file: ConfigFile::default(),
            saved_config,
            consecutive_errors: 0,
        }
    }

    /// Save settings changes to `path` on exit and on request
    ///
    /// `contents` is what the file held when the configuration was loaded.
    /// Only settings changed during the session are written on top of it.
    #[must_use]
    pub fn with_config_file(mut self, path: impl Into<PathBuf>, contents: ConfigFile) -> Self {
        self.config_path = Some(path.into());
        self.saved_file = contents;
        self
    }

    /// Save history to `store` on exit
    #[must_use]
    pub fn with_history_store(mut self, store: HistoryStore) -> Self {
        self.history = Some(store);
        self
    }

    /// Run until exit, end of input or Ctrl-C
    ///
    /// History is saved however the loop ends; settings are saved on exit.
    ///
    /// # Errors
    ///
    /// Returns error if a reply cannot be spoken
    pub async fn run<L: Listen + 'static>(&mut self, listener: L) -> Result<()> {
        let timeout = Duration::from_secs(self.dispatcher.config().recognition.timeout_secs);
        let (tx, mut rx) = mpsc::channel::<Heard>(8);
        let listen_task = tokio::spawn(listen_loop(listener, timeout, tx));

        let result = self.serve(&mut rx).await;

        listen_task.abort();
        self.save_history();
        result
    }

    async fn serve(&mut self, rx: &mut mpsc::Receiver<Heard>) -> Result<()> {
        self.say(GREETING, true).await?;
        tracing::info!("calculator ready");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown requested");
                    self.say(INTERRUPTED_REPLY, true).await?;
                    return Ok(());
                }
                heard = rx.recv() => {
                    let Some(heard) = heard else {
                        tracing::info!("listener stopped");
                        return Ok(());
                    };
                    if self.step(heard).await? == Flow::Stop {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handle the result of one listen attempt
    ///
    /// # Errors
    ///
    /// Returns error if a reply cannot be spoken
    pub async fn step(&mut self, heard: Heard) -> Result<Flow> {
        let text = match heard {
            Ok(text) => {
                self.consecutive_errors = 0;
                text
            }
            Err(RecognitionError::Timeout) => {
                tracing::debug!("nothing heard");
                return Ok(Flow::Continue);
            }
            Err(error) => return self.recognition_failed(&error).await,
        };

        let command = if self.dispatcher.state().is_continuous() {
            match self.wake.filter(&text) {
                WakeDecision::Ignore => {
                    tracing::trace!(transcript = %text, "not addressed to the calculator");
                    return Ok(Flow::Continue);
                }
                WakeDecision::Armed => {
                    self.say(ARMED_REPLY, false).await?;
                    return Ok(Flow::Continue);
                }
                WakeDecision::Command(command) => command,
            }
        } else {
            text
        };

        let outcome = self.dispatcher.handle(&command);
        self.respond(&outcome).await
    }

    /// Handle a single command without a listen loop
    ///
    /// Settings are saved only if the command changed them.
    ///
    /// # Errors
    ///
    /// Returns error if the reply cannot be spoken
    pub async fn run_once(&mut self, heard: Heard) -> Result<Outcome> {
        let outcome = self.dispatcher.handle_heard(heard);
        self.respond(&outcome).await?;
        self.save_config();
        self.save_history();
        Ok(outcome)
    }

    async fn respond(&mut self, outcome: &Outcome) -> Result<Flow> {
        self.say(outcome.spoken_reply(), outcome.is_priority()).await?;

        match outcome {
            Outcome::Exit { .. } => {
                self.save_config();
                return Ok(Flow::Stop);
            }
            Outcome::Success { value, .. } if self.dispatcher.config().verbose => {
                let state = self.dispatcher.state();
                if let Some(entry) = state.history().back() {
                    tracing::info!(
                        operation = %entry.operation,
                        value,
                        history = state.history().len(),
                        "operation complete"
                    );
                }
            }
            Outcome::Command {
                tag: CommandTag::SaveSettings,
                ..
            } => self.save_config(),
            Outcome::Command {
                tag: CommandTag::ContinuousToggle | CommandTag::ContinuousOff,
                ..
            } => self.wake.reset(),
            _ => {}
        }

        Ok(Flow::Continue)
    }

    async fn recognition_failed(&mut self, error: &RecognitionError) -> Result<Flow> {
        let outcome = self.dispatcher.handle_heard(Err(error.clone()));
        if outcome.is_exit() {
            tracing::info!("input closed");
            return self.respond(&outcome).await;
        }

        self.consecutive_errors += 1;
        tracing::warn!(%error, consecutive = self.consecutive_errors, "recognition failed");

        if self.consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
            self.consecutive_errors = 0;
            self.say(TROUBLESHOOTING_HINT, false).await?;
        } else {
            self.say(outcome.spoken_reply(), false).await?;
        }
        Ok(Flow::Continue)
    }

    async fn say(&mut self, text: &str, priority: bool) -> Result<()> {
        if !priority && self.dispatcher.state().is_paused() {
            tracing::debug!(reply = text, "paused, reply muted");
            return Ok(());
        }
        self.speaker.speak(text, &self.dispatcher.config().speech).await
    }

    fn save_config(&mut self) {
        let Some(path) = &self.config_path else {
            return;
        };
        let config = self.dispatcher.config();
        if *config == self.saved_config {
            tracing::debug!("configuration unchanged, not saving");
            return;
        }

        let contents = config.changes_onto(&self.saved_config, self.saved_file.clone());
        match file::save_config_file(&contents, path) {
            Ok(()) => {
                self.saved_config = config.clone();
                self.saved_file = contents;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to save configuration");
            }
        }
    }

    fn save_history(&self) {
        if !self.dispatcher.config().save_history {
            return;
        }
        if let Some(store) = &self.history {
            if let Err(e) = store.save(self.dispatcher.state().history()) {
                tracing::warn!(path = %store.path().display(), error = %e, "failed to save history");
            }
        }
    }

    /// Dispatcher driven by this shell
    #[must_use]
    pub const fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Consecutive recognition failures since the last transcript or hint
    #[must_use]
    pub const fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    /// Recover the speaker
    #[must_use]
    pub fn into_speaker(self) -> S {
        self.speaker
    }
}

/// Listen repeatedly, forwarding every attempt until the input closes
async fn listen_loop<L: Listen>(mut listener: L, timeout: Duration, tx: mpsc::Sender<Heard>) {
    loop {
        let heard = listener.listen(timeout).await;
        let closed = heard == Err(RecognitionError::Closed);
        if tx.send(heard).await.is_err() || closed {
            break;
        }
    }
}
