//! Transcript dispatch
//!
//! Normalizes a transcript, classifies it and either runs a control command
//! or evaluates it, returning one [`Outcome`] with the reply to speak.

use std::fmt::Write as _;

use super::classify::{Classification, CommandTag, classify};
use super::format::format_result;
use super::normalize::normalize;
use super::rules::{MatchOutcome, OperationMatcher};
use super::session::{HistoryEntry, SessionState};
use crate::config::Config;
use crate::voice::RecognitionError;

/// History entries read back by the history command
pub const HISTORY_READBACK: usize = 5;

/// Speech-rate step for the faster/slower commands
pub const SPEECH_RATE_STEP: i32 = 20;

/// Volume step for the louder/quieter commands
pub const VOLUME_STEP: f32 = 0.1;

const UNRECOGNIZED_REPLY: &str =
    "No reconocí la operación. Prueba con 'cinco más tres' o 'diez por dos'.";

const NOT_UNDERSTOOD_REPLY: &str = "No te entendí. ¿Puedes repetir?";

const HELP_REPLY: &str = "Puedo sumar, restar, multiplicar, dividir y calcular potencias. \
También raíces, seno, coseno, tangente, logaritmos, factoriales, porcentajes y \
conversiones de temperatura. Prueba con 'cinco más tres' o 'raíz cuadrada de nueve'. \
Di 'historial' para oír tus cálculos y 'salir' para terminar.";

/// Result of dispatching one transcript
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A control command ran
    Command {
        /// Which command
        tag: CommandTag,
        /// Reply to speak
        spoken_reply: String,
    },
    /// An operation evaluated successfully
    Success {
        /// Numeric result
        value: f64,
        /// Reply to speak
        spoken_reply: String,
    },
    /// An operation matched but is undefined, or nothing was heard
    Failure {
        /// Reply to speak
        spoken_reply: String,
    },
    /// No operation pattern matched
    Unrecognized {
        /// Reply to speak
        spoken_reply: String,
    },
    /// The caller should persist state and stop
    Exit {
        /// Reply to speak
        spoken_reply: String,
    },
}

impl Outcome {
    /// Reply to speak
    #[must_use]
    pub fn spoken_reply(&self) -> &str {
        match self {
            Self::Command { spoken_reply, .. }
            | Self::Success { spoken_reply, .. }
            | Self::Failure { spoken_reply }
            | Self::Unrecognized { spoken_reply }
            | Self::Exit { spoken_reply } => spoken_reply,
        }
    }

    /// Numeric result, when there is one
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::Success { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Replies that must be spoken even while paused
    #[must_use]
    pub const fn is_priority(&self) -> bool {
        matches!(
            self,
            Self::Exit { .. }
                | Self::Command {
                    tag: CommandTag::PauseToggle | CommandTag::Resume,
                    ..
                }
        )
    }

    /// Whether the caller should stop after speaking
    #[must_use]
    pub const fn is_exit(&self) -> bool {
        matches!(self, Self::Exit { .. })
    }
}

/// Dispatch one transcript against explicit state
///
/// Only a successful evaluation or a control command mutates `state`;
/// settings commands may also change `config`.
pub fn handle_transcript(text: &str, state: &mut SessionState, config: &mut Config) -> Outcome {
    dispatch(OperationMatcher::standard(), text, state, config)
}

/// Map a recognition failure to a fixed apology
///
/// No state is touched. A closed input source is treated as an exit request.
#[must_use]
pub fn handle_recognition_error(error: &RecognitionError) -> Outcome {
    tracing::debug!(%error, "no transcript");
    match error {
        RecognitionError::Timeout => Outcome::Failure {
            spoken_reply: "No escuché nada. ¿Sigues ahí?".to_string(),
        },
        RecognitionError::Unintelligible => Outcome::Failure {
            spoken_reply: NOT_UNDERSTOOD_REPLY.to_string(),
        },
        RecognitionError::Service(_) => Outcome::Failure {
            spoken_reply: "Hay un problema con el reconocimiento de voz. Inténtalo de nuevo."
                .to_string(),
        },
        RecognitionError::Closed => Outcome::Exit {
            spoken_reply: "¡Hasta luego!".to_string(),
        },
    }
}

fn dispatch(
    matcher: &OperationMatcher,
    text: &str,
    state: &mut SessionState,
    config: &mut Config,
) -> Outcome {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return Outcome::Unrecognized {
            spoken_reply: NOT_UNDERSTOOD_REPLY.to_string(),
        };
    }

    match classify(&normalized) {
        Classification::Command(tag) => {
            tracing::info!(command = %tag, "control command");
            run_command(tag, state, config)
        }
        Classification::Arithmetic => evaluate(matcher, text, &normalized, state, config),
    }
}

fn evaluate(
    matcher: &OperationMatcher,
    original: &str,
    normalized: &str,
    state: &mut SessionState,
    config: &Config,
) -> Outcome {
    match matcher.evaluate(normalized, state.last_result()) {
        MatchOutcome::Evaluated(evaluation) => {
            let formatted = format_result(evaluation.value, config.decimal_precision);
            state.record(HistoryEntry::now(
                original.trim(),
                evaluation.value,
                evaluation.label(),
            ));
            tracing::debug!(
                operation = evaluation.label(),
                value = evaluation.value,
                history = state.history().len(),
                "evaluation recorded"
            );
            Outcome::Success {
                value: evaluation.value,
                spoken_reply: format!(
                    "El resultado {} es {formatted}",
                    evaluation.kind.spoken()
                ),
            }
        }
        MatchOutcome::Invalid { kind, reason } => {
            tracing::debug!(operation = %kind, %reason, "operation rejected");
            Outcome::Failure {
                spoken_reply: format!("Error: {}", reason.spoken()),
            }
        }
        MatchOutcome::NoMatch => Outcome::Unrecognized {
            spoken_reply: UNRECOGNIZED_REPLY.to_string(),
        },
    }
}

fn run_command(tag: CommandTag, state: &mut SessionState, config: &mut Config) -> Outcome {
    let precision = config.decimal_precision;

    let reply = match tag {
        CommandTag::Exit => {
            return Outcome::Exit {
                spoken_reply: "Guardando configuración y cerrando. ¡Hasta luego!".to_string(),
            };
        }
        CommandTag::Help => HELP_REPLY.to_string(),
        CommandTag::HistoryRead => read_history(state, precision),
        CommandTag::HistoryClear => {
            let removed = state.clear_history();
            tracing::info!(removed, "history cleared");
            "Historial limpiado".to_string()
        }
        CommandTag::Settings => describe_settings(config),
        CommandTag::SaveSettings => "Guardando configuración".to_string(),
        CommandTag::ContinuousToggle => {
            if state.toggle_continuous() {
                let wake = config
                    .wake_words
                    .first()
                    .map_or("calculadora", String::as_str);
                format!("Modo continuo activado. Di '{wake}' para activarme.")
            } else {
                "Modo continuo desactivado".to_string()
            }
        }
        CommandTag::ContinuousOff => {
            state.set_continuous(false);
            "Modo continuo desactivado".to_string()
        }
        CommandTag::PauseToggle => {
            if state.toggle_pause() {
                "Calculadora pausada. Di 'reanudar' para continuar".to_string()
            } else {
                "Calculadora reanudada".to_string()
            }
        }
        CommandTag::Resume => {
            state.set_paused(false);
            "Calculadora reanudada".to_string()
        }
        CommandTag::Status => describe_status(state, precision),
        CommandTag::LastResult => format!(
            "El último resultado es {}",
            format_result(state.last_result(), precision)
        ),
        CommandTag::ClearResult => {
            state.clear_result();
            "Resultado borrado".to_string()
        }
        CommandTag::Undo => match state.undo() {
            Some(entry) => format!("Deshecha la operación {}", entry.input),
            None => "No hay operaciones que deshacer".to_string(),
        },
        CommandTag::SpeechFaster => {
            format!("Velocidad ajustada a {}", config.adjust_speech_rate(SPEECH_RATE_STEP))
        }
        CommandTag::SpeechSlower => {
            format!("Velocidad ajustada a {}", config.adjust_speech_rate(-SPEECH_RATE_STEP))
        }
        CommandTag::VolumeUp => {
            config.adjust_volume(VOLUME_STEP);
            format!("Volumen ajustado a {} por ciento", volume_percent(config))
        }
        CommandTag::VolumeDown => {
            config.adjust_volume(-VOLUME_STEP);
            format!("Volumen ajustado a {} por ciento", volume_percent(config))
        }
        CommandTag::VerboseToggle => {
            config.verbose = !config.verbose;
            format!("Modo verboso {}", on_off(config.verbose))
        }
    };

    Outcome::Command {
        tag,
        spoken_reply: reply,
    }
}

fn read_history(state: &SessionState, precision: usize) -> String {
    let total = state.history().len();
    if total == 0 {
        return "No hay operaciones en el historial".to_string();
    }

    let shown = total.min(HISTORY_READBACK);
    let mut reply = if total == 1 {
        "Tienes 1 operación en el historial.".to_string()
    } else {
        format!("Tienes {total} operaciones en el historial. Te leo las últimas {shown}.")
    };

    for entry in state.recent(HISTORY_READBACK) {
        let _ = write!(
            reply,
            " A las {}: {} = {}.",
            entry.timestamp.format("%H:%M:%S"),
            entry.input,
            format_result(entry.result, precision)
        );
    }

    reply
}

fn describe_settings(config: &Config) -> String {
    format!(
        "Configuración actual: velocidad de voz {}, volumen {} por ciento, \
         tiempo de escucha {} segundos, {} decimales, reconocimiento offline {}, modo verboso {}",
        config.speech.rate,
        volume_percent(config),
        config.recognition.timeout_secs,
        config.decimal_precision,
        yes_no(config.recognition.offline_recognition),
        yes_no(config.verbose),
    )
}

fn describe_status(state: &SessionState, precision: usize) -> String {
    format!(
        "Estado del sistema: modo continuo {}, calculadora {}. \
         Último resultado: {}. Operaciones en historial: {}.",
        on_off(state.is_continuous()),
        if state.is_paused() { "pausada" } else { "activa" },
        format_result(state.last_result(), precision),
        state.history().len(),
    )
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn volume_percent(config: &Config) -> u32 {
    (config.speech.volume * 100.0).round() as u32
}

const fn on_off(on: bool) -> &'static str {
    if on { "activado" } else { "desactivado" }
}

const fn yes_no(yes: bool) -> &'static str {
    if yes { "sí" } else { "no" }
}

/// Single owner of session state and configuration
///
/// Wraps [`handle_transcript`] for callers that want one object to hold
/// everything. Not shared across threads: hand transcripts to it one at a
/// time.
#[derive(Debug)]
pub struct CommandDispatcher {
    matcher: &'static OperationMatcher,
    state: SessionState,
    config: Config,
}

impl CommandDispatcher {
    /// Create a dispatcher with fresh state
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_state(config, SessionState::new())
    }

    /// Create a dispatcher resuming existing state
    #[must_use]
    pub fn with_state(config: Config, state: SessionState) -> Self {
        Self {
            matcher: OperationMatcher::standard(),
            state,
            config,
        }
    }

    /// Dispatch one transcript
    pub fn handle(&mut self, text: &str) -> Outcome {
        dispatch(self.matcher, text, &mut self.state, &mut self.config)
    }

    /// Dispatch the result of one listen attempt
    pub fn handle_heard(&mut self, heard: Result<String, RecognitionError>) -> Outcome {
        match heard {
            Ok(text) => self.handle(&text),
            Err(error) => handle_recognition_error(&error),
        }
    }

    /// Current session state
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current configuration
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> CommandDispatcher {
        CommandDispatcher::new(Config::default())
    }

    #[test]
    fn test_success_reply() {
        let mut d = dispatcher();
        let outcome = d.handle("cinco más tres");
        assert_eq!(outcome.value(), Some(8.0));
        assert_eq!(outcome.spoken_reply(), "El resultado de la suma es 8");
        assert_eq!(d.state().history().back().unwrap().input, "cinco más tres");
        assert_eq!(d.state().history().back().unwrap().operation, "suma");
    }

    #[test]
    fn test_failure_does_not_touch_state() {
        let mut d = dispatcher();
        d.handle("2 por 3");
        let outcome = d.handle("10 entre 0");
        assert!(matches!(outcome, Outcome::Failure { .. }));
        assert_eq!(outcome.spoken_reply(), "Error: No se puede dividir entre cero");
        assert!((d.state().last_result() - 6.0).abs() < f64::EPSILON);
        assert_eq!(d.state().history().len(), 1);
    }

    #[test]
    fn test_malformed_operand_is_failure() {
        let mut d = dispatcher();
        let outcome = d.handle("٣ más ٤");
        assert!(matches!(outcome, Outcome::Failure { .. }));
        assert!(outcome.spoken_reply().contains("No pude leer el número"));
        assert!(d.state().history().is_empty());
    }

    #[test]
    fn test_unrecognized() {
        let mut d = dispatcher();
        let outcome = d.handle("qué hora es");
        assert_eq!(
            outcome,
            Outcome::Unrecognized {
                spoken_reply: UNRECOGNIZED_REPLY.to_string()
            }
        );
        assert!(d.state().history().is_empty());
    }

    #[test]
    fn test_blank_transcript() {
        let mut d = dispatcher();
        assert!(matches!(d.handle("   "), Outcome::Unrecognized { .. }));
    }

    #[test]
    fn test_exit_is_terminal_outcome() {
        let mut d = dispatcher();
        let outcome = d.handle("salir");
        assert!(outcome.is_exit());
        assert!(outcome.is_priority());
    }

    #[test]
    fn test_history_readback() {
        let mut d = dispatcher();
        assert_eq!(
            d.handle("historial").spoken_reply(),
            "No hay operaciones en el historial"
        );

        for n in 1..=7 {
            d.handle(&format!("{n} por 2"));
        }
        let reply = d.handle("historial").spoken_reply().to_string();
        assert!(reply.starts_with("Tienes 7 operaciones en el historial. Te leo las últimas 5."));
        assert!(reply.contains("3 por 2 = 6"));
        assert!(reply.contains("7 por 2 = 14"));
        assert!(!reply.contains("2 por 2 = 4"));
    }

    #[test]
    fn test_history_clear() {
        let mut d = dispatcher();
        d.handle("1 más 1");
        let outcome = d.handle("limpiar historial");
        assert!(matches!(
            outcome,
            Outcome::Command {
                tag: CommandTag::HistoryClear,
                ..
            }
        ));
        assert!(d.state().history().is_empty());
        // The last result survives a history clear
        assert!((d.state().last_result() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut d = dispatcher();
        let outcome = d.handle("pausar");
        assert!(outcome.is_priority());
        assert!(d.state().is_paused());

        d.handle("reanudar");
        assert!(!d.state().is_paused());
    }

    #[test]
    fn test_speech_adjustments_change_config() {
        let mut d = dispatcher();
        assert_eq!(
            d.handle("velocidad más rápida").spoken_reply(),
            "Velocidad ajustada a 200"
        );
        assert_eq!(d.config().speech.rate, 200);

        assert_eq!(
            d.handle("volumen más alto").spoken_reply(),
            "Volumen ajustado a 100 por ciento"
        );
        d.handle("volumen más bajo");
        assert!((d.config().speech.volume - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_last_result_and_clear() {
        let mut d = dispatcher();
        d.handle("2.5 por 1");
        assert_eq!(
            d.handle("último resultado").spoken_reply(),
            "El último resultado es 2.5"
        );
        d.handle("borrar resultado");
        assert!(d.state().last_result().abs() < f64::EPSILON);
    }

    #[test]
    fn test_undo() {
        let mut d = dispatcher();
        d.handle("2 más 2");
        d.handle("3 más 3");
        assert_eq!(
            d.handle("deshacer").spoken_reply(),
            "Deshecha la operación 3 más 3"
        );
        assert!((d.state().last_result() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_continuous_mode_commands() {
        let mut d = dispatcher();
        let reply = d.handle("modo continuo").spoken_reply().to_string();
        assert!(reply.contains("'calculadora'"));
        assert!(d.state().is_continuous());
        d.handle("modo normal");
        assert!(!d.state().is_continuous());
    }

    #[test]
    fn test_status_and_settings() {
        let mut d = dispatcher();
        d.handle("3 más 4");
        let status = d.handle("estado").spoken_reply().to_string();
        assert!(status.contains("Último resultado: 7"));
        assert!(status.contains("Operaciones en historial: 1"));

        let settings = d.handle("configuración").spoken_reply().to_string();
        assert!(settings.contains("velocidad de voz 180"));
        assert!(settings.contains("4 decimales"));
    }

    #[test]
    fn test_recognition_errors() {
        let mut d = dispatcher();
        d.handle("1 más 1");

        let outcome = d.handle_heard(Err(RecognitionError::Unintelligible));
        assert_eq!(outcome.spoken_reply(), NOT_UNDERSTOOD_REPLY);
        assert!((d.state().last_result() - 2.0).abs() < f64::EPSILON);

        assert!(d.handle_heard(Err(RecognitionError::Closed)).is_exit());
        assert!(matches!(
            d.handle_heard(Err(RecognitionError::Timeout)),
            Outcome::Failure { .. }
        ));
    }

    #[test]
    fn test_precision_from_config() {
        let mut config = Config::default();
        config.decimal_precision = 2;
        let mut state = SessionState::new();

        let outcome = handle_transcript("1 entre 3", &mut state, &mut config);
        assert_eq!(outcome.spoken_reply(), "El resultado de la división es 0.33");
    }
}
