//! Control command classification
//!
//! Decides whether a normalized transcript is a control command or should
//! be handed to the operation matcher.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Control commands understood by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandTag {
    /// Persist state and stop
    Exit,
    /// Short spoken help
    Help,
    /// Read back recent history
    HistoryRead,
    /// Empty the history
    HistoryClear,
    /// Speak the current settings
    Settings,
    /// Ask the caller to persist settings
    SaveSettings,
    /// Toggle continuous listening
    ContinuousToggle,
    /// Leave continuous listening
    ContinuousOff,
    /// Toggle pause
    PauseToggle,
    /// Leave pause
    Resume,
    /// Speak a status summary
    Status,
    /// Repeat the last result
    LastResult,
    /// Reset the last result to zero
    ClearResult,
    /// Drop the newest history entry
    Undo,
    /// Speak faster
    SpeechFaster,
    /// Speak slower
    SpeechSlower,
    /// Louder output
    VolumeUp,
    /// Quieter output
    VolumeDown,
    /// Toggle verbose console output
    VerboseToggle,
}

impl CommandTag {
    /// Stable identifier for logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exit => "exit",
            Self::Help => "help",
            Self::HistoryRead => "history_read",
            Self::HistoryClear => "history_clear",
            Self::Settings => "settings",
            Self::SaveSettings => "save_settings",
            Self::ContinuousToggle => "continuous_toggle",
            Self::ContinuousOff => "continuous_off",
            Self::PauseToggle => "pause_toggle",
            Self::Resume => "resume",
            Self::Status => "status",
            Self::LastResult => "last_result",
            Self::ClearResult => "clear_result",
            Self::Undo => "undo",
            Self::SpeechFaster => "speech_faster",
            Self::SpeechSlower => "speech_slower",
            Self::VolumeUp => "volume_up",
            Self::VolumeDown => "volume_down",
            Self::VerboseToggle => "verbose_toggle",
        }
    }
}

impl fmt::Display for CommandTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// A control command
    Command(CommandTag),
    /// Anything else: try to evaluate it
    Arithmetic,
}

/// How a table entry recognises its command
enum Trigger {
    /// The phrase appears anywhere, even inside a longer word
    Contains(&'static str),
    /// The word appears on word boundaries
    Word(&'static str),
    /// Every fragment appears somewhere in the transcript
    AllOf(&'static [&'static str]),
}

/// Ordered command table; specific phrases precede the general ones they contain
const COMMANDS: &[(CommandTag, &[Trigger])] = &[
    (
        CommandTag::Exit,
        &[
            Trigger::Contains("salir"),
            Trigger::Contains("cerrar"),
            Trigger::Contains("terminar"),
            Trigger::Contains("adiós"),
            Trigger::Contains("adios"),
            Trigger::Contains("chao"),
        ],
    ),
    (
        CommandTag::HistoryClear,
        &[
            Trigger::Contains("limpiar historial"),
            Trigger::Contains("borrar historial"),
            Trigger::AllOf(&["limpiar", "historial"]),
            Trigger::AllOf(&["borrar", "historial"]),
        ],
    ),
    (CommandTag::HistoryRead, &[Trigger::Contains("historial")]),
    (
        CommandTag::ClearResult,
        &[
            Trigger::Contains("borrar resultado"),
            Trigger::Contains("limpiar resultado"),
        ],
    ),
    (
        CommandTag::LastResult,
        &[
            Trigger::Contains("último resultado"),
            Trigger::Contains("ultimo resultado"),
            Trigger::Contains("resultado anterior"),
        ],
    ),
    (CommandTag::Undo, &[Trigger::Contains("deshacer")]),
    (
        CommandTag::SaveSettings,
        &[
            Trigger::Contains("guardar configuración"),
            Trigger::Contains("guardar configuracion"),
            Trigger::Contains("guardar ajustes"),
        ],
    ),
    (
        CommandTag::Settings,
        &[
            Trigger::Contains("configuración"),
            Trigger::Contains("configuracion"),
            Trigger::Contains("ajustes"),
        ],
    ),
    (
        CommandTag::SpeechFaster,
        &[
            Trigger::Contains("velocidad más rápida"),
            Trigger::Contains("hablar más rápido"),
            Trigger::Contains("habla más rápido"),
        ],
    ),
    (
        CommandTag::SpeechSlower,
        &[
            Trigger::Contains("velocidad más lenta"),
            Trigger::Contains("hablar más lento"),
            Trigger::Contains("habla más lento"),
        ],
    ),
    (
        CommandTag::VolumeUp,
        &[
            Trigger::Contains("volumen más alto"),
            Trigger::Contains("subir volumen"),
        ],
    ),
    (
        CommandTag::VolumeDown,
        &[
            Trigger::Contains("volumen más bajo"),
            Trigger::Contains("bajar volumen"),
        ],
    ),
    (CommandTag::ContinuousOff, &[Trigger::Contains("modo normal")]),
    (
        CommandTag::ContinuousToggle,
        &[
            Trigger::Contains("modo continuo"),
            Trigger::Contains("escucha continua"),
        ],
    ),
    (CommandTag::VerboseToggle, &[Trigger::Contains("modo verboso")]),
    (
        CommandTag::Resume,
        &[Trigger::Contains("reanudar"), Trigger::Contains("continuar")],
    ),
    (
        CommandTag::PauseToggle,
        &[Trigger::Contains("pausa"), Trigger::Contains("silencio")],
    ),
    (CommandTag::Help, &[Trigger::Contains("ayuda")]),
    // Short words that also occur inside other words ("restado")
    (
        CommandTag::Status,
        &[Trigger::Word("estado"), Trigger::Word("info")],
    ),
];

/// A trigger ready to test against lower-cased text
enum CompiledTrigger {
    Contains(&'static str),
    Word(Regex),
    AllOf(&'static [&'static str]),
}

impl CompiledTrigger {
    fn compile(trigger: &Trigger) -> Result<Self, regex::Error> {
        Ok(match trigger {
            Trigger::Contains(phrase) => Self::Contains(*phrase),
            Trigger::Word(word) => Self::Word(Regex::new(&format!(
                r"(?i)\b{}\b",
                regex::escape(word)
            ))?),
            Trigger::AllOf(fragments) => Self::AllOf(*fragments),
        })
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            Self::Contains(phrase) => text.contains(phrase),
            Self::Word(pattern) => pattern.is_match(text),
            Self::AllOf(fragments) => fragments.iter().all(|fragment| text.contains(fragment)),
        }
    }
}

static COMPILED_COMMANDS: LazyLock<Vec<(CommandTag, Vec<CompiledTrigger>)>> =
    LazyLock::new(|| {
        COMMANDS
            .iter()
            .map(|(tag, triggers)| {
                let compiled = triggers
                    .iter()
                    .map(CompiledTrigger::compile)
                    .collect::<Result<Vec<_>, _>>()
                    .expect("valid command pattern");
                (*tag, compiled)
            })
            .collect()
    });

/// Classify a normalized transcript
///
/// Keywords match case-insensitively anywhere in the transcript, so
/// inflections such as "ayudame" still count. Only the short status words
/// need a word boundary, so the operator "restado" never reads as "estado".
#[must_use]
pub fn classify(transcript: &str) -> Classification {
    let lowered = transcript.to_lowercase();

    for (tag, triggers) in COMPILED_COMMANDS.iter() {
        if triggers.iter().any(|trigger| trigger.matches(&lowered)) {
            return Classification::Command(*tag);
        }
    }

    Classification::Arithmetic
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_clear_before_read() {
        assert_eq!(
            classify("limpiar historial"),
            Classification::Command(CommandTag::HistoryClear)
        );
        assert_eq!(
            classify("historial"),
            Classification::Command(CommandTag::HistoryRead)
        );
        assert_eq!(
            classify("limpiar el historial por favor"),
            Classification::Command(CommandTag::HistoryClear)
        );
        assert_eq!(
            classify("borrar historial"),
            Classification::Command(CommandTag::HistoryClear)
        );
    }

    #[test]
    fn test_exit_keywords() {
        for text in ["salir", "quiero terminar", "adiós", "chao calculadora", "cerrar"] {
            assert_eq!(classify(text), Classification::Command(CommandTag::Exit), "{text}");
        }
    }

    #[test]
    fn test_arithmetic_falls_through() {
        assert_eq!(classify("5 más 3"), Classification::Arithmetic);
        assert_eq!(classify("raíz cuadrada de 16"), Classification::Arithmetic);
        assert_eq!(classify("resultado más 10"), Classification::Arithmetic);
    }

    #[test]
    fn test_operator_words_do_not_trigger_commands() {
        assert_eq!(classify("10 restado 3"), Classification::Arithmetic);
    }

    #[test]
    fn test_settings_variants() {
        assert_eq!(
            classify("configuración"),
            Classification::Command(CommandTag::Settings)
        );
        assert_eq!(
            classify("guardar configuración"),
            Classification::Command(CommandTag::SaveSettings)
        );
        assert_eq!(
            classify("ajustes"),
            Classification::Command(CommandTag::Settings)
        );
    }

    #[test]
    fn test_result_commands() {
        assert_eq!(
            classify("último resultado"),
            Classification::Command(CommandTag::LastResult)
        );
        assert_eq!(
            classify("borrar resultado"),
            Classification::Command(CommandTag::ClearResult)
        );
        assert_eq!(
            classify("deshacer"),
            Classification::Command(CommandTag::Undo)
        );
    }

    #[test]
    fn test_mode_commands() {
        assert_eq!(
            classify("modo continuo"),
            Classification::Command(CommandTag::ContinuousToggle)
        );
        assert_eq!(
            classify("modo normal"),
            Classification::Command(CommandTag::ContinuousOff)
        );
        assert_eq!(
            classify("pausar"),
            Classification::Command(CommandTag::PauseToggle)
        );
        assert_eq!(
            classify("continuar"),
            Classification::Command(CommandTag::Resume)
        );
    }

    #[test]
    fn test_speech_adjustments() {
        assert_eq!(
            classify("velocidad más rápida"),
            Classification::Command(CommandTag::SpeechFaster)
        );
        assert_eq!(
            classify("volumen más bajo"),
            Classification::Command(CommandTag::VolumeDown)
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("AYUDA"), Classification::Command(CommandTag::Help));
    }

    #[test]
    fn test_inflected_keywords() {
        assert_eq!(classify("ayudame"), Classification::Command(CommandTag::Help));
        assert_eq!(
            classify("necesito ayudarte"),
            Classification::Command(CommandTag::Help)
        );
        assert_eq!(
            classify("quiero salirme"),
            Classification::Command(CommandTag::Exit)
        );
        assert_eq!(classify("cerrarlo"), Classification::Command(CommandTag::Exit));
    }

    #[test]
    fn test_status_needs_whole_word() {
        assert_eq!(
            classify("dime el estado"),
            Classification::Command(CommandTag::Status)
        );
        assert_eq!(classify("info"), Classification::Command(CommandTag::Status));
        assert_eq!(classify("20 restado 5"), Classification::Arithmetic);
    }
}
