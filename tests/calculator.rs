//! Calculator core integration tests
//!
//! Drives the dispatcher with transcripts and checks values, replies and
//! session state.

use calculadora_voz::calc::{HISTORY_CAPACITY, normalize};
use calculadora_voz::{
    Classification, CommandTag, Config, OperationMatcher, Outcome, SessionState, classify,
    format_result, handle_transcript,
};

mod common;
use common::dispatcher;

fn value_of(text: &str) -> Option<f64> {
    dispatcher().handle(text).value()
}

#[test]
fn test_addition_updates_last_result() {
    for (a, b) in [(0, 0), (1, 2), (17, 25), (999, 1)] {
        let mut d = dispatcher();
        let outcome = d.handle(&format!("{a} más {b}"));
        let expected = f64::from(a + b);

        assert_eq!(outcome.value(), Some(expected));
        assert!((d.state().last_result() - expected).abs() < f64::EPSILON);
    }
}

#[test]
fn test_division_trims_integral_result() {
    let outcome = dispatcher().handle("20 entre 4");
    assert_eq!(outcome.value(), Some(5.0));
    assert_eq!(outcome.spoken_reply(), "El resultado de la división es 5");
}

#[test]
fn test_division_by_zero_keeps_last_result() {
    let mut d = dispatcher();
    d.handle("3 por 3");

    let outcome = d.handle("10 entre 0");
    assert!(matches!(outcome, Outcome::Failure { .. }));
    assert!((d.state().last_result() - 9.0).abs() < f64::EPSILON);
    assert_eq!(d.state().history().len(), 1);
}

#[test]
fn test_square_root() {
    assert_eq!(value_of("raíz cuadrada de 16"), Some(4.0));
    assert_eq!(value_of("raíz cuadrada de dieciséis"), Some(4.0));
}

#[test]
fn test_logarithm_domain() {
    let mut d = dispatcher();
    assert!(matches!(d.handle("logaritmo de -5"), Outcome::Failure { .. }));
    assert!(matches!(d.handle("logaritmo de 0"), Outcome::Failure { .. }));
    assert!(d.state().history().is_empty());

    assert_eq!(d.handle("logaritmo de 100").value(), Some(2.0));
}

#[test]
fn test_factorial_domain() {
    let mut d = dispatcher();
    let outcome = d.handle("factorial de 171");
    assert_eq!(
        outcome.spoken_reply(),
        "Error: El factorial solo está disponible entre 0 y 170"
    );
    assert_eq!(d.handle("factorial de 5").value(), Some(120.0));
}

#[test]
fn test_previous_result_sequence() {
    let mut d = dispatcher();
    assert_eq!(d.handle("5 más 3").value(), Some(8.0));
    assert_eq!(d.handle("resultado más 10").value(), Some(18.0));
    assert_eq!(d.handle("anterior por 2").value(), Some(36.0));
    assert_eq!(d.handle("resultado menos 6").value(), Some(30.0));
}

#[test]
fn test_history_keeps_most_recent() {
    let mut d = dispatcher();
    for n in 1..=60 {
        assert!(matches!(
            d.handle(&format!("{n} más 0")),
            Outcome::Success { .. }
        ));
    }

    let history = d.state().history();
    assert_eq!(history.len(), HISTORY_CAPACITY);
    let inputs: Vec<&str> = history.iter().map(|e| e.input.as_str()).collect();
    assert_eq!(inputs.first(), Some(&"11 más 0"));
    assert_eq!(inputs.last(), Some(&"60 más 0"));
    assert!(
        history
            .iter()
            .zip(history.iter().skip(1))
            .all(|(a, b)| a.result < b.result)
    );
}

#[test]
fn test_number_words_match_digits() {
    assert_eq!(normalize("cinco más tres"), "5 más 3");

    let matcher = OperationMatcher::standard();
    let from_words = matcher.evaluate(&normalize("cinco más tres"), 0.0);
    let from_digits = matcher.evaluate("5 más 3", 0.0);
    assert_eq!(from_words, from_digits);
    assert_eq!(value_of("cinco más tres"), value_of("5 más 3"));
}

#[test]
fn test_history_commands_classified() {
    assert_eq!(
        classify("limpiar historial"),
        Classification::Command(CommandTag::HistoryClear)
    );
    assert_eq!(
        classify("historial"),
        Classification::Command(CommandTag::HistoryRead)
    );
}

#[test]
fn test_formatting() {
    assert_eq!(format_result(3.000_000_000_1, 4), "3");
    assert_eq!(format_result(2.5, 4), "2.5");
}

#[test]
fn test_explicit_state_is_threaded() {
    let mut state = SessionState::new();
    let mut config = Config::default();

    handle_transcript("dos elevado a ocho", &mut state, &mut config);
    let outcome = handle_transcript("resultado más 1", &mut state, &mut config);

    assert_eq!(outcome.value(), Some(257.0));
    assert_eq!(state.history().len(), 2);
}

#[test]
fn test_operation_coverage() {
    let cases = [
        ("quince menos cuatro", 11.0),
        ("seis multiplicado por siete", 42.0),
        ("nueve dividido por tres", 3.0),
        ("raíz cúbica de -27", -3.0),
        ("coseno de 0", 1.0),
        ("seno de 90", 1.0),
        ("tangente de 45", 1.0),
        ("20 por ciento de 50", 10.0),
        ("100 grados a fahrenheit", 212.0),
        ("32 grados fahrenheit a celsius", 0.0),
    ];

    for (text, expected) in cases {
        let value = value_of(text).unwrap_or_else(|| panic!("no value for {text}"));
        assert!((value - expected).abs() < 1e-9, "{text} gave {value}");
    }
}

#[test]
fn test_unrecognized_leaves_state() {
    let mut d = dispatcher();
    d.handle("2 más 2");

    let outcome = d.handle("cuéntame un chiste");
    assert!(matches!(outcome, Outcome::Unrecognized { .. }));
    assert!((d.state().last_result() - 4.0).abs() < f64::EPSILON);
    assert_eq!(d.state().history().len(), 1);
}
