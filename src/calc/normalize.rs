//! Spelled-out number rewriting
//!
//! Turns Spanish number words into digits so operation patterns only need
//! to recognise numerals.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Closed set of number words and their digit form
const NUMBER_WORDS: &[(&str, &str)] = &[
    ("cero", "0"),
    ("uno", "1"),
    ("dos", "2"),
    ("tres", "3"),
    ("cuatro", "4"),
    ("cinco", "5"),
    ("seis", "6"),
    ("siete", "7"),
    ("ocho", "8"),
    ("nueve", "9"),
    ("diez", "10"),
    ("once", "11"),
    ("doce", "12"),
    ("trece", "13"),
    ("catorce", "14"),
    ("quince", "15"),
    ("dieciséis", "16"),
    ("dieciseis", "16"),
    ("diecisiete", "17"),
    ("dieciocho", "18"),
    ("diecinueve", "19"),
    ("veinte", "20"),
    ("treinta", "30"),
    ("cuarenta", "40"),
    ("cincuenta", "50"),
    ("sesenta", "60"),
    ("setenta", "70"),
    ("ochenta", "80"),
    ("noventa", "90"),
    ("cien", "100"),
];

/// One alternation over every number word, longest first, whole words only
static NUMBER_WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let mut words: Vec<&str> = NUMBER_WORDS.iter().map(|(word, _)| *word).collect();
    words.sort_by_key(|word| std::cmp::Reverse(word.chars().count()));
    Regex::new(&format!(r"\b(?:{})\b", words.join("|"))).expect("valid regex")
});

/// Comma used as a decimal separator between digits
static DECIMAL_COMMA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d),(\d)").expect("valid regex"));

/// Normalize a transcript for matching
///
/// Lower-cases the text, rewrites number words to digits and turns decimal
/// commas into dots. Total and deterministic.
#[must_use]
pub fn normalize(text: &str) -> String {
    let lowered = text.trim().to_lowercase();

    let with_digits = NUMBER_WORD_REGEX.replace_all(&lowered, |caps: &Captures<'_>| {
        digits_for(&caps[0]).unwrap_or(&caps[0]).to_string()
    });

    DECIMAL_COMMA_REGEX
        .replace_all(&with_digits, "$1.$2")
        .into_owned()
}

/// Digit form of a single number word
#[must_use]
pub fn digits_for(word: &str) -> Option<&'static str> {
    NUMBER_WORDS
        .iter()
        .find(|(candidate, _)| *candidate == word)
        .map(|(_, digits)| *digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_words() {
        assert_eq!(normalize("cinco más tres"), "5 más 3");
        assert_eq!(normalize("cien entre diez"), "100 entre 10");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(normalize("Cinco MÁS Tres"), "5 más 3");
    }

    #[test]
    fn test_no_partial_word_replacement() {
        // "dos" inside "todos", "once" inside "entonces"
        assert_eq!(normalize("todos entonces"), "todos entonces");
        assert_eq!(normalize("ciento"), "ciento");
    }

    #[test]
    fn test_teens_are_not_corrupted() {
        assert_eq!(normalize("dieciséis menos diez"), "16 menos 10");
        assert_eq!(normalize("diecinueve por dos"), "19 por 2");
        assert_eq!(normalize("dieciseis"), "16");
    }

    #[test]
    fn test_every_occurrence_replaced() {
        assert_eq!(normalize("dos más dos más dos"), "2 más 2 más 2");
    }

    #[test]
    fn test_decimal_comma() {
        assert_eq!(normalize("2,5 por 4"), "2.5 por 4");
        assert_eq!(normalize("hola, calculadora"), "hola, calculadora");
    }

    #[test]
    fn test_digits_pass_through() {
        assert_eq!(normalize("  12 entre 4 "), "12 entre 4");
    }

    #[test]
    fn test_digits_for() {
        assert_eq!(digits_for("noventa"), Some("90"));
        assert_eq!(digits_for("mil"), None);
    }
}
