//! Speech-friendly number formatting

/// Distance from the nearest integer under which a value counts as integral
const INTEGRAL_TOLERANCE: f64 = 1e-10;

/// Format a finite result for speech
///
/// Values within `1e-10` of an integer are spoken as that integer. Anything
/// else gets `precision` decimals with trailing zeros (and a bare trailing
/// point) removed.
#[must_use]
pub fn format_result(value: f64, precision: usize) -> String {
    let rounded = value.round();
    if (value - rounded).abs() < INTEGRAL_TOLERANCE {
        return without_negative_zero(format!("{rounded:.0}"));
    }

    let fixed = format!("{value:.precision$}");
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };

    without_negative_zero(trimmed.to_string())
}

fn without_negative_zero(text: String) -> String {
    if text == "-0" { "0".to_string() } else { text }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_values() {
        assert_eq!(format_result(5.0, 4), "5");
        assert_eq!(format_result(3.000_000_000_1, 4), "3");
        assert_eq!(format_result(-12.0, 4), "-12");
        assert_eq!(format_result(0.0, 4), "0");
    }

    #[test]
    fn test_fractional_values() {
        assert_eq!(format_result(2.5, 4), "2.5");
        assert_eq!(format_result(1.0 / 3.0, 4), "0.3333");
        assert_eq!(format_result(-0.126, 2), "-0.13");
    }

    #[test]
    fn test_rounding_to_whole_after_precision() {
        assert_eq!(format_result(2.999_99, 2), "3");
        assert_eq!(format_result(0.4, 0), "0");
    }

    #[test]
    fn test_no_negative_zero() {
        assert_eq!(format_result(-0.0, 4), "0");
        assert_eq!(format_result(-0.000_01, 2), "0");
    }

    #[test]
    fn test_large_values() {
        assert_eq!(format_result(1e20, 4), "100000000000000000000");
    }
}
