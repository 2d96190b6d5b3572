//! Text-to-number normalization for scraped fragments
//!
//! Fragments such as "4.8 out of 5 stars" or "10,000+ sold" carry more than one
//! number and plenty of noise. Both rules take the first numeric run instead of
//! blindly stripping characters, so "5 stars" never leaks into a rating.

use std::sync::LazyLock;

use regex::Regex;

/// First decimal run; commas inside the run are grouping separators
static DECIMAL_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9][0-9,]*(?:\.[0-9]+)?|\.[0-9]+").expect("valid decimal run pattern")
});

/// First integer run: a thousands-grouped number or a plain digit run
static INTEGER_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{1,3}(?:[,.][0-9]{3})+|[0-9]+").expect("valid integer run pattern")
});

/// Largest integer an `f64` holds exactly; anything above it reads as overflow
pub const MAX_EXACT_INTEGER: u64 = (1 << 53) - 1;

/// Numeric interpretation applied to a raw fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Integer,
    Decimal,
}

/// Normalize a fragment to a non-negative finite number; 0 when nothing parses
pub fn normalize_number(text: &str, kind: NumericKind) -> f64 {
    match kind {
        NumericKind::Decimal => normalize_decimal(text),
        NumericKind::Integer => normalize_integer(text) as f64,
    }
}

pub fn normalize_decimal(text: &str) -> f64 {
    let Some(run) = DECIMAL_RUN.find(text) else {
        return 0.0;
    };

    match run.as_str().replace(',', "").parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => 0.0,
    }
}

/// Every non-digit character of the run is dropped, so "1,234", "1.234" and
/// "10,000+" all read as plain integers. Values above `MAX_EXACT_INTEGER`
/// read as 0 so the result survives a round trip through `f64`.
pub fn normalize_integer(text: &str) -> u64 {
    let Some(run) = INTEGER_RUN.find(text) else {
        return 0;
    };

    let digits: String = run.as_str().chars().filter(char::is_ascii_digit).collect();
    digits
        .parse::<u64>()
        .ok()
        .filter(|value| *value <= MAX_EXACT_INTEGER)
        .unwrap_or(0)
}

/// Whether the fragment contains anything a numeric rule can read
pub fn has_numeric_run(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}

/// Collapse runs of whitespace and trim, for text fields
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("4.8 out of 5 stars", 4.8)]
    #[case("4.8", 4.8)]
    #[case("Rating: 4.5/5", 4.5)]
    #[case("US $1,299.99", 1299.99)]
    #[case("€12.50", 12.5)]
    #[case(" 5 ", 5.0)]
    #[case("", 0.0)]
    #[case("N/A", 0.0)]
    #[case("...", 0.0)]
    #[case("$.99", 0.99)]
    fn test_normalize_decimal(#[case] input: &str, #[case] expected: f64) {
        assert!((normalize_decimal(input) - expected).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case("1,234 sold", 1234)]
    #[case("10,000+ sold", 10_000)]
    #[case("5000+ orders", 5000)]
    #[case("1.234 vendidos", 1234)]
    #[case("(87 Reviews)", 87)]
    #[case("0 sold", 0)]
    #[case("4.8", 4)]
    #[case("", 0)]
    #[case("sold out", 0)]
    #[case("99999999999999999999999 sold", 0)]
    #[case("18446744073709551615 sold", 0)]
    #[case("9007199254740991 sold", MAX_EXACT_INTEGER)]
    #[case("9007199254740992 sold", 0)]
    fn test_normalize_integer(#[case] input: &str, #[case] expected: u64) {
        assert_eq!(normalize_integer(input), expected);
    }

    #[test]
    fn test_normalize_number_dispatch() {
        assert!((normalize_number("4.8 out of 5 stars", NumericKind::Decimal) - 4.8).abs() < f64::EPSILON);
        assert!((normalize_number("1,234 sold", NumericKind::Integer) - 1234.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_integer_at_u64_limit_is_stable() {
        let once = normalize_number("18446744073709551615 sold", NumericKind::Integer);
        let twice = normalize_number(&once.to_string(), NumericKind::Integer);
        assert!((once - twice).abs() < f64::EPSILON);

        let largest = normalize_number("9,007,199,254,740,991", NumericKind::Integer);
        assert_eq!(largest.to_string(), "9007199254740991");
    }

    #[test]
    fn test_has_numeric_run() {
        assert!(has_numeric_run("1,234 sold"));
        assert!(!has_numeric_run("no reviews yet"));
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Wireless\n   Earbuds  Pro "), "Wireless Earbuds Pro");
    }

    proptest! {
        #[test]
        fn prop_decimal_is_idempotent(text in "[a-z $,.+%/]{0,8}([0-9]{1,3}[,.]?){0,4}[a-z $%+]{0,8}") {
            let once = normalize_number(&text, NumericKind::Decimal);
            let twice = normalize_number(&once.to_string(), NumericKind::Decimal);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_integer_is_idempotent(text in "[a-z $,.+%/]{0,8}([0-9]{1,3}[,.]?){0,4}[a-z $%+]{0,8}") {
            let once = normalize_number(&text, NumericKind::Integer);
            let twice = normalize_number(&once.to_string(), NumericKind::Integer);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_long_integer_runs_are_idempotent(text in "[a-z $+]{0,4}[0-9]{1,24}[a-z +]{0,6}") {
            let once = normalize_number(&text, NumericKind::Integer);
            let twice = normalize_number(&once.to_string(), NumericKind::Integer);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_results_are_finite_and_non_negative(text in ".{0,64}") {
            let decimal = normalize_number(&text, NumericKind::Decimal);
            let integer = normalize_number(&text, NumericKind::Integer);
            prop_assert!(decimal.is_finite() && decimal >= 0.0);
            prop_assert!(integer.is_finite() && integer >= 0.0);
        }
    }
}
