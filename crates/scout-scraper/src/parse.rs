//! Numeric extraction from free-form page text.
//!
//! Marketplace pages render numbers in Persian or Arabic-Indic digits as
//! often as ASCII, with `,` or `٬` as thousands separators. Everything is
//! folded to ASCII before scanning.

use std::sync::LazyLock;

use regex::Regex;

static DIGIT_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));
static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").expect("valid regex"));

/// Maps Persian (`۰`–`۹`) and Arabic-Indic (`٠`–`٩`) digits to ASCII and the
/// Arabic decimal separator `٫` to `.`. Other characters pass through.
#[must_use]
pub fn fold_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '۰'..='۹' => char::from(b'0' + digit_offset(c, '۰')),
            '٠'..='٩' => char::from(b'0' + digit_offset(c, '٠')),
            '٫' => '.',
            other => other,
        })
        .collect()
}

fn digit_offset(c: char, zero: char) -> u8 {
    u8::try_from(u32::from(c) - u32::from(zero)).unwrap_or(0)
}

/// Parses a price from display text such as `"۲۵۰٬۰۰۰ تومان"` or `"1,250,000"`.
///
/// Thousands separators are stripped and the first run of digits is taken.
/// Returns `0` when no digits are present or the value overflows.
#[must_use]
pub fn parse_price(text: &str) -> u64 {
    let folded: String = fold_digits(text)
        .chars()
        .filter(|c| !matches!(c, ',' | '٬'))
        .collect();

    first_digit_run(&folded)
        .and_then(|run| run.parse::<u64>().ok())
        .unwrap_or(0)
}

/// Parses an average rating from text such as `"4.6 از 5"`.
///
/// Takes the first integer or decimal number; values outside `0.0..=5.0`
/// are rejected and yield `0.0`.
#[must_use]
pub fn parse_rating(text: &str) -> f64 {
    let folded = fold_digits(text);
    DECIMAL_RE
        .find(&folded)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|value| (0.0..=5.0).contains(value))
        .unwrap_or(0.0)
}

fn first_digit_run(text: &str) -> Option<&str> {
    DIGIT_RUN_RE.find(text).map(|m| m.as_str())
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
