//! Canonical form for free-response answers.
//!
//! Free-response questions in this engine are numeric: an answer is either a
//! single number or a set of discrete integers. Normalization reduces raw input
//! to digits and commas so that formatting, spacing, locale punctuation and the
//! order of listed values do not affect comparison.

use std::borrow::Cow;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Raw answer value as entered by the user or supplied by a question source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAnswer<'a> {
    Text(Cow<'a, str>),
    Integer(i64),
    Float(f64),
}

impl<'a> From<&'a str> for RawAnswer<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(Cow::Borrowed(value))
    }
}

impl<'a> From<&'a String> for RawAnswer<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(Cow::Borrowed(value.as_str()))
    }
}

impl From<String> for RawAnswer<'_> {
    fn from(value: String) -> Self {
        Self::Text(Cow::Owned(value))
    }
}

impl From<i64> for RawAnswer<'_> {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for RawAnswer<'_> {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for RawAnswer<'_> {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Normalize a raw answer into its comparable form.
///
/// Everything except ASCII digits and commas is dropped after NFD
/// decomposition. When a comma survives, the value is treated as a set of
/// integers: tokens that do not parse are discarded and the rest are sorted
/// ascending and rejoined. Never fails; malformed input degrades to a shorter
/// or empty string.
///
/// ```
/// use exam_core::normalize;
///
/// assert_eq!(normalize("3, 1, 2"), "1,2,3");
/// assert_eq!(normalize("  4   "), "4");
/// assert_eq!(normalize(42_i64), "42");
/// ```
#[must_use]
pub fn normalize<'a>(input: impl Into<RawAnswer<'a>>) -> String {
    let text: Cow<'_, str> = match input.into() {
        RawAnswer::Text(text) => text,
        RawAnswer::Integer(value) => Cow::Owned(value.to_string()),
        RawAnswer::Float(value) => Cow::Owned(value.to_string()),
    };

    let kept: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();

    if !kept.contains(',') {
        return kept;
    }

    let mut values: Vec<u64> = kept
        .split(',')
        .filter_map(|token| token.parse::<u64>().ok())
        .collect();
    values.sort_unstable();

    values
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
