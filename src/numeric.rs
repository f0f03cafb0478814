use std::sync::OnceLock;

use fancy_regex::Regex;

fn leading_integer_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\s*([+-]?[0-9]+)").ok())
        .as_ref()
}

/// Reads a base-10 integer from the start of `raw` the way markup-driven form
/// controls are read: leading whitespace and a sign are accepted, anything
/// after the digits is ignored, and text without leading ASCII digits yields
/// `None`. Digits from other scripts (`٣`, `３`) are not numbers here.
///
/// Magnitudes beyond `i64` saturate.
pub(crate) fn parse_int_prefix(raw: &str) -> Option<i64> {
    let captures = leading_integer_pattern()?.captures(raw).ok()??;
    let digits = captures.get(1)?.as_str();
    match digits.parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) if digits.starts_with('-') => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}
