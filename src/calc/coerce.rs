//! Best-effort conversion of raw sensor states into numbers.

/// State tokens that mean "no reading" rather than a number.
///
/// Compared after trimming and lowercasing the raw text.
pub const SENTINEL_TOKENS: &[&str] = &["unknown", "unavailable", "none", "nan"];

/// Raw state value as reported by the host.
///
/// Hosts report states as numbers, numeric text, sentinel tokens, or nothing
/// at all. [`coerce`] maps every variant to `Option<f64>`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NumberLike {
    /// No state reported.
    #[default]
    Absent,
    /// Integer state.
    Int(i64),
    /// Floating-point state.
    Float(f64),
    /// Textual state, possibly numeric.
    Text(String),
    /// Boolean state, read as `1.0` or `0.0`.
    Bool(bool),
}

impl NumberLike {
    /// Shorthand for [`coerce`].
    pub fn as_f64(&self) -> Option<f64> {
        coerce(self)
    }

    /// Returns `true` for [`NumberLike::Absent`].
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl From<f64> for NumberLike {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for NumberLike {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<i64> for NumberLike {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for NumberLike {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for NumberLike {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for NumberLike {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for NumberLike {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for NumberLike {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<NumberLike>> From<Option<T>> for NumberLike {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// Converts a raw state into a float, or `None` when it carries no number.
///
/// - Numbers pass through unchanged (integers are widened to `f64`).
/// - Text is trimmed and lowercased; [`SENTINEL_TOKENS`] yield `None`,
///   anything else is parsed as a decimal float (sign and exponent allowed).
/// - Booleans count as `1.0` and `0.0`.
/// - Unparseable text and [`NumberLike::Absent`] yield `None`.
///
/// Never panics.
///
/// # Examples
///
/// ```
/// use powermix::calc::coerce::{NumberLike, coerce};
///
/// assert_eq!(coerce(&NumberLike::from(" 42.5 ")), Some(42.5));
/// assert_eq!(coerce(&NumberLike::from("Unavailable")), None);
/// assert_eq!(coerce(&NumberLike::from(10)), Some(10.0));
/// ```
pub fn coerce(value: &NumberLike) -> Option<f64> {
    match value {
        NumberLike::Absent => None,
        NumberLike::Bool(b) => Some(f64::from(u8::from(*b))),
        NumberLike::Int(i) => Some(*i as f64),
        NumberLike::Float(f) => Some(*f),
        NumberLike::Text(raw) => parse_text(raw),
    }
}

fn parse_text(raw: &str) -> Option<f64> {
    let text = raw.trim().to_lowercase();
    if SENTINEL_TOKENS.contains(&text.as_str()) {
        return None;
    }
    text.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_pass_through() {
        assert_eq!(coerce(&NumberLike::from(10)), Some(10.0));
        assert_eq!(coerce(&NumberLike::from(2.75)), Some(2.75));
        assert_eq!(coerce(&NumberLike::from(-7_i64)), Some(-7.0));
    }

    #[test]
    fn numeric_text_is_parsed() {
        assert_eq!(coerce(&NumberLike::from("42.5")), Some(42.5));
        assert_eq!(coerce(&NumberLike::from("  -12 ")), Some(-12.0));
        assert_eq!(coerce(&NumberLike::from("1e3")), Some(1000.0));
        assert_eq!(coerce(&NumberLike::from("+2.5E-1")), Some(0.25));
        assert_eq!(coerce(&NumberLike::from(".5")), Some(0.5));
    }

    #[test]
    fn underscore_digit_separators_are_rejected() {
        assert_eq!(coerce(&NumberLike::from("1_000")), None);
        assert_eq!(coerce(&NumberLike::from("1000")), Some(1000.0));
    }

    #[test]
    fn sentinels_are_absent_regardless_of_case_and_padding() {
        for token in [" unknown ", "UNAVAILABLE", "None", "NaN", "\tunknown\n"] {
            assert_eq!(coerce(&NumberLike::from(token)), None, "token {token:?}");
        }
    }

    #[test]
    fn garbage_and_absent_are_absent() {
        assert_eq!(coerce(&NumberLike::from("garbage")), None);
        assert_eq!(coerce(&NumberLike::from("")), None);
        assert_eq!(coerce(&NumberLike::from("12 W")), None);
        assert_eq!(coerce(&NumberLike::Absent), None);
    }

    #[test]
    fn booleans_count_as_one_and_zero() {
        assert_eq!(coerce(&NumberLike::from(true)), Some(1.0));
        assert_eq!(coerce(&NumberLike::from(false)), Some(0.0));
    }

    #[test]
    fn option_conversion_maps_none_to_absent() {
        assert!(NumberLike::from(None::<f64>).is_absent());
        assert_eq!(NumberLike::from(Some("5")).as_f64(), Some(5.0));
    }

    #[test]
    fn infinity_text_parses_like_a_float() {
        assert_eq!(coerce(&NumberLike::from("inf")), Some(f64::INFINITY));
        assert_eq!(coerce(&NumberLike::from("-Infinity")), Some(f64::NEG_INFINITY));
    }
}
