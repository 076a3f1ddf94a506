//! Text-protocol numeric decoding.
//!
//! Numeric columns in the text protocol (and DECIMAL columns in both
//! protocols) arrive as ASCII literals. Parsing goes through an exact decimal
//! so that a lexically valid literal which does not fit the target is
//! reported as an overflow, never as a parse failure.

use crate::error::{Error, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Check that `text` is `[+-]digits[.digits][(e|E)[+-]digits]` with at
/// least one mantissa digit.
pub fn is_numeric_literal(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let mut mantissa_digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        mantissa_digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            mantissa_digits += 1;
        }
    }
    if mantissa_digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == bytes.len()
}

/// Parse a numeric literal into an exact decimal.
///
/// Excess fractional digits are rounded away; an integer part too large to
/// represent is an overflow of `target`.
pub fn parse_decimal(text: &str, target: &'static str) -> Result<Decimal> {
    if !is_numeric_literal(text) {
        return Err(Error::malformed(text, target));
    }
    let parsed = if text.contains(['e', 'E']) {
        Decimal::from_scientific(text)
    } else {
        Decimal::from_str(text)
    };
    parsed.map_err(|_| Error::overflow(text, target))
}

/// Parse a numeric literal and truncate it toward zero.
pub fn parse_integral(text: &str, target: &'static str) -> Result<i128> {
    let value = parse_decimal(text, target)?.trunc();
    value.to_i128().ok_or_else(|| Error::overflow(text, target))
}

/// Narrow an exact integer to the target width.
pub fn narrow<T: TryFrom<i128>>(value: i128, target: &'static str) -> Result<T> {
    T::try_from(value).map_err(|_| Error::overflow(value.to_string(), target))
}

/// Parse a floating-point literal.
pub fn parse_f64(text: &str, target: &'static str) -> Result<f64> {
    text.parse::<f64>()
        .map_err(|_| Error::malformed(text, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn test_numeric_literal() {
        for ok in ["0", "-1", "+12.5", ".5", "5.", "1e10", "-1.5E-3"] {
            assert!(is_numeric_literal(ok), "{ok}");
        }
        for bad in ["", "-", "abc", "1.2.3", "1e", "e5", "12a", " 1"] {
            assert!(!is_numeric_literal(bad), "{bad}");
        }
    }

    #[test]
    fn test_parse_integral_truncates() {
        assert_eq!(parse_integral("12.9", "i32").unwrap(), 12);
        assert_eq!(parse_integral("-12.9", "i32").unwrap(), -12);
        assert_eq!(parse_integral("1.5e2", "i32").unwrap(), 150);
    }

    #[test]
    fn test_overflow_vs_malformed() {
        let v = parse_integral("300", "i8").unwrap();
        assert_eq!(narrow::<i8>(v, "i8").unwrap_err().kind(), ErrorKind::Overflow);
        assert_eq!(
            parse_integral("3x0", "i8").unwrap_err().kind(),
            ErrorKind::MalformedLiteral
        );
        // Beyond the exact-decimal range is still an overflow
        let huge = "9".repeat(40);
        assert_eq!(
            parse_integral(&huge, "i64").unwrap_err().kind(),
            ErrorKind::Overflow
        );
    }

    #[test]
    fn test_parse_f64() {
        assert_eq!(parse_f64("1.25", "f64").unwrap(), 1.25);
        assert!(parse_f64("x", "f64").is_err());
    }

    proptest! {
        #[test]
        fn prop_integers_parse_exactly(v in any::<i64>()) {
            prop_assert_eq!(parse_integral(&v.to_string(), "i64").unwrap(), v as i128);
        }

        #[test]
        fn prop_narrowing_overflows_outside_range(v in -100_000i64..100_000) {
            let parsed = parse_integral(&v.to_string(), "i8").unwrap();
            match narrow::<i8>(parsed, "i8") {
                Ok(n) => prop_assert_eq!(n as i64, v),
                Err(e) => {
                    prop_assert!(v < i8::MIN as i64 || v > i8::MAX as i64);
                    prop_assert_eq!(e.kind(), ErrorKind::Overflow);
                }
            }
        }
    }
}
