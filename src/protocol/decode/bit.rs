//! BIT column decoder.
//!
//! BIT(n) values travel as a raw big-endian byte run of `ceil(n / 8)` bytes
//! in both protocols.

/// Render a BIT value as the shortest binary literal `b'...'`.
///
/// Bits are emitted most significant first; leading zero bits are dropped
/// up to the first set bit, so an all-zero value renders as `b''`.
pub fn render_bit_literal(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 8 + 3);
    out.push_str("b'");
    let mut seen_one = false;
    for byte in bytes {
        for shift in (0..8).rev() {
            if byte & (1 << shift) != 0 {
                out.push('1');
                seen_one = true;
            } else if seen_one {
                out.push('0');
            }
        }
    }
    out.push('\'');
    out
}

/// Unsigned integer value of a BIT run (the low 64 bits).
pub fn bit_value(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_render_zero() {
        assert_eq!(render_bit_literal(&[]), "b''");
        assert_eq!(render_bit_literal(&[0, 0]), "b''");
    }

    #[test]
    fn test_render_small() {
        assert_eq!(render_bit_literal(&[0b0000_0101]), "b'101'");
        assert_eq!(render_bit_literal(&[0x01, 0x00]), "b'100000000'");
    }

    #[test]
    fn test_bit_value() {
        assert_eq!(bit_value(&[0x01, 0x02]), 0x0102);
        assert_eq!(bit_value(&[]), 0);
    }

    proptest! {
        #[test]
        fn prop_render_matches_binary_formatting(v in any::<u64>()) {
            let expected = if v == 0 { "b''".to_string() } else { format!("b'{:b}'", v) };
            prop_assert_eq!(render_bit_literal(&v.to_be_bytes()), expected);
            prop_assert_eq!(bit_value(&v.to_be_bytes()), v);
        }
    }
}
