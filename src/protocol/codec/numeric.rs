//! Boolean, integer, floating-point and decimal codecs.

use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::protocol::buffer::{ReadBuffer, WriteBuffer};
use crate::protocol::types::{Column, DataType, Value};

use super::{wrong_value, Codec, Decode, EncodeContext, ParameterCodec};

/// Numeric targets read integer, floating, DECIMAL and BIT columns, plus
/// character strings holding a literal. Binary strings are opaque.
fn numeric_compatible(column: &Column) -> bool {
    match column.data_type {
        t if t.is_integer() || t.is_decimal() => true,
        DataType::Float | DataType::Double | DataType::Bit => true,
        t if t.is_string() => !column.is_binary(),
        _ => false,
    }
}

/// SQL has no literal for NaN or the infinities.
fn finite_literal<T: std::fmt::Display>(v: T, finite: bool, target: &'static str) -> Result<String> {
    if finite {
        Ok(v.to_string())
    } else {
        Err(Error::overflow(v.to_string(), target))
    }
}

macro_rules! numeric_codec {
    (
        $(#[$meta:meta])*
        $codec:ident, $t:ty, $variant:ident, $wire:expr,
        text: $decode_text:ident, binary: $decode_binary:ident,
        literal: |$lv:ident| $literal:expr,
        write: |$out:ident, $wv:ident| $write:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $codec;

        impl ParameterCodec for $codec {
            fn type_name(&self) -> &'static str {
                stringify!($t)
            }

            fn can_encode(&self, value: &Value) -> bool {
                matches!(value, Value::$variant(_))
            }

            fn encode_text(
                &self,
                out: &mut WriteBuffer,
                _ctx: &EncodeContext,
                value: &Value,
                _max_length: Option<usize>,
            ) -> Result<()> {
                let Value::$variant($lv) = value else {
                    return Err(wrong_value(self, value));
                };
                out.write_ascii(&$literal);
                Ok(())
            }

            fn encode_binary(
                &self,
                $out: &mut WriteBuffer,
                value: &Value,
                _max_length: Option<usize>,
            ) -> Result<()> {
                let Value::$variant($wv) = value else {
                    return Err(wrong_value(self, value));
                };
                $write;
                Ok(())
            }

            fn binary_encode_type(&self) -> DataType {
                $wire
            }
        }

        impl Codec<$t> for $codec {
            fn can_decode(&self, column: &Column) -> bool {
                numeric_compatible(column)
            }

            fn decode_text(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<$t> {
                column.$decode_text(buf, length)
            }

            fn decode_binary(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<$t> {
                column.$decode_binary(buf, length)
            }
        }

        impl Decode for $t {
            fn codec() -> &'static dyn Codec<Self> {
                &$codec
            }
        }
    };
}

numeric_codec! {
    /// `bool`, bound as TINYINT 1/0.
    BoolCodec, bool, Bool, DataType::Tiny,
    text: decode_bool_text, binary: decode_bool_binary,
    literal: |v| if *v { "1" } else { "0" },
    write: |out, v| out.write_u8(*v as u8)
}

numeric_codec! {
    TinyIntCodec, i8, TinyInt, DataType::Tiny,
    text: decode_i8_text, binary: decode_i8_binary,
    literal: |v| v.to_string(),
    write: |out, v| out.write_u8(*v as u8)
}

numeric_codec! {
    SmallIntCodec, i16, SmallInt, DataType::Short,
    text: decode_i16_text, binary: decode_i16_binary,
    literal: |v| v.to_string(),
    write: |out, v| out.write_u16_le(*v as u16)
}

numeric_codec! {
    IntCodec, i32, Int, DataType::Long,
    text: decode_i32_text, binary: decode_i32_binary,
    literal: |v| v.to_string(),
    write: |out, v| out.write_u32_le(*v as u32)
}

numeric_codec! {
    BigIntCodec, i64, BigInt, DataType::LongLong,
    text: decode_i64_text, binary: decode_i64_binary,
    literal: |v| v.to_string(),
    write: |out, v| out.write_u64_le(*v as u64)
}

numeric_codec! {
    /// Unsigned BIGINT; the unsigned flag travels with the parameter type.
    UnsignedBigIntCodec, u64, UnsignedBigInt, DataType::LongLong,
    text: decode_u64_text, binary: decode_u64_binary,
    literal: |v| v.to_string(),
    write: |out, v| out.write_u64_le(*v)
}

numeric_codec! {
    FloatCodec, f32, Float, DataType::Float,
    text: decode_f32_text, binary: decode_f32_binary,
    literal: |v| finite_literal(v, v.is_finite(), "f32")?,
    write: |out, v| out.write_f32_le(*v)
}

numeric_codec! {
    DoubleCodec, f64, Double, DataType::Double,
    text: decode_f64_text, binary: decode_f64_binary,
    literal: |v| finite_literal(v, v.is_finite(), "f64")?,
    write: |out, v| out.write_f64_le(*v)
}

numeric_codec! {
    /// Exact decimal, sent as its literal in both protocols.
    DecimalCodec, Decimal, Decimal, DataType::NewDecimal,
    text: decode_decimal_text, binary: decode_decimal_binary,
    literal: |v| v.to_string(),
    write: |out, v| out.write_lenenc_bytes(v.to_string().as_bytes())
}
