//! Per-target field decoding on [`Column`].
//!
//! Each target has a text-protocol and a binary-protocol entry point; both
//! consume exactly `length` bytes of the field. Whether a target is
//! reachable is decided by the column's wire type and its binary charset:
//! binary string columns hold opaque bytes and never decode to numbers or
//! booleans.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::constants::{ZERO_DATE, ZERO_DATETIME};
use crate::protocol::decode::{
    bit_value, narrow, parse_date_text, parse_datetime_text, parse_decimal, parse_f64,
    parse_integral, parse_time_text, read_geometry, render_bit_literal, BinaryDateTime,
    BinaryTime, ZeroDatePolicy,
};

use super::column::Column;
use super::data_type::DataType;
use super::geometry::Geometry;
use super::value::Value;

/// Row encoding a field was sent in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Query results: every value is a length-encoded string.
    Text,
    /// Prepared-statement results: fixed or length-prefixed binary layouts.
    Binary,
}

/// Decode behavior shared by groups of wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Integer,
    Float,
    Decimal,
    Text,
    Bytes,
    Bit,
    Date,
    Time,
    Geometry,
    Null,
}

impl Column {
    fn family(&self) -> Family {
        match self.data_type {
            t if t.is_integer() => Family::Integer,
            DataType::Float | DataType::Double => Family::Float,
            t if t.is_decimal() => Family::Decimal,
            t if t.is_string() => {
                if self.is_binary() {
                    Family::Bytes
                } else {
                    Family::Text
                }
            }
            DataType::Bit => Family::Bit,
            t if t.is_date() => Family::Date,
            DataType::Time => Family::Time,
            DataType::Geometry => Family::Geometry,
            _ => Family::Null,
        }
    }

    /// Skip the rest of the field and report the target as unreachable.
    fn mismatch(&self, buf: &mut ReadBuffer, length: usize, target: &'static str) -> Error {
        let _ = buf.skip(length.min(buf.remaining()));
        Error::type_mismatch(self.data_type, target)
    }

    /// Exact integer value of a field carried as text, DECIMAL or BIT.
    fn integral_text(&self, buf: &mut ReadBuffer, length: usize, target: &'static str) -> Result<i128> {
        match self.family() {
            Family::Integer | Family::Float | Family::Decimal | Family::Text => {
                let text = buf.read_string(length)?;
                parse_integral(&text, target)
            }
            Family::Bit => Ok(bit_value(&buf.read_bytes(length)?) as i128),
            _ => Err(self.mismatch(buf, length, target)),
        }
    }

    /// Exact integer value of a binary-protocol field.
    fn integral_binary(&self, buf: &mut ReadBuffer, length: usize, target: &'static str) -> Result<i128> {
        let signed = self.is_signed();
        Ok(match self.data_type {
            DataType::Tiny if signed => buf.read_i8()? as i128,
            DataType::Tiny => buf.read_u8()? as i128,
            DataType::Short if signed => buf.read_i16_le()? as i128,
            DataType::Short | DataType::Year => buf.read_u16_le()? as i128,
            DataType::Int24 => {
                let v = if signed {
                    buf.read_i24_le()? as i128
                } else {
                    buf.read_u24_le()? as i128
                };
                // MEDIUMINT travels on 4 bytes
                buf.skip(1)?;
                v
            }
            DataType::Long if signed => buf.read_i32_le()? as i128,
            DataType::Long => buf.read_u32_le()? as i128,
            DataType::LongLong if signed => buf.read_i64_le()? as i128,
            DataType::LongLong => buf.read_u64_le()? as i128,
            DataType::Float => float_to_integral(buf.read_f32_le()? as f64, target)?,
            DataType::Double => float_to_integral(buf.read_f64_le()?, target)?,
            _ => return self.integral_text(buf, length, target),
        })
    }

    fn integral(&self, buf: &mut ReadBuffer, length: usize, protocol: Protocol, target: &'static str) -> Result<i128> {
        match protocol {
            Protocol::Text => self.integral_text(buf, length, target),
            Protocol::Binary => self.integral_binary(buf, length, target),
        }
    }

    fn decode_bool(&self, buf: &mut ReadBuffer, length: usize, protocol: Protocol) -> Result<bool> {
        match (self.family(), protocol) {
            (Family::Text, _) => Ok(buf.read_string(length)? != "0"),
            (Family::Bit, _) => Ok(bit_value(&buf.read_bytes(length)?) != 0),
            (Family::Integer, _) => Ok(self.integral(buf, length, protocol, "bool")? != 0),
            (Family::Float, Protocol::Binary) => Ok(self.decode_f64(buf, length, protocol)? != 0.0),
            (Family::Float | Family::Decimal, _) => {
                let text = buf.read_string(length)?;
                Ok(!parse_decimal(&text, "bool")?.is_zero())
            }
            _ => Err(self.mismatch(buf, length, "bool")),
        }
    }

    /// BIT columns yield their first byte; any remaining bytes are skipped.
    fn decode_i8(&self, buf: &mut ReadBuffer, length: usize, protocol: Protocol) -> Result<i8> {
        if self.data_type == DataType::Bit {
            if length == 0 {
                return Err(Error::malformed("", "i8"));
            }
            let b = buf.read_i8()?;
            buf.skip(length - 1)?;
            return Ok(b);
        }
        narrow(self.integral(buf, length, protocol, "i8")?, "i8")
    }

    fn decode_i16(&self, buf: &mut ReadBuffer, length: usize, protocol: Protocol) -> Result<i16> {
        narrow(self.integral(buf, length, protocol, "i16")?, "i16")
    }

    fn decode_i32(&self, buf: &mut ReadBuffer, length: usize, protocol: Protocol) -> Result<i32> {
        narrow(self.integral(buf, length, protocol, "i32")?, "i32")
    }

    fn decode_i64(&self, buf: &mut ReadBuffer, length: usize, protocol: Protocol) -> Result<i64> {
        narrow(self.integral(buf, length, protocol, "i64")?, "i64")
    }

    fn decode_u64(&self, buf: &mut ReadBuffer, length: usize, protocol: Protocol) -> Result<u64> {
        narrow(self.integral(buf, length, protocol, "u64")?, "u64")
    }

    fn decode_f64(&self, buf: &mut ReadBuffer, length: usize, protocol: Protocol) -> Result<f64> {
        match (self.family(), protocol) {
            (Family::Integer, Protocol::Binary) => Ok(self.integral_binary(buf, length, "f64")? as f64),
            (Family::Float, Protocol::Binary) => match self.data_type {
                DataType::Float => Ok(buf.read_f32_le()? as f64),
                _ => buf.read_f64_le(),
            },
            (Family::Integer | Family::Float | Family::Decimal | Family::Text, _) => {
                let text = buf.read_string(length)?;
                parse_f64(&text, "f64")
            }
            (Family::Bit, _) => Ok(bit_value(&buf.read_bytes(length)?) as f64),
            _ => Err(self.mismatch(buf, length, "f64")),
        }
    }

    fn decode_f32(&self, buf: &mut ReadBuffer, length: usize, protocol: Protocol) -> Result<f32> {
        if self.data_type == DataType::Float && protocol == Protocol::Binary {
            return buf.read_f32_le();
        }
        match self.family() {
            Family::Bytes | Family::Date | Family::Time | Family::Geometry | Family::Null => {
                Err(self.mismatch(buf, length, "f32"))
            }
            _ => Ok(self.decode_f64(buf, length, protocol)? as f32),
        }
    }

    fn decode_decimal(&self, buf: &mut ReadBuffer, length: usize, protocol: Protocol) -> Result<Decimal> {
        match (self.family(), protocol) {
            (Family::Integer, Protocol::Binary) => {
                let v = self.integral_binary(buf, length, "Decimal")?;
                Decimal::try_from_i128_with_scale(v, 0)
                    .map_err(|_| Error::overflow(v.to_string(), "Decimal"))
            }
            (Family::Float, Protocol::Binary) => {
                let v = self.decode_f64(buf, length, protocol)?;
                Decimal::from_f64(v).ok_or_else(|| Error::overflow(v.to_string(), "Decimal"))
            }
            (Family::Integer | Family::Float | Family::Decimal | Family::Text, _) => {
                let text = buf.read_string(length)?;
                parse_decimal(&text, "Decimal")
            }
            (Family::Bit, _) => Ok(Decimal::from(bit_value(&buf.read_bytes(length)?))),
            _ => Err(self.mismatch(buf, length, "Decimal")),
        }
    }

    fn decode_string(&self, buf: &mut ReadBuffer, length: usize, protocol: Protocol) -> Result<String> {
        match self.family() {
            Family::Bit => return Ok(render_bit_literal(&buf.read_bytes(length)?)),
            Family::Geometry | Family::Null => return Err(self.mismatch(buf, length, "String")),
            _ if protocol == Protocol::Text => {
                let text = buf.read_string(length)?;
                if self.data_type.is_date()
                    && self.zero_date_policy == ZeroDatePolicy::Reject
                    && text.starts_with(ZERO_DATE)
                {
                    return Err(Error::malformed(text, "String"));
                }
                return Ok(text);
            }
            _ => {}
        }
        match self.data_type {
            DataType::Year => {
                let year = buf.read_u16_le()?;
                Ok(format!("{:0>width$}", year, width = self.column_length as usize))
            }
            t if t.is_integer() => Ok(self.integral_binary(buf, length, "String")?.to_string()),
            DataType::Float => Ok(buf.read_f32_le()?.to_string()),
            DataType::Double => Ok(buf.read_f64_le()?.to_string()),
            DataType::Time => Ok(BinaryTime::read(buf, length)?.render(length, self.decimals)),
            DataType::Date | DataType::NewDate => {
                BinaryDateTime::read(buf, length)?.render_date(length, self.zero_date_policy)
            }
            DataType::DateTime | DataType::Timestamp => BinaryDateTime::read(buf, length)?
                .render_datetime(length, self.decimals, self.zero_date_policy),
            _ => buf.read_string(length),
        }
    }

    fn decode_bytes(&self, buf: &mut ReadBuffer, length: usize, _protocol: Protocol) -> Result<Vec<u8>> {
        match self.family() {
            Family::Bit | Family::Text | Family::Bytes | Family::Geometry => buf.read_vec(length),
            _ => Err(self.mismatch(buf, length, "Vec<u8>")),
        }
    }

    /// Binary DATE/DATETIME field; all-zero calendar fields have no typed value.
    fn binary_calendar(&self, buf: &mut ReadBuffer, length: usize, target: &'static str) -> Result<BinaryDateTime> {
        let dt = BinaryDateTime::read(buf, length)?;
        if dt.is_zero_date() {
            let literal = match self.data_type {
                DataType::Date | DataType::NewDate => ZERO_DATE,
                _ => ZERO_DATETIME,
            };
            return Err(Error::malformed(literal, target));
        }
        Ok(dt)
    }

    fn decode_date(&self, buf: &mut ReadBuffer, length: usize, protocol: Protocol) -> Result<NaiveDate> {
        match (self.family(), protocol) {
            (Family::Date, Protocol::Binary) => {
                let dt = self.binary_calendar(buf, length, "NaiveDate")?;
                dt.to_date()
                    .ok_or_else(|| Error::malformed(format!("{:?}", dt), "NaiveDate"))
            }
            (Family::Date | Family::Text, _) => {
                let text = buf.read_string(length)?;
                parse_date_text(&text, "NaiveDate")
            }
            _ => Err(self.mismatch(buf, length, "NaiveDate")),
        }
    }

    fn decode_datetime(&self, buf: &mut ReadBuffer, length: usize, protocol: Protocol) -> Result<NaiveDateTime> {
        match (self.family(), protocol) {
            (Family::Date, Protocol::Binary) => {
                let dt = self.binary_calendar(buf, length, "NaiveDateTime")?;
                dt.to_datetime()
                    .ok_or_else(|| Error::malformed(format!("{:?}", dt), "NaiveDateTime"))
            }
            (Family::Date | Family::Text, _) => {
                let text = buf.read_string(length)?;
                parse_datetime_text(&text, "NaiveDateTime")
            }
            _ => Err(self.mismatch(buf, length, "NaiveDateTime")),
        }
    }

    fn decode_time(&self, buf: &mut ReadBuffer, length: usize, protocol: Protocol) -> Result<Duration> {
        match (self.family(), protocol) {
            (Family::Time, Protocol::Binary) => Ok(BinaryTime::read(buf, length)?.to_duration()),
            (Family::Time | Family::Text, _) => {
                let text = buf.read_string(length)?;
                parse_time_text(&text, "Duration")
            }
            _ => Err(self.mismatch(buf, length, "Duration")),
        }
    }

    /// GEOMETRY fields carry the SRID-prefixed WKB body in both protocols.
    fn decode_geometry(&self, buf: &mut ReadBuffer, length: usize, _protocol: Protocol) -> Result<Geometry> {
        if self.family() != Family::Geometry {
            return Err(self.mismatch(buf, length, "Geometry"));
        }
        read_geometry(buf, length)
    }

    /// Text-protocol zero date: the literal or a rejection, per policy.
    fn zero_date_text(&self, text: String) -> Result<Value> {
        match self.zero_date_policy {
            ZeroDatePolicy::RenderAsZeroLiteral => Ok(Value::String(text)),
            ZeroDatePolicy::Reject => Err(Error::malformed(text, "Value")),
        }
    }

    fn decode_default(&self, buf: &mut ReadBuffer, length: usize, protocol: Protocol) -> Result<Value> {
        let signed = self.is_signed();
        Ok(match self.data_type {
            DataType::Tiny if signed => Value::TinyInt(self.decode_i8(buf, length, protocol)?),
            DataType::Tiny | DataType::Year => Value::SmallInt(self.decode_i16(buf, length, protocol)?),
            DataType::Short if signed => Value::SmallInt(self.decode_i16(buf, length, protocol)?),
            DataType::Short | DataType::Int24 => Value::Int(self.decode_i32(buf, length, protocol)?),
            DataType::Long if signed => Value::Int(self.decode_i32(buf, length, protocol)?),
            DataType::Long => Value::BigInt(self.decode_i64(buf, length, protocol)?),
            DataType::LongLong if signed => Value::BigInt(self.decode_i64(buf, length, protocol)?),
            DataType::LongLong => Value::UnsignedBigInt(self.decode_u64(buf, length, protocol)?),
            DataType::Float => Value::Float(self.decode_f32(buf, length, protocol)?),
            DataType::Double => Value::Double(self.decode_f64(buf, length, protocol)?),
            DataType::OldDecimal | DataType::NewDecimal => {
                Value::Decimal(self.decode_decimal(buf, length, protocol)?)
            }
            DataType::Bit if self.column_length == 1 => Value::Bool(self.decode_bool(buf, length, protocol)?),
            DataType::Bit => Value::Bytes(self.decode_bytes(buf, length, protocol)?),
            DataType::Time => Value::Time(self.decode_time(buf, length, protocol)?),
            t if t.is_date() => match protocol {
                Protocol::Text => {
                    let text = buf.read_string(length)?;
                    if text.starts_with(ZERO_DATE) {
                        return self.zero_date_text(text);
                    }
                    let mut field = ReadBuffer::from_slice(text.as_bytes());
                    match t {
                        DataType::Date | DataType::NewDate => Value::Date(self.decode_date(&mut field, text.len(), protocol)?),
                        _ => Value::DateTime(self.decode_datetime(&mut field, text.len(), protocol)?),
                    }
                }
                Protocol::Binary => {
                    let dt = BinaryDateTime::read(buf, length)?;
                    if dt.is_zero_date() {
                        let rendered = match t {
                            DataType::Date | DataType::NewDate => dt.render_date(length, self.zero_date_policy)?,
                            _ => dt.render_datetime(length, self.decimals, self.zero_date_policy)?,
                        };
                        return Ok(Value::String(rendered));
                    }
                    let invalid = || Error::malformed(format!("{:?}", dt), "Value");
                    match t {
                        DataType::Date | DataType::NewDate => Value::Date(dt.to_date().ok_or_else(invalid)?),
                        _ => Value::DateTime(dt.to_datetime().ok_or_else(invalid)?),
                    }
                }
            },
            DataType::Geometry => Value::Geometry(self.decode_geometry(buf, length, protocol)?),
            DataType::Null => {
                buf.skip(length)?;
                Value::Null
            }
            _ if self.is_binary() => Value::Bytes(buf.read_vec(length)?),
            _ => Value::String(buf.read_string(length)?),
        })
    }
}

/// Truncate a binary float toward zero for an integer target.
fn float_to_integral(v: f64, target: &'static str) -> Result<i128> {
    if !v.is_finite() || v.abs() >= 1e38 {
        return Err(Error::overflow(v.to_string(), target));
    }
    Ok(v.trunc() as i128)
}

macro_rules! protocol_entry_points {
    ($($inner:ident => $text:ident, $binary:ident -> $t:ty;)*) => {
        impl Column {
            $(
                #[doc = concat!("Text-protocol decode into `", stringify!($t), "`.")]
                pub fn $text(&self, buf: &mut ReadBuffer, length: usize) -> Result<$t> {
                    self.$inner(buf, length, Protocol::Text)
                }

                #[doc = concat!("Binary-protocol decode into `", stringify!($t), "`.")]
                pub fn $binary(&self, buf: &mut ReadBuffer, length: usize) -> Result<$t> {
                    self.$inner(buf, length, Protocol::Binary)
                }
            )*
        }
    };
}

protocol_entry_points! {
    decode_bool => decode_bool_text, decode_bool_binary -> bool;
    decode_i8 => decode_i8_text, decode_i8_binary -> i8;
    decode_i16 => decode_i16_text, decode_i16_binary -> i16;
    decode_i32 => decode_i32_text, decode_i32_binary -> i32;
    decode_i64 => decode_i64_text, decode_i64_binary -> i64;
    decode_u64 => decode_u64_text, decode_u64_binary -> u64;
    decode_f32 => decode_f32_text, decode_f32_binary -> f32;
    decode_f64 => decode_f64_text, decode_f64_binary -> f64;
    decode_decimal => decode_decimal_text, decode_decimal_binary -> Decimal;
    decode_string => decode_string_text, decode_string_binary -> String;
    decode_bytes => decode_bytes_text, decode_bytes_binary -> Vec<u8>;
    decode_date => decode_date_text, decode_date_binary -> NaiveDate;
    decode_datetime => decode_datetime_text, decode_datetime_binary -> NaiveDateTime;
    decode_time => decode_time_text, decode_time_binary -> Duration;
    decode_geometry => decode_geometry_text, decode_geometry_binary -> Geometry;
    decode_default => decode_default_text, decode_default_binary -> Value;
}
