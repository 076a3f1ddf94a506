//! DATE, TIME and DATETIME codecs backed by chrono.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};
use crate::protocol::buffer::{ReadBuffer, WriteBuffer};
use crate::protocol::decode::format_duration;
use crate::protocol::types::{Column, DataType, Value};

use super::{wrong_value, write_quoted, Codec, Decode, EncodeContext, ParameterCodec};

fn text_column(column: &Column) -> bool {
    column.data_type.is_string() && !column.is_binary()
}

/// `chrono::NaiveDate`.
#[derive(Debug, Clone, Copy)]
pub struct DateCodec;

impl ParameterCodec for DateCodec {
    fn type_name(&self) -> &'static str {
        "NaiveDate"
    }

    fn can_encode(&self, value: &Value) -> bool {
        matches!(value, Value::Date(_))
    }

    fn encode_text(&self, out: &mut WriteBuffer, ctx: &EncodeContext, value: &Value, _: Option<usize>) -> Result<()> {
        let Value::Date(d) = value else {
            return Err(wrong_value(self, value));
        };
        write_quoted(out, ctx, &d.format("%Y-%m-%d").to_string());
        Ok(())
    }

    fn encode_binary(&self, out: &mut WriteBuffer, value: &Value, _: Option<usize>) -> Result<()> {
        let Value::Date(d) = value else {
            return Err(wrong_value(self, value));
        };
        let year = binary_year(d)?;
        out.write_u8(4);
        write_ymd(out, year, d);
        Ok(())
    }

    fn binary_encode_type(&self) -> DataType {
        DataType::Date
    }
}

impl Codec<NaiveDate> for DateCodec {
    fn can_decode(&self, column: &Column) -> bool {
        column.data_type.is_date() || text_column(column)
    }

    fn decode_text(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<NaiveDate> {
        column.decode_date_text(buf, length)
    }

    fn decode_binary(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<NaiveDate> {
        column.decode_date_binary(buf, length)
    }
}

impl Decode for NaiveDate {
    fn codec() -> &'static dyn Codec<Self> {
        &DateCodec
    }
}

/// `chrono::Duration` for TIME values, which may be negative or exceed a day.
#[derive(Debug, Clone, Copy)]
pub struct TimeCodec;

impl ParameterCodec for TimeCodec {
    fn type_name(&self) -> &'static str {
        "Duration"
    }

    fn can_encode(&self, value: &Value) -> bool {
        matches!(value, Value::Time(_))
    }

    fn encode_text(&self, out: &mut WriteBuffer, ctx: &EncodeContext, value: &Value, _: Option<usize>) -> Result<()> {
        let Value::Time(t) = value else {
            return Err(wrong_value(self, value));
        };
        write_quoted(out, ctx, &format_duration(*t));
        Ok(())
    }

    /// `[len][sign][days:4][h][m][s][micros:4]?`
    fn encode_binary(&self, out: &mut WriteBuffer, value: &Value, _: Option<usize>) -> Result<()> {
        let Value::Time(t) = value else {
            return Err(wrong_value(self, value));
        };
        let negative = *t < Duration::zero();
        let abs = if negative { -*t } else { *t };
        let secs = abs.num_seconds();
        let days = u32::try_from(secs / 86_400).map_err(|_| Error::overflow(format_duration(*t), "Duration"))?;
        let micros = (abs - Duration::seconds(secs)).num_microseconds().unwrap_or(0) as u32;
        out.write_u8(if micros > 0 { 12 } else { 8 });
        out.write_u8(negative as u8);
        out.write_u32_le(days);
        out.write_u8(((secs % 86_400) / 3600) as u8);
        out.write_u8(((secs % 3600) / 60) as u8);
        out.write_u8((secs % 60) as u8);
        if micros > 0 {
            out.write_u32_le(micros);
        }
        Ok(())
    }

    fn binary_encode_type(&self) -> DataType {
        DataType::Time
    }
}

impl Codec<Duration> for TimeCodec {
    fn can_decode(&self, column: &Column) -> bool {
        column.data_type == DataType::Time || text_column(column)
    }

    fn decode_text(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<Duration> {
        column.decode_time_text(buf, length)
    }

    fn decode_binary(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<Duration> {
        column.decode_time_binary(buf, length)
    }
}

impl Decode for Duration {
    fn codec() -> &'static dyn Codec<Self> {
        &TimeCodec
    }
}

/// `chrono::NaiveDateTime` for DATETIME and TIMESTAMP.
#[derive(Debug, Clone, Copy)]
pub struct DateTimeCodec;

impl ParameterCodec for DateTimeCodec {
    fn type_name(&self) -> &'static str {
        "NaiveDateTime"
    }

    fn can_encode(&self, value: &Value) -> bool {
        matches!(value, Value::DateTime(_))
    }

    fn encode_text(&self, out: &mut WriteBuffer, ctx: &EncodeContext, value: &Value, _: Option<usize>) -> Result<()> {
        let Value::DateTime(dt) = value else {
            return Err(wrong_value(self, value));
        };
        let pattern = if dt.nanosecond() >= 1000 {
            "%Y-%m-%d %H:%M:%S%.6f"
        } else {
            "%Y-%m-%d %H:%M:%S"
        };
        write_quoted(out, ctx, &dt.format(pattern).to_string());
        Ok(())
    }

    /// `[len][year:2][month][day][h][m][s][micros:4]?`
    fn encode_binary(&self, out: &mut WriteBuffer, value: &Value, _: Option<usize>) -> Result<()> {
        let Value::DateTime(dt) = value else {
            return Err(wrong_value(self, value));
        };
        let year = binary_year(&dt.date())?;
        let micros = dt.nanosecond() / 1000;
        out.write_u8(if micros > 0 { 11 } else { 7 });
        write_ymd(out, year, &dt.date());
        out.write_u8(dt.hour() as u8);
        out.write_u8(dt.minute() as u8);
        out.write_u8(dt.second() as u8);
        if micros > 0 {
            out.write_u32_le(micros);
        }
        Ok(())
    }

    fn binary_encode_type(&self) -> DataType {
        DataType::DateTime
    }
}

impl Codec<NaiveDateTime> for DateTimeCodec {
    fn can_decode(&self, column: &Column) -> bool {
        column.data_type.is_date() || text_column(column)
    }

    fn decode_text(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<NaiveDateTime> {
        column.decode_datetime_text(buf, length)
    }

    fn decode_binary(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<NaiveDateTime> {
        column.decode_datetime_binary(buf, length)
    }
}

impl Decode for NaiveDateTime {
    fn codec() -> &'static dyn Codec<Self> {
        &DateTimeCodec
    }
}

/// Year as carried in the two-byte binary field; negative years and years
/// past 65535 do not fit.
fn binary_year(d: &NaiveDate) -> Result<u16> {
    u16::try_from(d.year()).map_err(|_| Error::overflow(d.to_string(), "NaiveDate"))
}

fn write_ymd(out: &mut WriteBuffer, year: u16, d: &NaiveDate) {
    out.write_u16_le(year);
    out.write_u8(d.month() as u8);
    out.write_u8(d.day() as u8);
}
