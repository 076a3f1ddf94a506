//! Temporal decoders.
//!
//! Binary-protocol layouts (all length-gated, little-endian):
//!
//! ```text
//! TIME      [sign:1][days:4][hour:1][min:1][sec:1][micros:4]   length 0, 8 or 12
//! DATE      [year:2][month:1][day:1]                           length 0 or 4
//! DATETIME  [year:2][month:1][day:1][hour:1][min:1][sec:1][micros:4]
//!                                                              length 0, 4, 7 or 11
//! ```
//!
//! A zero length means the all-zero value.

use crate::error::{Error, Result};
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::constants::{ZERO_DATE, ZERO_DATETIME, ZERO_TIME};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// What to do with a non-empty DATE/DATETIME field whose year, month and day
/// are all zero.
///
/// Some server variants send such fields where a zero-length field is
/// expected; the default renders them as the zero literal. The policy
/// covers string and [`Value`](crate::Value) reads of DATE, DATETIME and
/// TIMESTAMP columns in both protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroDatePolicy {
    #[default]
    RenderAsZeroLiteral,
    Reject,
}

/// Decoded binary TIME field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BinaryTime {
    pub negative: bool,
    pub days: u32,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub micros: u32,
}

impl BinaryTime {
    /// Read a TIME field of `length` bytes.
    pub fn read(buf: &mut ReadBuffer, length: usize) -> Result<Self> {
        let mut t = BinaryTime::default();
        if length == 0 {
            return Ok(t);
        }
        t.negative = buf.read_u8()? == 0x01;
        if length > 4 {
            t.days = buf.read_u32_le()?;
            if length > 7 {
                t.hours = buf.read_u8()?;
                t.minutes = buf.read_u8()?;
                t.seconds = buf.read_u8()?;
                if length > 8 {
                    t.micros = buf.read_u32_le()?;
                }
            }
        }
        Ok(t)
    }

    /// Total hours as displayed: days * 24 + hours.
    pub fn total_hours(&self) -> u64 {
        self.days as u64 * 24 + self.hours as u64
    }

    /// Signed duration of this value.
    pub fn to_duration(&self) -> Duration {
        let secs = self.total_hours() as i64 * 3600 + self.minutes as i64 * 60 + self.seconds as i64;
        let d = Duration::seconds(secs) + Duration::microseconds(self.micros as i64);
        if self.negative {
            -d
        } else {
            d
        }
    }

    /// Render as `[-]HH:MM:SS[.ffffff]`.
    ///
    /// Fractional digits follow the declared scale; a zero scale still shows
    /// six digits when the server sent non-zero microseconds.
    pub fn render(&self, length: usize, decimals: u8) -> String {
        if length == 0 {
            return with_zero_fraction(ZERO_TIME, decimals);
        }
        let mut out = format!(
            "{}{:02}:{:02}:{:02}",
            if self.negative { "-" } else { "" },
            self.total_hours(),
            self.minutes,
            self.seconds
        );
        let digits = fraction_digits(decimals, self.micros);
        if digits > 0 {
            out.push('.');
            out.push_str(&fraction(self.micros, digits));
        }
        out
    }
}

/// Decoded binary DATE/DATETIME/TIMESTAMP field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BinaryDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub micros: u32,
}

impl BinaryDateTime {
    /// Read a DATE/DATETIME field of `length` bytes.
    pub fn read(buf: &mut ReadBuffer, length: usize) -> Result<Self> {
        let mut dt = BinaryDateTime::default();
        if length == 0 {
            return Ok(dt);
        }
        dt.year = buf.read_u16_le()?;
        dt.month = buf.read_u8()?;
        dt.day = buf.read_u8()?;
        if length > 4 {
            dt.hour = buf.read_u8()?;
            dt.minute = buf.read_u8()?;
            dt.second = buf.read_u8()?;
            if length > 7 {
                dt.micros = buf.read_u32_le()?;
            }
        }
        Ok(dt)
    }

    /// Year, month and day are all zero.
    pub fn is_zero_date(&self) -> bool {
        self.year == 0 && self.month == 0 && self.day == 0
    }

    /// Calendar date, if valid.
    pub fn to_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)
    }

    /// Calendar date-time, if valid.
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        let time = NaiveTime::from_hms_micro_opt(
            self.hour as u32,
            self.minute as u32,
            self.second as u32,
            self.micros,
        )?;
        Some(self.to_date()?.and_time(time))
    }

    fn describe(&self) -> String {
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.micros
        )
    }

    /// Render a DATE field as `YYYY-MM-DD`.
    pub fn render_date(&self, length: usize, policy: ZeroDatePolicy) -> Result<String> {
        if length == 0 {
            return Ok(ZERO_DATE.to_string());
        }
        if self.is_zero_date() {
            return zero_literal(ZERO_DATE, policy, self);
        }
        let date = self
            .to_date()
            .ok_or_else(|| Error::malformed(self.describe(), "String"))?;
        Ok(date.format("%Y-%m-%d").to_string())
    }

    /// Render a DATETIME/TIMESTAMP field as `YYYY-MM-DD HH:MM:SS[.ffffff]`.
    pub fn render_datetime(
        &self,
        length: usize,
        decimals: u8,
        policy: ZeroDatePolicy,
    ) -> Result<String> {
        if length == 0 {
            return Ok(with_zero_fraction(ZERO_DATETIME, decimals));
        }
        if self.is_zero_date() {
            return zero_literal(ZERO_DATETIME, policy, self);
        }
        let dt = self
            .to_datetime()
            .ok_or_else(|| Error::malformed(self.describe(), "String"))?;
        let mut out = dt.format("%Y-%m-%d %H:%M:%S").to_string();
        let digits = fraction_digits(decimals, self.micros);
        if digits > 0 {
            out.push('.');
            out.push_str(&fraction(self.micros, digits));
        }
        Ok(out)
    }
}

fn zero_literal(literal: &str, policy: ZeroDatePolicy, dt: &BinaryDateTime) -> Result<String> {
    match policy {
        ZeroDatePolicy::RenderAsZeroLiteral => Ok(literal.to_string()),
        ZeroDatePolicy::Reject => Err(Error::malformed(dt.describe(), "String")),
    }
}

/// Fractional digits to show for a declared scale.
fn fraction_digits(decimals: u8, micros: u32) -> usize {
    match decimals.min(6) {
        0 if micros > 0 => 6,
        d => d as usize,
    }
}

/// The first `digits` digits of the six-digit microsecond fraction.
fn fraction(micros: u32, digits: usize) -> String {
    let full = format!("{:06}", micros % 1_000_000);
    full[..digits.min(6)].to_string()
}

fn with_zero_fraction(literal: &str, decimals: u8) -> String {
    let digits = decimals.min(6) as usize;
    if digits == 0 {
        return literal.to_string();
    }
    format!("{}.{}", literal, "0".repeat(digits))
}

/// Render a duration as `[-]HH:MM:SS[.ffffff]`.
pub fn format_duration(d: Duration) -> String {
    let negative = d < Duration::zero();
    let abs = if negative { -d } else { d };
    let total_secs = abs.num_seconds();
    let micros = (abs - Duration::seconds(total_secs))
        .num_microseconds()
        .unwrap_or(0);
    let mut out = format!(
        "{}{:02}:{:02}:{:02}",
        if negative { "-" } else { "" },
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60
    );
    if micros > 0 {
        out.push_str(&format!(".{:06}", micros));
    }
    out
}

/// Parse a textual TIME value `[-]H+:MM:SS[.ffffff]`.
pub fn parse_time_text(text: &str, target: &'static str) -> Result<Duration> {
    let malformed = || Error::malformed(text, target);
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (hms, frac) = match body.split_once('.') {
        Some((hms, frac)) => (hms, Some(frac)),
        None => (body, None),
    };
    let mut parts = hms.split(':');
    let mut next = || -> Result<i64> {
        parts
            .next()
            .filter(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|p| p.parse::<i64>().ok())
            .ok_or_else(malformed)
    };
    let hours = next()?;
    let minutes = next()?;
    let seconds = next()?;
    if parts.next().is_some() || minutes > 59 || seconds > 59 {
        return Err(malformed());
    }
    let micros = match frac {
        Some(f) if !f.is_empty() && f.len() <= 9 && f.bytes().all(|b| b.is_ascii_digit()) => {
            let padded = format!("{:0<6}", f);
            padded[..6].parse::<i64>().map_err(|_| malformed())?
        }
        Some(_) => return Err(malformed()),
        None => 0,
    };
    let d = hours
        .checked_mul(3600)
        .and_then(|s| s.checked_add(minutes * 60 + seconds))
        .and_then(Duration::try_seconds)
        .and_then(|d| d.checked_add(&Duration::microseconds(micros)))
        .ok_or_else(|| Error::overflow(text, target))?;
    Ok(if negative { -d } else { d })
}

/// Parse a textual DATE value, or the date part of a DATETIME value.
pub fn parse_date_text(text: &str, target: &'static str) -> Result<NaiveDate> {
    let date_part = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| Error::malformed(text, target))
}

/// Parse a textual DATETIME value; a bare date means midnight.
pub fn parse_datetime_text(text: &str, target: &'static str) -> Result<NaiveDateTime> {
    if text.len() == 10 {
        let date = parse_date_text(text, target)?;
        return Ok(date.and_time(NaiveTime::MIN));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .map_err(|_| Error::malformed(text, target))
}
