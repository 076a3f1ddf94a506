//! Format-level decoders for MariaDB column values.
//!
//! | Wire type                  | Module     |
//! |----------------------------|------------|
//! | integer / DECIMAL as text  | `number`   |
//! | BIT                        | `bit`      |
//! | DATE, DATETIME, TIME       | `date`     |
//! | GEOMETRY                   | `geometry` |
//!
//! Fixed-width binary integers and floats are read straight off the
//! [`ReadBuffer`](crate::protocol::ReadBuffer) and need no module here.

mod bit;
mod date;
mod geometry;
mod number;

pub use bit::{bit_value, render_bit_literal};
pub use date::{
    format_duration, parse_date_text, parse_datetime_text, parse_time_text, BinaryDateTime,
    BinaryTime, ZeroDatePolicy,
};
pub use geometry::{read_geometry, read_wkb, write_wkb};
pub use number::{is_numeric_literal, narrow, parse_decimal, parse_f64, parse_integral};
