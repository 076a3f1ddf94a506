//! Codec registry: conversions between wire fields and Rust values.
//!
//! Decoding is driven by the target type the caller asks for: every
//! [`Decode`] type names its [`Codec`], which checks the column's wire type
//! before touching the bytes. Encoding is driven by the bound [`Value`]:
//! [`find_encoder`] walks [`CODECS`] in a fixed order and the first codec
//! whose [`ParameterCodec::can_encode`] accepts the value wins.
//!
//! Codecs are stateless statics and may be shared across connections.

mod geometry;
mod numeric;
mod string;
mod temporal;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::protocol::buffer::{ReadBuffer, WriteBuffer};
use crate::protocol::constants::SERVER_STATUS_NO_BACKSLASH_ESCAPES;
use crate::protocol::types::{Column, DataType, Protocol, Value};

pub use geometry::{GeometryCodec, PointCodec};
pub use numeric::{
    BigIntCodec, BoolCodec, DecimalCodec, DoubleCodec, FloatCodec, IntCodec, SmallIntCodec,
    TinyIntCodec, UnsignedBigIntCodec,
};
pub use string::{BytesCodec, StringCodec};
pub use temporal::{DateCodec, DateTimeCodec, TimeCodec};

/// Connection state consulted by text-mode encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeContext {
    /// Server status flags from the last OK packet or the handshake.
    pub server_status: u16,
}

impl EncodeContext {
    pub fn new(server_status: u16) -> Self {
        Self { server_status }
    }

    /// Whether the server runs with `NO_BACKSLASH_ESCAPES`.
    pub fn no_backslash_escapes(&self) -> bool {
        self.server_status & SERVER_STATUS_NO_BACKSLASH_ESCAPES != 0
    }
}

/// Parameter-binding half of a codec; object safe so codecs for different
/// target types can share one registry.
pub trait ParameterCodec: Send + Sync {
    /// Rust type this codec handles.
    fn type_name(&self) -> &'static str;

    /// Whether `value` is bound through this codec.
    fn can_encode(&self, value: &Value) -> bool;

    /// Write `value` as an SQL literal for the text protocol.
    fn encode_text(
        &self,
        out: &mut WriteBuffer,
        ctx: &EncodeContext,
        value: &Value,
        max_length: Option<usize>,
    ) -> Result<()>;

    /// Write `value` in its binary-protocol layout.
    fn encode_binary(&self, out: &mut WriteBuffer, value: &Value, max_length: Option<usize>)
        -> Result<()>;

    /// Wire type announced for binary-protocol parameters.
    fn binary_encode_type(&self) -> DataType;
}

/// Full codec for target type `T`.
pub trait Codec<T>: ParameterCodec {
    /// Whether fields of `column` can be decoded into `T` at all.
    fn can_decode(&self, column: &Column) -> bool;

    /// Decode a text-protocol field of `length` bytes.
    fn decode_text(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<T>;

    /// Decode a binary-protocol field of `length` bytes.
    fn decode_binary(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<T>;
}

/// Rust types that can be read out of a row.
pub trait Decode: Sized + 'static {
    fn codec() -> &'static dyn Codec<Self>;
}

/// All parameter codecs in dispatch order.
///
/// `PointCodec` precedes `GeometryCodec` so that points bind with the
/// fixed-size point layout.
pub static CODECS: &[&dyn ParameterCodec] = &[
    &BoolCodec,
    &TinyIntCodec,
    &SmallIntCodec,
    &IntCodec,
    &BigIntCodec,
    &UnsignedBigIntCodec,
    &FloatCodec,
    &DoubleCodec,
    &DecimalCodec,
    &StringCodec,
    &BytesCodec,
    &DateCodec,
    &TimeCodec,
    &DateTimeCodec,
    &PointCodec,
    &GeometryCodec,
];

/// Select the codec that binds `value`.
pub fn find_encoder(value: &Value) -> Result<&'static dyn ParameterCodec> {
    let codec = CODECS
        .iter()
        .copied()
        .find(|c| c.can_encode(value))
        .ok_or(Error::UnsupportedEncodeType {
            type_name: value.type_name(),
        })?;
    tracing::trace!(value_type = value.type_name(), codec = codec.type_name(), "selected encoder");
    Ok(codec)
}

/// Append `value` to a text-protocol query.
pub fn encode_text(
    out: &mut WriteBuffer,
    ctx: &EncodeContext,
    value: &Value,
    max_length: Option<usize>,
) -> Result<()> {
    find_encoder(value)?.encode_text(out, ctx, value, max_length)
}

/// Append `value` to a binary-protocol parameter block, returning the wire
/// type to announce for it.
pub fn encode_binary(
    out: &mut WriteBuffer,
    value: &Value,
    max_length: Option<usize>,
) -> Result<DataType> {
    let codec = find_encoder(value)?;
    codec.encode_binary(out, value, max_length)?;
    Ok(codec.binary_encode_type())
}

/// Decode one field into `T`, rejecting incompatible columns before any
/// bytes are read.
pub fn decode_field<T: Decode>(column: &Column, field: Bytes, protocol: Protocol) -> Result<T> {
    let codec = T::codec();
    if !codec.can_decode(column) {
        return Err(Error::type_mismatch(column.data_type, codec.type_name()));
    }
    let length = field.len();
    let mut buf = ReadBuffer::new(field);
    match protocol {
        Protocol::Text => codec.decode_text(&mut buf, length, column),
        Protocol::Binary => codec.decode_binary(&mut buf, length, column),
    }
}

/// Error for a value handed to a codec that did not accept it.
fn wrong_value(codec: &dyn ParameterCodec, value: &Value) -> Error {
    tracing::warn!(codec = codec.type_name(), value_type = value.type_name(), "value routed to wrong codec");
    Error::UnsupportedEncodeType {
        type_name: value.type_name(),
    }
}

/// Write a single-quoted, escaped string literal.
fn write_quoted(out: &mut WriteBuffer, ctx: &EncodeContext, s: &str) {
    out.write_u8(b'\'');
    out.write_string_escaped(s, ctx.no_backslash_escapes());
    out.write_u8(b'\'');
}
