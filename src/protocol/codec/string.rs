//! String and byte-array codecs.

use crate::error::Result;
use crate::protocol::buffer::{ReadBuffer, WriteBuffer};
use crate::protocol::types::{Column, DataType, Value};

use super::{wrong_value, write_quoted, Codec, Decode, EncodeContext, ParameterCodec};

/// Prefix marking a text-protocol literal as binary data.
const BINARY_PREFIX: &[u8] = b"_binary '";

/// `String`: every wire type except GEOMETRY renders as text.
#[derive(Debug, Clone, Copy)]
pub struct StringCodec;

impl ParameterCodec for StringCodec {
    fn type_name(&self) -> &'static str {
        "String"
    }

    fn can_encode(&self, value: &Value) -> bool {
        matches!(value, Value::String(_))
    }

    /// `max_length` counts characters.
    fn encode_text(
        &self,
        out: &mut WriteBuffer,
        ctx: &EncodeContext,
        value: &Value,
        max_length: Option<usize>,
    ) -> Result<()> {
        let Value::String(s) = value else {
            return Err(wrong_value(self, value));
        };
        let s = match max_length.and_then(|n| s.char_indices().nth(n)) {
            Some((end, _)) => &s[..end],
            None => s.as_str(),
        };
        write_quoted(out, ctx, s);
        Ok(())
    }

    /// `max_length` counts bytes of the UTF-8 encoding.
    fn encode_binary(&self, out: &mut WriteBuffer, value: &Value, max_length: Option<usize>) -> Result<()> {
        let Value::String(s) = value else {
            return Err(wrong_value(self, value));
        };
        let bytes = s.as_bytes();
        let len = max_length.map_or(bytes.len(), |n| n.min(bytes.len()));
        out.write_lenenc_bytes(&bytes[..len]);
        Ok(())
    }

    fn binary_encode_type(&self) -> DataType {
        DataType::VarString
    }
}

impl Codec<String> for StringCodec {
    fn can_decode(&self, column: &Column) -> bool {
        !matches!(column.data_type, DataType::Geometry | DataType::Null)
    }

    fn decode_text(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<String> {
        column.decode_string_text(buf, length)
    }

    fn decode_binary(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<String> {
        column.decode_string_binary(buf, length)
    }
}

impl Decode for String {
    fn codec() -> &'static dyn Codec<Self> {
        &StringCodec
    }
}

/// `Vec<u8>`: raw field bytes of BIT, string-family and GEOMETRY columns.
#[derive(Debug, Clone, Copy)]
pub struct BytesCodec;

impl ParameterCodec for BytesCodec {
    fn type_name(&self) -> &'static str {
        "Vec<u8>"
    }

    fn can_encode(&self, value: &Value) -> bool {
        matches!(value, Value::Bytes(_))
    }

    fn encode_text(
        &self,
        out: &mut WriteBuffer,
        ctx: &EncodeContext,
        value: &Value,
        max_length: Option<usize>,
    ) -> Result<()> {
        let Value::Bytes(b) = value else {
            return Err(wrong_value(self, value));
        };
        let len = max_length.map_or(b.len(), |n| n.min(b.len()));
        out.write_bytes(BINARY_PREFIX);
        out.write_bytes_escaped(&b[..len], ctx.no_backslash_escapes());
        out.write_u8(b'\'');
        Ok(())
    }

    fn encode_binary(&self, out: &mut WriteBuffer, value: &Value, max_length: Option<usize>) -> Result<()> {
        let Value::Bytes(b) = value else {
            return Err(wrong_value(self, value));
        };
        let len = max_length.map_or(b.len(), |n| n.min(b.len()));
        out.write_lenenc_bytes(&b[..len]);
        Ok(())
    }

    fn binary_encode_type(&self) -> DataType {
        DataType::Blob
    }
}

impl Codec<Vec<u8>> for BytesCodec {
    fn can_decode(&self, column: &Column) -> bool {
        column.data_type.is_string()
            || matches!(column.data_type, DataType::Bit | DataType::Geometry)
    }

    fn decode_text(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<Vec<u8>> {
        column.decode_bytes_text(buf, length)
    }

    fn decode_binary(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<Vec<u8>> {
        column.decode_bytes_binary(buf, length)
    }
}

impl Decode for Vec<u8> {
    fn codec() -> &'static dyn Codec<Self> {
        &BytesCodec
    }
}
