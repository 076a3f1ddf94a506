//! Row type for query results.
//!
//! A row owns one copied byte run per field; decoding into a target type
//! happens lazily through the codec registry.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::codec::{decode_field, Decode};
use crate::protocol::constants::OK_PACKET;

use super::column::{Column, ColumnInfo};
use super::column_decode::Protocol;
use super::data_type::DataType;
use super::value::Value;

/// A row of query results.
#[derive(Debug, Clone)]
pub struct Row {
    /// Raw field bytes; `None` is SQL NULL.
    fields: Vec<Option<Bytes>>,
    protocol: Protocol,
    /// Shared column information (reference counted).
    column_info: Arc<ColumnInfo>,
}

impl Row {
    /// Split a text-protocol row packet: one length-encoded string per column,
    /// `0xFB` marking NULL.
    pub fn from_text(payload: Bytes, column_info: Arc<ColumnInfo>) -> Result<Self> {
        let mut buf = ReadBuffer::new(payload);
        let fields = column_info
            .columns
            .iter()
            .map(|_| buf.read_lenenc_bytes())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            fields,
            protocol: Protocol::Text,
            column_info,
        })
    }

    /// Split a binary-protocol row packet.
    ///
    /// Layout: `0x00` header, a NULL bitmap of `(n + 9) / 8` bytes whose bit
    /// `i + 2` flags column `i`, then the non-NULL fields in order.
    pub fn from_binary(payload: Bytes, column_info: Arc<ColumnInfo>) -> Result<Self> {
        let mut buf = ReadBuffer::new(payload);
        let header = buf.read_u8()?;
        if header != OK_PACKET {
            return Err(Error::protocol(format!(
                "Unexpected binary row header 0x{:02x}",
                header
            )));
        }
        let count = column_info.len();
        let bitmap = buf.read_bytes((count + 9) / 8)?;
        let mut fields = Vec::with_capacity(count);
        for (i, column) in column_info.columns.iter().enumerate() {
            let bit = i + 2;
            if bitmap[bit / 8] & (1 << (bit % 8)) != 0 {
                fields.push(None);
                continue;
            }
            let field = match column.data_type.binary_width() {
                Some(width) => buf.read_bytes(width)?,
                None => buf
                    .read_lenenc_bytes()?
                    .ok_or_else(|| Error::protocol("NULL length inside a binary row"))?,
            };
            fields.push(Some(field));
        }
        tracing::trace!(columns = count, "split binary row");
        Ok(Self {
            fields,
            protocol: Protocol::Binary,
            column_info,
        })
    }

    /// Decode the field at `index` (0-based) into `T`.
    ///
    /// Returns `Ok(None)` for SQL NULL.
    pub fn get<T: Decode>(&self, index: usize) -> Result<Option<T>> {
        let column = self.column(index)?;
        match &self.fields[index] {
            None => Ok(None),
            Some(bytes) => decode_field::<T>(column, bytes.clone(), self.protocol).map(Some),
        }
    }

    /// Decode the field of the named column (case-insensitive) into `T`.
    pub fn get_by_name<T: Decode>(&self, name: &str) -> Result<Option<T>> {
        let index = self
            .column_info
            .find_by_name(name)
            .ok_or_else(|| Error::protocol(format!("No column named '{}'", name)))?;
        self.get(index)
    }

    /// Decode the field at `index` into the column's natural [`Value`].
    pub fn get_value(&self, index: usize) -> Result<Value> {
        let column = self.column(index)?;
        let Some(bytes) = &self.fields[index] else {
            return Ok(Value::Null);
        };
        let length = bytes.len();
        let mut buf = ReadBuffer::new(bytes.clone());
        match self.protocol {
            Protocol::Text => column.decode_default_text(&mut buf, length),
            Protocol::Binary => column.decode_default_binary(&mut buf, length),
        }
    }

    /// Decode every field into its natural [`Value`].
    pub fn values(&self) -> Result<Vec<Value>> {
        (0..self.len()).map(|i| self.get_value(i)).collect()
    }

    fn column(&self, index: usize) -> Result<&Column> {
        self.column_info.get(index).ok_or_else(|| {
            Error::protocol(format!(
                "Column index {} out of range ({} columns)",
                index,
                self.len()
            ))
        })
    }

    /// Whether the field at `index` is SQL NULL.
    pub fn is_null(&self, index: usize) -> bool {
        matches!(self.fields.get(index), Some(None))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Get column information.
    pub fn columns(&self) -> &[Column] {
        &self.column_info.columns
    }

    /// Get column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.column_info.column_names()
    }

    /// Wire type of the column at `index`.
    pub fn data_type(&self, index: usize) -> Option<DataType> {
        self.column_info.get(index).map(|c| c.data_type)
    }
}
