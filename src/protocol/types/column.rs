//! Column descriptors built from column-definition packets.
//!
//! A [`Column`] is immutable once decoded and carries everything needed to
//! decode that column's fields; the per-target decode methods live in
//! `column_decode.rs`.

use crate::error::Result;
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::constants::*;
use crate::protocol::decode::ZeroDatePolicy;

use super::data_type::DataType;

/// A column in a result set.
#[derive(Debug, Clone)]
pub struct Column {
    /// Schema (database) name.
    pub schema: String,
    /// Table alias.
    pub table: String,
    /// Physical table name.
    pub org_table: String,
    /// Column alias.
    pub name: String,
    /// Physical column name.
    pub org_name: String,
    /// Wire type.
    pub data_type: DataType,
    /// Collation/charset id; 63 means binary.
    pub charset_id: u16,
    /// Declared maximum length in bytes.
    pub column_length: u32,
    /// Scale of DECIMAL columns, fractional-second digits of temporal columns.
    pub decimals: u8,
    /// `FLAG_*` bits.
    pub flags: u16,
    /// MariaDB extended type name (e.g. `geometry` subtypes).
    pub ext_type_name: Option<String>,
    /// MariaDB extended type format (e.g. `json`).
    pub ext_type_format: Option<String>,
    /// Handling of all-zero calendar fields.
    pub zero_date_policy: ZeroDatePolicy,
}

impl Column {
    /// Create a column with minimal info; used when no definition packet exists.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            schema: String::new(),
            table: String::new(),
            org_table: String::new(),
            name: name.into(),
            org_name: String::new(),
            data_type,
            charset_id: BINARY_CHARSET_ID,
            column_length: 0,
            decimals: 0,
            flags: 0,
            ext_type_name: None,
            ext_type_format: None,
            zero_date_policy: ZeroDatePolicy::default(),
        }
    }

    pub fn with_flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_charset(mut self, charset_id: u16) -> Self {
        self.charset_id = charset_id;
        self
    }

    pub fn with_length(mut self, column_length: u32) -> Self {
        self.column_length = column_length;
        self
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn with_zero_date_policy(mut self, policy: ZeroDatePolicy) -> Self {
        self.zero_date_policy = policy;
        self
    }

    /// Decode a column-definition packet (protocol 4.1).
    ///
    /// `extended_type_info` must match whether
    /// `MARIADB_CLIENT_EXTENDED_TYPE_INFO` was negotiated.
    pub fn decode(buf: &mut ReadBuffer, extended_type_info: bool) -> Result<Self> {
        let mut lenenc = || -> Result<String> { Ok(buf.read_lenenc_string()?.unwrap_or_default()) };
        let _catalog = lenenc()?;
        let schema = lenenc()?;
        let table = lenenc()?;
        let org_table = lenenc()?;
        let name = lenenc()?;
        let org_name = lenenc()?;

        let mut ext_type_name = None;
        let mut ext_type_format = None;
        if extended_type_info {
            if let Some(ext) = buf.read_lenenc_bytes()? {
                let mut ext = ReadBuffer::new(ext);
                while ext.remaining() > 0 {
                    let tag = ext.read_u8()?;
                    let value = ext.read_lenenc_string()?;
                    match tag {
                        0 => ext_type_name = value,
                        1 => ext_type_format = value,
                        _ => {}
                    }
                }
            }
        }

        // length of the fixed-size block, always 0x0c
        buf.read_length_encoded()?;
        let charset_id = buf.read_u16_le()?;
        let column_length = buf.read_u32_le()?;
        let data_type = DataType::from_raw(buf.read_u8()?)?;
        let flags = buf.read_u16_le()?;
        let decimals = buf.read_u8()?;

        tracing::trace!(column = %name, %data_type, charset_id, flags, "decoded column definition");

        Ok(Self {
            schema,
            table,
            org_table,
            name,
            org_name,
            data_type,
            charset_id,
            column_length,
            decimals,
            flags,
            ext_type_name,
            ext_type_format,
            zero_date_policy: ZeroDatePolicy::default(),
        })
    }

    /// Integer columns without the UNSIGNED flag.
    pub fn is_signed(&self) -> bool {
        self.flags & FLAG_UNSIGNED == 0
    }

    /// Binary charset: string-family columns carry bytes, not text.
    pub fn is_binary(&self) -> bool {
        self.charset_id == BINARY_CHARSET_ID
    }

    pub fn is_zero_fill(&self) -> bool {
        self.flags & FLAG_ZEROFILL != 0
    }

    pub fn is_nullable(&self) -> bool {
        self.flags & FLAG_NOT_NULL == 0
    }

    /// Maximum bytes per character of the column's charset.
    fn max_char_len(&self) -> u32 {
        match self.charset_id {
            33 | 83 | 192..=215 | 223 => 3,
            45 | 46 | 224..=247 | 255 => 4,
            35 | 90 | 128..=151 => 2,
            54 | 55 | 101..=124 | 60 | 61 | 160..=183 => 4,
            _ => 1,
        }
    }

    /// Display width in characters.
    pub fn display_size(&self) -> u32 {
        if self.data_type.is_string() && !self.is_binary() {
            return self.column_length / self.max_char_len();
        }
        self.column_length
    }

    /// Numeric precision; character length for text columns.
    pub fn precision(&self) -> u32 {
        if self.data_type.is_decimal() {
            let mut p = self.column_length;
            if self.is_signed() {
                p = p.saturating_sub(1);
            }
            if self.decimals > 0 {
                p = p.saturating_sub(1);
            }
            return p;
        }
        self.display_size()
    }

    /// SQL type name as reported to applications.
    pub fn column_type_name(&self) -> String {
        if let Some(format) = &self.ext_type_format {
            return format.to_uppercase();
        }
        let unsigned = !self.is_signed() && self.data_type.is_integer();
        let base = match self.data_type {
            DataType::TinyBlob | DataType::MediumBlob | DataType::LongBlob | DataType::Blob => {
                return self.blob_type_name().to_string()
            }
            DataType::VarString | DataType::Varchar if self.is_binary() => "VARBINARY",
            DataType::String if self.is_binary() => "BINARY",
            DataType::VarString => "VARCHAR",
            DataType::String => "CHAR",
            DataType::NewDate => "DATE",
            DataType::Geometry => {
                return self
                    .ext_type_name
                    .as_deref()
                    .map_or_else(|| "GEOMETRY".to_string(), str::to_uppercase)
            }
            other => return format_type(other, unsigned),
        };
        base.to_string()
    }

    /// BLOB/TEXT family name chosen by declared length.
    fn blob_type_name(&self) -> &'static str {
        if self.is_binary() {
            match self.column_length {
                0..=255 => "TINYBLOB",
                256..=65_535 => "BLOB",
                65_536..=16_777_215 => "MEDIUMBLOB",
                _ => "LONGBLOB",
            }
        } else {
            match self.display_size() {
                0..=65_532 => "VARCHAR",
                65_533..=65_535 => "TEXT",
                65_536..=16_777_215 => "MEDIUMTEXT",
                _ => "LONGTEXT",
            }
        }
    }
}

fn format_type(data_type: DataType, unsigned: bool) -> String {
    if unsigned {
        format!("{} UNSIGNED", data_type)
    } else {
        data_type.to_string()
    }
}

/// Shared column information for all rows in a result set.
#[derive(Debug, Clone, Default)]
pub struct ColumnInfo {
    /// Column definitions.
    pub columns: Vec<Column>,
}

impl ColumnInfo {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Apply one zero-date policy to every column.
    pub fn with_zero_date_policy(mut self, policy: ZeroDatePolicy) -> Self {
        for column in &mut self.columns {
            column.zero_date_policy = policy;
        }
        self
    }

    /// Get column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Find column index by name (case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}
