//! MariaDB wire type codes.
//!
//! The set is closed: every column-definition packet carries one of these
//! codes, and all decode/encode dispatch matches on it.

use crate::error::{Error, Result};

/// Wire type code of a column or bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    OldDecimal,
    Tiny,
    Short,
    Long,
    Float,
    Double,
    Null,
    Timestamp,
    LongLong,
    Int24,
    Date,
    Time,
    DateTime,
    Year,
    NewDate,
    Varchar,
    Bit,
    Json,
    NewDecimal,
    Enum,
    Set,
    TinyBlob,
    MediumBlob,
    LongBlob,
    Blob,
    VarString,
    String,
    Geometry,
}

impl DataType {
    /// Create from the raw wire type code.
    ///
    /// Returns `Err(Error::UnsupportedType)` for unknown codes.
    pub fn from_raw(type_num: u8) -> Result<Self> {
        Ok(match type_num {
            0 => DataType::OldDecimal,
            1 => DataType::Tiny,
            2 => DataType::Short,
            3 => DataType::Long,
            4 => DataType::Float,
            5 => DataType::Double,
            6 => DataType::Null,
            7 => DataType::Timestamp,
            8 => DataType::LongLong,
            9 => DataType::Int24,
            10 => DataType::Date,
            11 => DataType::Time,
            12 => DataType::DateTime,
            13 => DataType::Year,
            14 => DataType::NewDate,
            15 => DataType::Varchar,
            16 => DataType::Bit,
            245 => DataType::Json,
            246 => DataType::NewDecimal,
            247 => DataType::Enum,
            248 => DataType::Set,
            249 => DataType::TinyBlob,
            250 => DataType::MediumBlob,
            251 => DataType::LongBlob,
            252 => DataType::Blob,
            253 => DataType::VarString,
            254 => DataType::String,
            255 => DataType::Geometry,
            _ => return Err(Error::UnsupportedType { type_num }),
        })
    }

    /// Get the wire type code.
    pub fn type_num(&self) -> u8 {
        match self {
            DataType::OldDecimal => 0,
            DataType::Tiny => 1,
            DataType::Short => 2,
            DataType::Long => 3,
            DataType::Float => 4,
            DataType::Double => 5,
            DataType::Null => 6,
            DataType::Timestamp => 7,
            DataType::LongLong => 8,
            DataType::Int24 => 9,
            DataType::Date => 10,
            DataType::Time => 11,
            DataType::DateTime => 12,
            DataType::Year => 13,
            DataType::NewDate => 14,
            DataType::Varchar => 15,
            DataType::Bit => 16,
            DataType::Json => 245,
            DataType::NewDecimal => 246,
            DataType::Enum => 247,
            DataType::Set => 248,
            DataType::TinyBlob => 249,
            DataType::MediumBlob => 250,
            DataType::LongBlob => 251,
            DataType::Blob => 252,
            DataType::VarString => 253,
            DataType::String => 254,
            DataType::Geometry => 255,
        }
    }

    /// Integer types, including YEAR.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Tiny
                | DataType::Short
                | DataType::Int24
                | DataType::Long
                | DataType::LongLong
                | DataType::Year
        )
    }

    /// Exact decimal types (sent as text in both protocols).
    pub fn is_decimal(&self) -> bool {
        matches!(self, DataType::OldDecimal | DataType::NewDecimal)
    }

    /// Character and binary string types.
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            DataType::Varchar
                | DataType::VarString
                | DataType::String
                | DataType::Enum
                | DataType::Set
                | DataType::Json
                | DataType::TinyBlob
                | DataType::MediumBlob
                | DataType::LongBlob
                | DataType::Blob
        )
    }

    /// Date and date-time types.
    pub fn is_date(&self) -> bool {
        matches!(
            self,
            DataType::Date | DataType::NewDate | DataType::DateTime | DataType::Timestamp
        )
    }

    /// Fixed binary-protocol width, or `None` when the field is length-prefixed.
    pub fn binary_width(&self) -> Option<usize> {
        match self {
            DataType::Tiny => Some(1),
            DataType::Short | DataType::Year => Some(2),
            DataType::Int24 | DataType::Long | DataType::Float => Some(4),
            DataType::LongLong | DataType::Double => Some(8),
            DataType::Null => Some(0),
            _ => None,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataType::OldDecimal => "OLDDECIMAL",
            DataType::Tiny => "TINYINT",
            DataType::Short => "SMALLINT",
            DataType::Long => "INTEGER",
            DataType::Float => "FLOAT",
            DataType::Double => "DOUBLE",
            DataType::Null => "NULL",
            DataType::Timestamp => "TIMESTAMP",
            DataType::LongLong => "BIGINT",
            DataType::Int24 => "MEDIUMINT",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::DateTime => "DATETIME",
            DataType::Year => "YEAR",
            DataType::NewDate => "NEWDATE",
            DataType::Varchar => "VARCHAR",
            DataType::Bit => "BIT",
            DataType::Json => "JSON",
            DataType::NewDecimal => "DECIMAL",
            DataType::Enum => "ENUM",
            DataType::Set => "SET",
            DataType::TinyBlob => "TINYBLOB",
            DataType::MediumBlob => "MEDIUMBLOB",
            DataType::LongBlob => "LONGBLOB",
            DataType::Blob => "BLOB",
            DataType::VarString => "VARSTRING",
            DataType::String => "STRING",
            DataType::Geometry => "GEOMETRY",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_roundtrip() {
        for code in (0u8..=16).chain(245..=255) {
            let t = DataType::from_raw(code).unwrap();
            assert_eq!(t.type_num(), code);
        }
    }

    #[test]
    fn test_from_raw_unsupported() {
        match DataType::from_raw(100) {
            Err(Error::UnsupportedType { type_num }) => assert_eq!(type_num, 100),
            other => panic!("Expected UnsupportedType error, got {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::Blob.to_string(), "BLOB");
        assert_eq!(DataType::LongLong.to_string(), "BIGINT");
        assert_eq!(DataType::NewDecimal.to_string(), "DECIMAL");
    }

    #[test]
    fn test_binary_width() {
        assert_eq!(DataType::Int24.binary_width(), Some(4));
        assert_eq!(DataType::Year.binary_width(), Some(2));
        assert_eq!(DataType::VarString.binary_width(), None);
        assert_eq!(DataType::Time.binary_width(), None);
    }
}
