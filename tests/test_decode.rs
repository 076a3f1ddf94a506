//! Integration tests for column definitions, row decoding and parameter encoding.

use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{NaiveDate, NaiveDateTime};
use mariadb_thin_rs::protocol::constants::{FLAG_BINARY_COLLATION, FLAG_UNSIGNED, SERVER_STATUS_NO_BACKSLASH_ESCAPES};
use mariadb_thin_rs::protocol::ReadBuffer;
use mariadb_thin_rs::protocol::WriteBuffer;
use mariadb_thin_rs::{
    encode_binary, encode_text, Column, ColumnInfo, ConnectParams, DataType, EncodeContext, Error, ErrorKind,
    Point, Row, Value, ZeroDatePolicy,
};
use rust_decimal::Decimal;

fn lenenc(out: &mut Vec<u8>, s: &[u8]) {
    out.push(s.len() as u8);
    out.extend_from_slice(s);
}

/// Column-definition packet as a server sends it.
fn column_packet(name: &str, type_code: u8, charset: u16, length: u32, flags: u16, decimals: u8) -> Vec<u8> {
    let mut p = Vec::new();
    lenenc(&mut p, b"def");
    lenenc(&mut p, b"shop");
    lenenc(&mut p, b"o");
    lenenc(&mut p, b"orders");
    lenenc(&mut p, name.as_bytes());
    lenenc(&mut p, name.as_bytes());
    p.push(0x0c);
    p.extend_from_slice(&charset.to_le_bytes());
    p.extend_from_slice(&length.to_le_bytes());
    p.push(type_code);
    p.extend_from_slice(&flags.to_le_bytes());
    p.push(decimals);
    p.extend_from_slice(&[0, 0]);
    p
}

fn decode_column(packet: Vec<u8>) -> Column {
    Column::decode(&mut ReadBuffer::new(Bytes::from(packet)), false).unwrap()
}

fn order_columns() -> Arc<ColumnInfo> {
    Arc::new(ColumnInfo::new(vec![
        decode_column(column_packet("id", 8, 63, 20, FLAG_UNSIGNED, 0)),
        decode_column(column_packet("customer", 253, 224, 400, 0, 0)),
        decode_column(column_packet("created", 12, 63, 26, 0, 6)),
        decode_column(column_packet("total", 246, 63, 12, 0, 2)),
        decode_column(column_packet("note", 253, 224, 800, 0, 0)),
        decode_column(column_packet("flags", 16, 63, 8, FLAG_UNSIGNED, 0)),
    ]))
}

fn order_row() -> Bytes {
    let mut p = vec![0x00, 0x40]; // header, note (column 4 -> bit 6) is NULL
    p.extend_from_slice(&u64::MAX.to_le_bytes());
    lenenc(&mut p, b"alice");
    p.extend_from_slice(&[11, 0xe8, 0x07, 3, 15, 10, 30, 0]);
    p.extend_from_slice(&250_000u32.to_le_bytes());
    lenenc(&mut p, b"12.50");
    lenenc(&mut p, &[0x05]);
    Bytes::from(p)
}

#[test]
fn test_column_definition_metadata() {
    let columns = order_columns();
    let id = columns.get(0).unwrap();
    assert_eq!(id.schema, "shop");
    assert_eq!(id.table, "o");
    assert_eq!(id.org_table, "orders");
    assert_eq!(id.data_type, DataType::LongLong);
    assert!(!id.is_signed());
    assert_eq!(id.column_type_name(), "BIGINT UNSIGNED");

    let customer = columns.get(1).unwrap();
    assert!(!customer.is_binary());
    // utf8mb4: four bytes per character
    assert_eq!(customer.display_size(), 100);
    assert_eq!(columns.find_by_name("CUSTOMER"), Some(1));
}

#[test]
fn test_binary_row_typed_access() {
    let row = Row::from_binary(order_row(), order_columns()).unwrap();
    assert_eq!(row.len(), 6);

    assert_eq!(row.get::<u64>(0).unwrap(), Some(u64::MAX));
    let err = row.get::<i64>(0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Overflow);

    assert_eq!(row.get::<String>(1).unwrap().as_deref(), Some("alice"));
    let created = NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_micro_opt(10, 30, 0, 250_000)
        .unwrap();
    assert_eq!(row.get_by_name::<NaiveDateTime>("created").unwrap(), Some(created));
    assert_eq!(
        row.get::<String>(2).unwrap().as_deref(),
        Some("2024-03-15 10:30:00.250000")
    );
    assert_eq!(row.get::<Decimal>(3).unwrap(), Some(Decimal::from_str("12.50").unwrap()));

    assert!(row.is_null(4));
    assert_eq!(row.get::<String>(4).unwrap(), None);
    assert_eq!(row.get_value(4).unwrap(), Value::Null);

    assert_eq!(row.get::<String>(5).unwrap().as_deref(), Some("b'101'"));
    assert_eq!(row.get::<i8>(5).unwrap(), Some(5));
    assert_eq!(row.get::<bool>(5).unwrap(), Some(true));
}

#[test]
fn test_text_row_and_type_mismatch() {
    let columns = Arc::new(ColumnInfo::new(vec![
        Column::new("n", DataType::Long),
        Column::new("blob", DataType::Blob).with_flags(FLAG_BINARY_COLLATION),
        Column::new("when", DataType::DateTime),
    ]));
    let mut p = Vec::new();
    lenenc(&mut p, b"-17");
    lenenc(&mut p, b"\x00\x01");
    lenenc(&mut p, b"0000-00-00 00:00:00");
    let row = Row::from_text(Bytes::from(p), columns).unwrap();

    assert_eq!(row.get::<i32>(0).unwrap(), Some(-17));
    assert_eq!(row.get::<u64>(0).unwrap_err().kind(), ErrorKind::Overflow);
    assert_eq!(row.get::<i8>(0).unwrap(), Some(-17));

    let err = row.get::<i32>(1).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { data_type: DataType::Blob, .. }));
    assert_eq!(row.get::<Vec<u8>>(1).unwrap(), Some(vec![0, 1]));
    assert_eq!(row.get_value(1).unwrap(), Value::Bytes(vec![0, 1]));

    assert_eq!(row.get::<String>(2).unwrap().as_deref(), Some("0000-00-00 00:00:00"));
    assert_eq!(
        row.get::<NaiveDateTime>(2).unwrap_err().kind(),
        ErrorKind::MalformedLiteral
    );
}

#[test]
fn test_zero_date_policy() {
    let zero = Bytes::from_static(&[0x00, 0x00, 7, 0, 0, 0, 0, 0, 0, 0]);
    let lenient = Arc::new(ColumnInfo::new(vec![Column::new("d", DataType::DateTime)]));
    let row = Row::from_binary(zero.clone(), lenient).unwrap();
    assert_eq!(row.get::<String>(0).unwrap().as_deref(), Some("0000-00-00 00:00:00"));
    assert_eq!(row.get_value(0).unwrap(), Value::String("0000-00-00 00:00:00".to_string()));

    let conf = ConnectParams::default()
        .from_options([("zeroDatePolicy", "reject")])
        .unwrap();
    assert_eq!(conf.zero_date_policy, ZeroDatePolicy::Reject);
    let strict = Arc::new(
        ColumnInfo::new(vec![Column::new("d", DataType::DateTime)])
            .with_zero_date_policy(conf.zero_date_policy),
    );
    let row = Row::from_binary(zero, strict).unwrap();
    assert!(row.get::<String>(0).is_err());
}

#[test]
fn test_parameter_encoding() {
    let ctx = EncodeContext::default();
    let mut out = WriteBuffer::new();
    encode_text(&mut out, &ctx, &Value::from("O'Brien"), None).unwrap();
    out.write_u8(b',');
    encode_text(&mut out, &ctx, &Value::from(42i64), None).unwrap();
    out.write_u8(b',');
    encode_text(&mut out, &ctx, &Value::Bytes(vec![0xde, 0xad]), None).unwrap();
    assert_eq!(out.as_bytes(), b"'O\\'Brien',42,_binary '\xde\xad'");

    let strict = EncodeContext::new(SERVER_STATUS_NO_BACKSLASH_ESCAPES);
    let mut out = WriteBuffer::new();
    encode_text(&mut out, &strict, &Value::from("O'Brien"), None).unwrap();
    assert_eq!(out.as_bytes(), b"'O''Brien'");

    let mut out = WriteBuffer::new();
    assert_eq!(
        encode_binary(&mut out, &Value::Point(Point::new(3.0, 4.0)), None).unwrap(),
        DataType::Blob
    );
    assert_eq!(out.len(), 26);
    assert_eq!(
        encode_binary(&mut WriteBuffer::new(), &Value::from(7i32), None).unwrap(),
        DataType::Long
    );

    let err = encode_text(&mut WriteBuffer::new(), &ctx, &Value::Null, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedEncodeType);
}
