//! MariaDB/MySQL client/server protocol constants.

// Packet framing
pub const PACKET_HEADER_SIZE: usize = 4;
pub const MAX_PACKET_PAYLOAD: usize = 0x00ff_ffff;

// Response markers (first payload byte)
pub const OK_PACKET: u8 = 0x00;
pub const AUTH_MORE_DATA: u8 = 0x01;
pub const AUTH_SWITCH_REQUEST: u8 = 0xfe;
pub const ERR_PACKET: u8 = 0xff;

// Length-encoded integer prefixes
pub const LENENC_NULL: u8 = 0xfb;
pub const LENENC_U16: u8 = 0xfc;
pub const LENENC_U24: u8 = 0xfd;
pub const LENENC_U64: u8 = 0xfe;

// Column definition flags
pub const FLAG_NOT_NULL: u16 = 0x0001;
pub const FLAG_PRIMARY_KEY: u16 = 0x0002;
pub const FLAG_UNIQUE_KEY: u16 = 0x0004;
pub const FLAG_MULTIPLE_KEY: u16 = 0x0008;
pub const FLAG_BLOB: u16 = 0x0010;
pub const FLAG_UNSIGNED: u16 = 0x0020;
pub const FLAG_ZEROFILL: u16 = 0x0040;
pub const FLAG_BINARY_COLLATION: u16 = 0x0080;
pub const FLAG_ENUM: u16 = 0x0100;
pub const FLAG_AUTO_INCREMENT: u16 = 0x0200;
pub const FLAG_TIMESTAMP: u16 = 0x0400;
pub const FLAG_SET: u16 = 0x0800;

/// Charset id the server reports for binary (non-text) columns.
pub const BINARY_CHARSET_ID: u16 = 63;

/// Decimals value meaning "not a fixed number of decimals".
pub const NOT_FIXED_DEC: u8 = 0x27;

// Server status flags
pub const SERVER_STATUS_IN_TRANS: u16 = 0x0001;
pub const SERVER_STATUS_AUTOCOMMIT: u16 = 0x0002;
pub const SERVER_MORE_RESULTS_EXISTS: u16 = 0x0008;
pub const SERVER_STATUS_NO_BACKSLASH_ESCAPES: u16 = 0x0200;

// Capability flags
pub const CLIENT_LONG_PASSWORD: u64 = 0x0000_0001;
pub const CLIENT_CONNECT_WITH_DB: u64 = 0x0000_0008;
pub const CLIENT_PROTOCOL_41: u64 = 0x0000_0200;
pub const CLIENT_SSL: u64 = 0x0000_0800;
pub const CLIENT_SECURE_CONNECTION: u64 = 0x0000_8000;
pub const CLIENT_PLUGIN_AUTH: u64 = 0x0008_0000;
pub const CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA: u64 = 0x0020_0000;
pub const CLIENT_DEPRECATE_EOF: u64 = 0x0100_0000;
/// MariaDB extension (upper 32 bits): extended column type info.
pub const MARIADB_CLIENT_EXTENDED_TYPE_INFO: u64 = 1 << 35;

// caching_sha2_password / sha256_password exchange bytes
pub const CACHING_SHA2_REQUEST_PUBLIC_KEY: u8 = 0x02;
pub const SHA256_REQUEST_PUBLIC_KEY: u8 = 0x01;
pub const CACHING_SHA2_FAST_AUTH_SUCCESS: u8 = 0x03;
pub const CACHING_SHA2_PERFORM_FULL_AUTH: u8 = 0x04;

/// Length of the scramble used by the password plugins.
pub const SEED_LENGTH: usize = 20;

/// Zero-date literal rendered for DATE columns.
pub const ZERO_DATE: &str = "0000-00-00";
/// Zero-datetime literal rendered for DATETIME/TIMESTAMP columns.
pub const ZERO_DATETIME: &str = "0000-00-00 00:00:00";
/// Zero-time literal rendered for TIME columns.
pub const ZERO_TIME: &str = "00:00:00";

// WKB geometry type codes
pub const WKB_POINT: u32 = 1;
pub const WKB_LINESTRING: u32 = 2;
pub const WKB_POLYGON: u32 = 3;
pub const WKB_MULTIPOINT: u32 = 4;
pub const WKB_MULTILINESTRING: u32 = 5;
pub const WKB_MULTIPOLYGON: u32 = 6;
pub const WKB_GEOMETRYCOLLECTION: u32 = 7;
