//! MariaDB Thin Value Layer for Rust
//!
//! The part of a pure Rust MariaDB/MySQL client that sits between the
//! socket and the application: column definitions, row fields decoded into
//! Rust types for both the text and the binary protocol, parameters encoded
//! for either protocol, and the authentication plugin exchange.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use mariadb_thin_rs::{Column, ColumnInfo, DataType, Result, Row};
//!
//! fn main() -> Result<()> {
//!     let columns = Arc::new(ColumnInfo::new(vec![
//!         Column::new("id", DataType::Long),
//!         Column::new("name", DataType::VarString).with_charset(224),
//!     ]));
//!
//!     // text-protocol row: two length-encoded fields
//!     let row = Row::from_text(Bytes::from_static(b"\x0242\x05alice"), columns)?;
//!     let id: Option<i64> = row.get(0)?;
//!     let name: Option<String> = row.get_by_name("NAME")?;
//!     println!("{:?} {:?}", id, name);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod protocol;

// Re-export main types
pub use error::{Error, ErrorKind, Result};
pub use protocol::auth::{negotiate, AuthRegistry, AuthSession, AuthenticationPlugin};
pub use protocol::codec::{encode_binary, encode_text, Codec, Decode, EncodeContext, ParameterCodec};
pub use protocol::connect::{ConnectParams, SslMode};
pub use protocol::decode::ZeroDatePolicy;
pub use protocol::handshake::{InitialHandshake, OkPacket};
pub use protocol::packet::{PacketChannel, PacketStream};
pub use protocol::types::{
    Column, ColumnInfo, DataType, Geometry, LineString, Point, Polygon, Protocol, Row, Value,
};
