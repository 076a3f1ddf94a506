//! MariaDB client/server protocol: framing, handshake, value codecs and
//! authentication.

pub mod auth;
pub mod buffer;
pub mod codec;
pub mod connect;
pub mod constants;
pub mod crypto;
pub mod decode;
pub mod handshake;
pub mod packet;
pub mod types;

pub use auth::{negotiate, AuthRegistry, AuthSession, AuthenticationPlugin};
pub use buffer::{ReadBuffer, WriteBuffer};
pub use codec::{Codec, Decode, EncodeContext, ParameterCodec};
pub use handshake::{AuthSwitchRequest, InitialHandshake, OkPacket};
pub use packet::{PacketChannel, PacketStream};
pub use types::{Column, ColumnInfo, DataType, Geometry, Protocol, Row, Value};
