//! Handshake-phase packets: the server greeting, auth switch, OK and ERR.

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::constants::*;

/// Protocol version every supported server greets with.
const PROTOCOL_VERSION: u8 = 10;

/// Server greeting sent when the connection opens.
#[derive(Debug, Clone)]
pub struct InitialHandshake {
    pub server_version: String,
    pub connection_id: u32,
    /// Both seed parts concatenated, trailing NUL removed.
    pub seed: Bytes,
    /// Standard capabilities in the low 32 bits, MariaDB extensions above.
    pub capabilities: u64,
    pub default_collation: u8,
    pub server_status: u16,
    /// Plugin the server asks for first; empty when not advertised.
    pub auth_plugin: String,
}

impl InitialHandshake {
    pub fn parse(payload: Bytes) -> Result<Self> {
        let mut buf = ReadBuffer::new(payload);
        let protocol = buf.read_u8()?;
        if protocol == ERR_PACKET {
            return Err(parse_err_body(&mut buf));
        }
        if protocol != PROTOCOL_VERSION {
            return Err(Error::protocol(format!(
                "Unexpected handshake protocol version {}",
                protocol
            )));
        }

        let server_version = String::from_utf8_lossy(&buf.read_null_terminated()).into_owned();
        let connection_id = buf.read_u32_le()?;
        let seed1 = buf.read_bytes(8)?;
        buf.skip(1)?; // filler

        let caps_low = buf.read_u16_le()? as u64;
        let default_collation = buf.read_u8()?;
        let server_status = buf.read_u16_le()?;
        let caps_high = buf.read_u16_le()? as u64;
        let auth_data_len = buf.read_u8()? as usize;
        buf.skip(6)?;
        // MariaDB puts its own capability bits where MySQL has reserved bytes
        let mariadb_caps = buf.read_u32_le()? as u64;

        let mut capabilities = caps_low | (caps_high << 16);
        if capabilities & CLIENT_LONG_PASSWORD == 0 {
            // MariaDB servers clear this bit to announce the extended caps
            capabilities |= mariadb_caps << 32;
        }

        let mut seed = seed1.to_vec();
        if capabilities & CLIENT_SECURE_CONNECTION != 0 {
            let part2_len = auth_data_len.saturating_sub(8).max(13).min(buf.remaining());
            let part2 = buf.read_bytes(part2_len)?;
            let part2 = part2.strip_suffix(&[0]).unwrap_or(&part2[..]);
            seed.extend_from_slice(part2);
        }

        let auth_plugin = if capabilities & CLIENT_PLUGIN_AUTH != 0 {
            String::from_utf8_lossy(&buf.read_null_terminated()).into_owned()
        } else {
            String::new()
        };

        tracing::debug!(
            version = %server_version,
            connection_id,
            plugin = %auth_plugin,
            "parsed initial handshake"
        );

        Ok(Self {
            server_version,
            connection_id,
            seed: Bytes::from(seed),
            capabilities,
            default_collation,
            server_status,
            auth_plugin,
        })
    }

    /// Whether the server is MariaDB rather than MySQL.
    pub fn is_mariadb(&self) -> bool {
        self.server_version.contains("MariaDB")
    }

    pub fn has_capability(&self, flag: u64) -> bool {
        self.capabilities & flag != 0
    }
}

/// Request to restart authentication with another plugin (0xFE).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSwitchRequest {
    pub plugin: String,
    pub seed: Bytes,
}

impl AuthSwitchRequest {
    pub fn parse(payload: Bytes) -> Result<Self> {
        let mut buf = ReadBuffer::new(payload);
        let marker = buf.read_u8()?;
        if marker != AUTH_SWITCH_REQUEST {
            return Err(Error::protocol(format!(
                "Expected auth switch request, got 0x{:02x}",
                marker
            )));
        }
        let plugin = String::from_utf8_lossy(&buf.read_null_terminated()).into_owned();
        let rest = buf.read_remaining();
        let seed = match rest.strip_suffix(&[0]) {
            Some(trimmed) => rest.slice(..trimmed.len()),
            None => rest,
        };
        Ok(Self { plugin, seed })
    }
}

/// OK packet (0x00) ending a successful exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OkPacket {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub server_status: u16,
    pub warnings: u16,
}

impl OkPacket {
    pub fn parse(payload: Bytes) -> Result<Self> {
        let mut buf = ReadBuffer::new(payload);
        let marker = buf.read_u8()?;
        if marker != OK_PACKET {
            return Err(Error::protocol(format!("Expected OK packet, got 0x{:02x}", marker)));
        }
        let affected_rows = buf.read_length_encoded()?.unwrap_or(0);
        let last_insert_id = buf.read_length_encoded()?.unwrap_or(0);
        let server_status = buf.read_u16_le()?;
        let warnings = buf.read_u16_le()?;
        Ok(Self {
            affected_rows,
            last_insert_id,
            server_status,
            warnings,
        })
    }
}

/// Convert an ERR packet payload into [`Error::ServerError`].
pub fn parse_err_packet(payload: Bytes) -> Error {
    let mut buf = ReadBuffer::new(payload);
    match buf.read_u8() {
        Ok(ERR_PACKET) => parse_err_body(&mut buf),
        Ok(other) => Error::protocol(format!("Expected ERR packet, got 0x{:02x}", other)),
        Err(e) => e,
    }
}

/// `[code:2]['#' sql_state:5]?[message]`, marker already consumed.
fn parse_err_body(buf: &mut ReadBuffer) -> Error {
    let code = match buf.read_u16_le() {
        Ok(code) => code,
        Err(e) => return e,
    };
    let sql_state = if buf.peek_u8().ok() == Some(b'#') && buf.has_remaining(6) {
        let _ = buf.skip(1);
        buf.read_ascii(5).ok()
    } else {
        None
    };
    let message = String::from_utf8_lossy(&buf.read_remaining()).into_owned();
    tracing::debug!(code, ?sql_state, %message, "server error packet");
    Error::ServerError {
        code,
        sql_state,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greeting(plugin: &str) -> Vec<u8> {
        let mut p = vec![10];
        p.extend_from_slice(b"11.4.2-MariaDB\0");
        p.extend_from_slice(&7u32.to_le_bytes());
        p.extend_from_slice(b"abcdefgh");
        p.push(0);
        // low caps: SECURE_CONNECTION | PROTOCOL_41, no LONG_PASSWORD
        p.extend_from_slice(&0x8200u16.to_le_bytes());
        p.push(45);
        p.extend_from_slice(&SERVER_STATUS_NO_BACKSLASH_ESCAPES.to_le_bytes());
        // high caps: PLUGIN_AUTH
        p.extend_from_slice(&0x0008u16.to_le_bytes());
        p.push(21);
        p.extend_from_slice(&[0; 6]);
        p.extend_from_slice(&0x8u32.to_le_bytes());
        p.extend_from_slice(b"ijklmnopqrst\0");
        p.extend_from_slice(plugin.as_bytes());
        p.push(0);
        p
    }

    #[test]
    fn test_parse_initial_handshake() {
        let hs = InitialHandshake::parse(Bytes::from(greeting("mysql_native_password"))).unwrap();
        assert_eq!(hs.server_version, "11.4.2-MariaDB");
        assert!(hs.is_mariadb());
        assert_eq!(hs.connection_id, 7);
        assert_eq!(&hs.seed[..], b"abcdefghijklmnopqrst");
        assert_eq!(hs.default_collation, 45);
        assert_eq!(hs.server_status, SERVER_STATUS_NO_BACKSLASH_ESCAPES);
        assert!(hs.has_capability(CLIENT_PLUGIN_AUTH));
        assert!(hs.has_capability(MARIADB_CLIENT_EXTENDED_TYPE_INFO));
        assert_eq!(hs.auth_plugin, "mysql_native_password");
    }

    #[test]
    fn test_handshake_error() {
        let mut p = vec![0xff];
        p.extend_from_slice(&1040u16.to_le_bytes());
        p.extend_from_slice(b"Too many connections");
        let err = InitialHandshake::parse(Bytes::from(p)).unwrap_err();
        match err {
            Error::ServerError { code, sql_state, message } => {
                assert_eq!(code, 1040);
                assert_eq!(sql_state, None);
                assert_eq!(message, "Too many connections");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(InitialHandshake::parse(Bytes::from_static(&[9, 0])).is_err());
    }

    #[test]
    fn test_auth_switch() {
        let req = AuthSwitchRequest::parse(Bytes::from_static(b"\xfedialog\0seed\0")).unwrap();
        assert_eq!(req.plugin, "dialog");
        assert_eq!(&req.seed[..], b"seed");
        assert!(AuthSwitchRequest::parse(Bytes::from_static(b"\x00")).is_err());
    }

    #[test]
    fn test_err_packet_with_state() {
        let err = parse_err_packet(Bytes::from_static(b"\xff\x15\x04#28000Access denied"));
        assert_eq!(err.to_string(), "(1045) Access denied");
        assert!(matches!(err, Error::ServerError { sql_state: Some(ref s), .. } if s == "28000"));
    }

    #[test]
    fn test_ok_packet() {
        let ok = OkPacket::parse(Bytes::from_static(&[0, 0, 0, 2, 0, 0, 0])).unwrap();
        assert_eq!(ok.server_status, 2);
        assert!(OkPacket::parse(Bytes::from_static(&[0xff])).is_err());
    }
}
