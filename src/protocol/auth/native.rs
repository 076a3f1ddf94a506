//! `mysql_native_password` and `mysql_clear_password`.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::protocol::connect::ConnectParams;
use crate::protocol::crypto::native_password_scramble;
use crate::protocol::packet::PacketChannel;

use super::{AuthSession, AuthenticationPlugin};

/// SHA-1 challenge/response.
#[derive(Debug, Clone, Copy)]
pub struct NativePasswordPlugin;

impl AuthenticationPlugin for NativePasswordPlugin {
    fn name(&self) -> &'static str {
        "mysql_native_password"
    }

    fn initialize(&self, auth_data: &str, seed: &[u8], _: &ConnectParams) -> Result<Box<dyn AuthSession>> {
        // the scramble is computed here; the session only carries the result
        Ok(Box::new(SingleResponse {
            response: native_password_scramble(auth_data.as_bytes(), seed),
        }))
    }
}

/// Cleartext password, NUL-terminated. Only used when listed in
/// `restricted_auth`.
#[derive(Debug, Clone, Copy)]
pub struct ClearPasswordPlugin;

impl AuthenticationPlugin for ClearPasswordPlugin {
    fn name(&self) -> &'static str {
        "mysql_clear_password"
    }

    fn active_by_default(&self) -> bool {
        false
    }

    fn initialize(&self, auth_data: &str, _: &[u8], _: &ConnectParams) -> Result<Box<dyn AuthSession>> {
        let mut response = Vec::with_capacity(auth_data.len() + 1);
        response.extend_from_slice(auth_data.as_bytes());
        response.push(0);
        Ok(Box::new(SingleResponse { response }))
    }
}

/// Write one precomputed packet and hand back the server's answer.
struct SingleResponse {
    response: Vec<u8>,
}

#[async_trait]
impl AuthSession for SingleResponse {
    async fn process(&mut self, channel: &mut dyn PacketChannel) -> Result<Bytes> {
        channel.write_packet(&self.response).await?;
        channel.read_packet().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::auth::negotiate;
    use crate::protocol::packet::PacketStream;
    use tokio_test::io::Builder;

    const SEED: &[u8] = b"abcdefghijklmnopqrst";

    #[tokio::test]
    async fn test_native_over_packet_stream() {
        let scramble = native_password_scramble(b"secret", SEED);
        let mut expected = vec![20, 0, 0, 0];
        expected.extend_from_slice(&scramble);
        let mock = Builder::new()
            .write(&expected)
            .read(&[7, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0])
            .build();
        let mut stream = PacketStream::new(mock);
        let conf = ConnectParams::default().with_credentials("app", "secret");
        let ok = negotiate(&mut stream, "mysql_native_password", SEED, &conf).await.unwrap();
        assert_eq!(ok.server_status, 2);
    }

    #[tokio::test]
    async fn test_empty_password_sends_empty_packet() {
        let mock = Builder::new()
            .write(&[0, 0, 0, 0])
            .read(&[7, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0])
            .build();
        let mut stream = PacketStream::new(mock);
        negotiate(&mut stream, "mysql_native_password", SEED, &ConnectParams::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_clear_password_response() {
        let mut session = ClearPasswordPlugin
            .initialize("pw", SEED, &ConnectParams::default())
            .unwrap();
        let mut channel = crate::protocol::auth::testing::ScriptedChannel::new(&[&[0, 0, 0, 0, 0, 0, 0]]);
        let reply = session.process(&mut channel).await.unwrap();
        assert_eq!(reply[0], 0);
        assert_eq!(channel.writes, vec![b"pw\0".to_vec()]);
    }
}
