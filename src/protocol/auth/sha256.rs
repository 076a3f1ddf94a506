//! `caching_sha2_password` and `sha256_password`.
//!
//! Both fall back to sending the password itself: in clear over a secure
//! link, otherwise RSA-encrypted with the server's public key. The key comes
//! from `server_rsa_public_key` or, when `allow_public_key_retrieval` is set,
//! from the server.

use async_trait::async_trait;
use bytes::Bytes;
use rsa::RsaPublicKey;

use crate::error::{Error, Result};
use crate::protocol::connect::ConnectParams;
use crate::protocol::constants::{
    AUTH_MORE_DATA, CACHING_SHA2_FAST_AUTH_SUCCESS, CACHING_SHA2_PERFORM_FULL_AUTH,
    CACHING_SHA2_REQUEST_PUBLIC_KEY, SHA256_REQUEST_PUBLIC_KEY,
};
use crate::protocol::crypto::{caching_sha2_scramble, encrypt_password, parse_public_key};
use crate::protocol::packet::PacketChannel;

use super::{is_final, AuthSession, AuthenticationPlugin};

/// Password material shared by both SHA-256 sessions.
struct Sha256Credentials {
    password: String,
    seed: Vec<u8>,
    public_key: Option<RsaPublicKey>,
    allow_public_key_retrieval: bool,
}

impl Sha256Credentials {
    fn new(auth_data: &str, seed: &[u8], conf: &ConnectParams) -> Result<Self> {
        let public_key = match &conf.server_rsa_public_key {
            Some(key) => Some(parse_public_key(&load_public_key(key)?)?),
            None => None,
        };
        Ok(Self {
            password: auth_data.to_string(),
            seed: seed.to_vec(),
            public_key,
            allow_public_key_retrieval: conf.allow_public_key_retrieval,
        })
    }

    fn cleartext(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.password.len() + 1);
        out.extend_from_slice(self.password.as_bytes());
        out.push(0);
        out
    }

    /// Send the password in full, using `request_key` to ask the server for
    /// its RSA key when none is configured.
    async fn send_password(&self, channel: &mut dyn PacketChannel, request_key: u8) -> Result<()> {
        if channel.is_secure() {
            return channel.write_packet(&self.cleartext()).await;
        }
        let key = match &self.public_key {
            Some(key) => key.clone(),
            None if self.allow_public_key_retrieval => {
                tracing::debug!("requesting server RSA public key");
                channel.write_packet(&[request_key]).await?;
                let packet = channel.read_packet().await?;
                let pem = match packet.first() {
                    Some(&AUTH_MORE_DATA) => &packet[1..],
                    _ => &packet[..],
                };
                parse_public_key(&String::from_utf8_lossy(pem))?
            }
            None => {
                return Err(Error::authentication(
                    "RSA public key is not available client side (option serverRsaPublicKeyFile not set)",
                ))
            }
        };
        let encrypted = encrypt_password(self.password.as_bytes(), &self.seed, &key)?;
        channel.write_packet(&encrypted).await
    }
}

/// Key given inline as PEM or as a path to a PEM file.
fn load_public_key(value: &str) -> Result<String> {
    if value.trim_start().starts_with("-----BEGIN") {
        return Ok(value.to_string());
    }
    std::fs::read_to_string(value).map_err(|e| {
        Error::authentication(format!("Could not read server RSA public key from {}: {}", value, e))
    })
}

/// SHA-256 scramble with a server-side cache; full authentication on a
/// cache miss.
#[derive(Debug, Clone, Copy)]
pub struct CachingSha2PasswordPlugin;

impl AuthenticationPlugin for CachingSha2PasswordPlugin {
    fn name(&self) -> &'static str {
        "caching_sha2_password"
    }

    fn initialize(&self, auth_data: &str, seed: &[u8], conf: &ConnectParams) -> Result<Box<dyn AuthSession>> {
        Ok(Box::new(CachingSha2Session {
            credentials: Sha256Credentials::new(auth_data, seed, conf)?,
        }))
    }
}

struct CachingSha2Session {
    credentials: Sha256Credentials,
}

#[async_trait]
impl AuthSession for CachingSha2Session {
    async fn process(&mut self, channel: &mut dyn PacketChannel) -> Result<Bytes> {
        let c = &self.credentials;
        channel
            .write_packet(&caching_sha2_scramble(c.password.as_bytes(), &c.seed))
            .await?;

        let packet = channel.read_packet().await?;
        if is_final(&packet) {
            return Ok(packet);
        }
        match (packet.first(), packet.get(1)) {
            (Some(&AUTH_MORE_DATA), Some(&CACHING_SHA2_FAST_AUTH_SUCCESS)) => {
                tracing::trace!("caching_sha2 fast authentication succeeded");
                channel.read_packet().await
            }
            (Some(&AUTH_MORE_DATA), Some(&CACHING_SHA2_PERFORM_FULL_AUTH)) => {
                tracing::debug!(secure = channel.is_secure(), "caching_sha2 full authentication");
                c.send_password(channel, CACHING_SHA2_REQUEST_PUBLIC_KEY).await?;
                channel.read_packet().await
            }
            _ => Err(Error::protocol(format!(
                "Unexpected caching_sha2_password response {:02x?}",
                &packet[..packet.len().min(2)]
            ))),
        }
    }
}

/// Password sent in clear over TLS or RSA-encrypted otherwise.
#[derive(Debug, Clone, Copy)]
pub struct Sha256PasswordPlugin;

impl AuthenticationPlugin for Sha256PasswordPlugin {
    fn name(&self) -> &'static str {
        "sha256_password"
    }

    fn initialize(&self, auth_data: &str, seed: &[u8], conf: &ConnectParams) -> Result<Box<dyn AuthSession>> {
        Ok(Box::new(Sha256Session {
            credentials: Sha256Credentials::new(auth_data, seed, conf)?,
        }))
    }
}

struct Sha256Session {
    credentials: Sha256Credentials,
}

#[async_trait]
impl AuthSession for Sha256Session {
    async fn process(&mut self, channel: &mut dyn PacketChannel) -> Result<Bytes> {
        let c = &self.credentials;
        if c.password.is_empty() {
            channel.write_packet(&[0]).await?;
        } else {
            c.send_password(channel, SHA256_REQUEST_PUBLIC_KEY).await?;
        }
        channel.read_packet().await
    }
}
