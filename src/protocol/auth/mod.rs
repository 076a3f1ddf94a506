//! Authentication plugin negotiation.
//!
//! A plugin is split in two: an immutable [`AuthenticationPlugin`]
//! descriptor shared by every connection, and an [`AuthSession`] created per
//! handshake by [`AuthenticationPlugin::initialize`] that owns the secret and
//! the server seed. Sessions never outlive one exchange.
//!
//! [`negotiate`] selects the plugin the server asked for, runs its exchange
//! and follows auth-switch requests until the server answers OK or ERR.

mod native;
mod pam;
mod sha256;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Error, Result};
use crate::protocol::connect::ConnectParams;
use crate::protocol::constants::{AUTH_MORE_DATA, AUTH_SWITCH_REQUEST, ERR_PACKET, OK_PACKET};
use crate::protocol::handshake::{parse_err_packet, AuthSwitchRequest, OkPacket};
use crate::protocol::packet::PacketChannel;

pub use native::{ClearPasswordPlugin, NativePasswordPlugin};
pub use pam::DialogPlugin;
pub use sha256::{CachingSha2PasswordPlugin, Sha256PasswordPlugin};

/// Plugin assumed when the server does not name one.
pub const DEFAULT_PLUGIN: &str = "mysql_native_password";

/// Descriptor of an authentication method, keyed by the name the server
/// advertises.
pub trait AuthenticationPlugin: Send + Sync {
    /// Plugin name as sent by the server.
    fn name(&self) -> &'static str;

    /// Whether the plugin may be used without being listed in
    /// `restricted_auth`.
    fn active_by_default(&self) -> bool {
        true
    }

    /// Bind the secret and seed for one handshake.
    ///
    /// Must not touch the transport; failures here abort before any write.
    fn initialize(
        &self,
        auth_data: &str,
        seed: &[u8],
        conf: &ConnectParams,
    ) -> Result<Box<dyn AuthSession>>;
}

/// Per-handshake exchange state.
#[async_trait]
pub trait AuthSession: Send {
    /// Run the plugin's exchange and return the server packet that ends it
    /// (OK, ERR, auth switch or anything the caller must interpret).
    async fn process(&mut self, channel: &mut dyn PacketChannel) -> Result<Bytes>;
}

/// Registered plugins.
#[derive(Clone)]
pub struct AuthRegistry {
    plugins: Vec<Arc<dyn AuthenticationPlugin>>,
}

impl Default for AuthRegistry {
    fn default() -> Self {
        Self {
            plugins: vec![
                Arc::new(NativePasswordPlugin),
                Arc::new(ClearPasswordPlugin),
                Arc::new(CachingSha2PasswordPlugin),
                Arc::new(Sha256PasswordPlugin),
                Arc::new(DialogPlugin),
            ],
        }
    }
}

impl AuthRegistry {
    /// Registry with no plugins.
    pub fn empty() -> Self {
        Self { plugins: Vec::new() }
    }

    /// Add a plugin; it replaces any plugin registered under the same name.
    pub fn register(&mut self, plugin: Arc<dyn AuthenticationPlugin>) {
        self.plugins.retain(|p| p.name() != plugin.name());
        self.plugins.push(plugin);
    }

    /// Exact-name lookup.
    pub fn find(&self, name: &str) -> Option<Arc<dyn AuthenticationPlugin>> {
        self.plugins.iter().find(|p| p.name() == name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.iter().map(|p| p.name())
    }

    /// Pick the plugin for `name`, honouring `restricted_auth`.
    pub fn select(&self, name: &str, conf: &ConnectParams) -> Result<Arc<dyn AuthenticationPlugin>> {
        let plugin = self.find(name).ok_or_else(|| Error::UnsupportedAuthPlugin {
            plugin: name.to_string(),
        })?;
        match &conf.restricted_auth {
            Some(allowed) if !allowed.iter().any(|p| p == name) => {
                Err(Error::RestrictedAuthPlugin {
                    plugin: name.to_string(),
                    allowed: allowed.join(","),
                })
            }
            None if !plugin.active_by_default() => Err(Error::UnsupportedAuthPlugin {
                plugin: name.to_string(),
            }),
            _ => {
                tracing::debug!(plugin = name, "selected authentication plugin");
                Ok(plugin)
            }
        }
    }

    /// Authenticate starting from the plugin the server advertised.
    ///
    /// Returns the final OK packet. A server ERR packet surfaces as
    /// [`Error::ServerError`].
    pub async fn negotiate(
        &self,
        channel: &mut dyn PacketChannel,
        plugin: &str,
        seed: &[u8],
        conf: &ConnectParams,
    ) -> Result<OkPacket> {
        let mut name = if plugin.is_empty() {
            DEFAULT_PLUGIN.to_string()
        } else {
            plugin.to_string()
        };
        let mut seed = Bytes::copy_from_slice(seed);

        loop {
            let selected = self.select(&name, conf)?;
            let mut session = selected.initialize(conf.password(), &seed, conf)?;
            let response = session.process(channel).await?;

            match response.first().copied() {
                Some(OK_PACKET) => return OkPacket::parse(response),
                Some(ERR_PACKET) => return Err(parse_err_packet(response)),
                Some(AUTH_SWITCH_REQUEST) => {
                    let switch = AuthSwitchRequest::parse(response)?;
                    tracing::debug!(plugin = %switch.plugin, "server requested auth switch");
                    name = switch.plugin;
                    seed = switch.seed;
                }
                Some(AUTH_MORE_DATA) => {
                    return Err(Error::protocol(format!(
                        "Unexpected auth more-data packet after plugin {}",
                        name
                    )))
                }
                Some(other) => {
                    return Err(Error::protocol(format!(
                        "Unexpected authentication response 0x{:02x}",
                        other
                    )))
                }
                None => return Err(Error::protocol("Empty authentication response")),
            }
        }
    }
}

/// [`AuthRegistry::negotiate`] with the built-in plugins.
pub async fn negotiate(
    channel: &mut dyn PacketChannel,
    plugin: &str,
    seed: &[u8],
    conf: &ConnectParams,
) -> Result<OkPacket> {
    AuthRegistry::default().negotiate(channel, plugin, seed, conf).await
}

/// Ends an exchange: OK, ERR or auth switch.
pub(crate) fn is_final(packet: &[u8]) -> bool {
    matches!(
        packet.first(),
        Some(&OK_PACKET) | Some(&ERR_PACKET) | Some(&AUTH_SWITCH_REQUEST)
    )
}


#[cfg(test)]
mod tests {
    use super::testing::{ScriptedChannel, OK};
    use super::*;
    use crate::error::ErrorKind;
    use crate::protocol::crypto::native_password_scramble;

    const SEED: &[u8] = b"abcdefghijklmnopqrst";

    fn conf() -> ConnectParams {
        ConnectParams::default().with_credentials("app", "secret")
    }

    #[test]
    fn test_select_by_exact_name() {
        let registry = AuthRegistry::default();
        assert_eq!(registry.select("dialog", &conf()).unwrap().name(), "dialog");
        let err = registry.select("Dialog", &conf()).err().unwrap();
        assert!(matches!(err, Error::UnsupportedAuthPlugin { .. }));
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
    }

    #[test]
    fn test_clear_password_is_opt_in() {
        let registry = AuthRegistry::default();
        assert!(registry.select("mysql_clear_password", &conf()).is_err());
        let conf = conf().with_restricted_auth(["mysql_clear_password"]);
        assert!(registry.select("mysql_clear_password", &conf).is_ok());
        let err = registry.select("mysql_native_password", &conf).err().unwrap();
        assert_eq!(
            err.to_string(),
            "Client restricts authentication plugins and doesn't permit requested plugin \
             ('mysql_native_password'). Current list is `restrictedAuth=mysql_clear_password`"
        );
    }

    #[tokio::test]
    async fn test_unknown_plugin_writes_nothing() {
        let mut channel = ScriptedChannel::new(&[OK]);
        let err = negotiate(&mut channel, "auth_gssapi_client", SEED, &conf()).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedAuthPlugin { ref plugin } if plugin == "auth_gssapi_client"));
        assert!(channel.writes.is_empty());
        assert_eq!(channel.reads.len(), 1);
    }

    #[tokio::test]
    async fn test_follows_auth_switch() {
        let mut switch = vec![0xfe];
        switch.extend_from_slice(b"mysql_native_password\0");
        switch.extend_from_slice(b"01234567890123456789\0");
        let mut channel = ScriptedChannel::new(&[&switch, OK]);

        let ok = negotiate(&mut channel, "dialog", SEED, &conf()).await.unwrap();
        assert_eq!(ok.server_status, 2);
        assert_eq!(channel.writes.len(), 2);
        assert_eq!(channel.writes[0], b"secret\0".to_vec());
        assert_eq!(
            channel.writes[1],
            native_password_scramble(b"secret", b"01234567890123456789")
        );
    }

    #[tokio::test]
    async fn test_switch_to_restricted_plugin_fails() {
        let mut channel = ScriptedChannel::new(&[b"\xfemysql_clear_password\0"]);
        let err = negotiate(&mut channel, "", SEED, &conf()).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedAuthPlugin { .. }));
        // only the native response went out
        assert_eq!(channel.writes.len(), 1);
    }

    #[tokio::test]
    async fn test_server_error_surfaces() {
        let mut channel = ScriptedChannel::new(&[b"\xff\x15\x04#28000Access denied for user 'app'"]);
        let err = negotiate(&mut channel, "mysql_native_password", SEED, &conf())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
        assert!(matches!(err, Error::ServerError { code: 1045, .. }));
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut registry = AuthRegistry::empty();
        registry.register(Arc::new(NativePasswordPlugin));
        registry.register(Arc::new(NativePasswordPlugin));
        assert_eq!(registry.names().count(), 1);
        assert!(registry.find("dialog").is_none());
    }
}
