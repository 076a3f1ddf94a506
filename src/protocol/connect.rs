//! Connection configuration consumed by the value layer and authentication.

use std::fmt;

use crate::error::{Error, Result};
use crate::protocol::decode::ZeroDatePolicy;

/// Default MariaDB port.
pub const DEFAULT_PORT: u16 = 3306;

/// Legacy option names and the names they map to.
const OPTION_ALIASES: &[(&str, &str)] = &[
    ("enabledSSLCipherSuites", "enabledSslCipherSuites"),
    ("serverRSAPublicKeyFile", "serverRsaPublicKeyFile"),
    ("useSsl", "sslMode"),
    ("useSSL", "sslMode"),
];

/// Resolve a legacy option name to its current name.
pub fn resolve_alias(key: &str) -> &str {
    OPTION_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map_or(key, |(_, name)| name)
}

/// TLS requirement for the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    #[default]
    Disable,
    /// Encrypt without validating the server certificate.
    Trust,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    /// Parse an option value; boolean spellings come from `useSsl`.
    pub fn parse(value: &str) -> Result<Self> {
        Ok(match value.to_ascii_lowercase().as_str() {
            "disable" | "false" | "0" => SslMode::Disable,
            "trust" => SslMode::Trust,
            "verify-ca" | "verify_ca" => SslMode::VerifyCa,
            "verify-full" | "verify_full" | "true" | "1" | "" => SslMode::VerifyFull,
            other => {
                return Err(Error::InvalidConnectString {
                    message: format!("Invalid sslMode: {}", other),
                })
            }
        })
    }
}

/// Connection parameters.
#[derive(Clone)]
pub struct ConnectParams {
    /// Host address.
    pub host: String,
    /// Port number.
    pub port: u16,
    /// Default database; may be empty.
    pub database: String,
    pub user: String,
    pub password: Option<String>,
    /// Plugins the client may negotiate. `None` allows every plugin that is
    /// active by default.
    pub restricted_auth: Option<Vec<String>>,
    /// Server RSA public key, as PEM text or a path to a PEM file.
    pub server_rsa_public_key: Option<String>,
    /// Allow asking the server for its RSA key over an insecure link.
    pub allow_public_key_retrieval: bool,
    /// Additional passwords for multi-factor `dialog` prompts.
    pub extra_passwords: Vec<String>,
    pub ssl_mode: SslMode,
    pub enabled_ssl_cipher_suites: Option<String>,
    /// Handling of all-zero DATE/DATETIME fields.
    pub zero_date_policy: ZeroDatePolicy,
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("restricted_auth", &self.restricted_auth)
            .field("allow_public_key_retrieval", &self.allow_public_key_retrieval)
            .field("extra_passwords", &self.extra_passwords.len())
            .field("ssl_mode", &self.ssl_mode)
            .field("zero_date_policy", &self.zero_date_policy)
            .finish_non_exhaustive()
    }
}

impl ConnectParams {
    /// Create new connection parameters.
    pub fn new(host: impl Into<String>, port: u16, database: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            user: String::new(),
            password: None,
            restricted_auth: None,
            server_rsa_public_key: None,
            allow_public_key_retrieval: false,
            extra_passwords: Vec::new(),
            ssl_mode: SslMode::default(),
            enabled_ssl_cipher_suites: None,
            zero_date_policy: ZeroDatePolicy::default(),
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = Some(password.into());
        self
    }

    /// Restrict negotiation to the listed plugins.
    pub fn with_restricted_auth<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.restricted_auth = Some(plugins.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_server_rsa_public_key(mut self, key: impl Into<String>) -> Self {
        self.server_rsa_public_key = Some(key.into());
        self
    }

    pub fn with_allow_public_key_retrieval(mut self, allow: bool) -> Self {
        self.allow_public_key_retrieval = allow;
        self
    }

    pub fn with_extra_passwords(mut self, passwords: Vec<String>) -> Self {
        self.extra_passwords = passwords;
        self
    }

    pub fn with_ssl_mode(mut self, mode: SslMode) -> Self {
        self.ssl_mode = mode;
        self
    }

    pub fn with_zero_date_policy(mut self, policy: ZeroDatePolicy) -> Self {
        self.zero_date_policy = policy;
        self
    }

    /// Parse a connection string like "host:port/database".
    pub fn parse(conn_str: &str) -> Result<Self> {
        // Format: host:port/database, host/database or host (default port 3306)
        let (addr_part, database) = conn_str.split_once('/').unwrap_or((conn_str, ""));
        if addr_part.is_empty() {
            return Err(Error::InvalidConnectString {
                message: "Expected format: host[:port]/database".to_string(),
            });
        }

        let (host, port) = if let Some((h, p)) = addr_part.rsplit_once(':') {
            let port = p.parse::<u16>().map_err(|_| Error::InvalidConnectString {
                message: format!("Invalid port: {}", p),
            })?;
            (h.to_string(), port)
        } else {
            (addr_part.to_string(), DEFAULT_PORT)
        };

        Ok(Self::new(host, port, database))
    }

    /// Apply key/value options, resolving legacy aliases first.
    ///
    /// Unknown keys are logged and ignored.
    pub fn from_options<'a, I>(mut self, options: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (key, value) in options {
            let name = resolve_alias(key);
            if name != key {
                tracing::debug!(alias = key, option = name, "resolved option alias");
            }
            match name {
                "user" => self.user = value.to_string(),
                "password" => self.password = Some(value.to_string()),
                "password2" | "password3" => self.extra_passwords.push(value.to_string()),
                "database" => self.database = value.to_string(),
                "restrictedAuth" => {
                    self.restricted_auth = Some(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(String::from)
                            .collect(),
                    )
                }
                "serverRsaPublicKeyFile" => self.server_rsa_public_key = Some(value.to_string()),
                "allowPublicKeyRetrieval" => self.allow_public_key_retrieval = parse_bool(name, value)?,
                "sslMode" => self.ssl_mode = SslMode::parse(value)?,
                "enabledSslCipherSuites" => self.enabled_ssl_cipher_suites = Some(value.to_string()),
                "zeroDatePolicy" => {
                    self.zero_date_policy = match value {
                        "zeroLiteral" => ZeroDatePolicy::RenderAsZeroLiteral,
                        "reject" => ZeroDatePolicy::Reject,
                        other => {
                            return Err(Error::InvalidConnectString {
                                message: format!("Invalid zeroDatePolicy: {}", other),
                            })
                        }
                    }
                }
                _ => tracing::warn!(option = key, "ignoring unknown connection option"),
            }
        }
        Ok(self)
    }

    /// The secret handed to authentication plugins; empty when unset.
    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or("")
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(Error::InvalidConnectString {
            message: format!("Invalid boolean for {}: {}", name, value),
        }),
    }
}

impl Default for ConnectParams {
    fn default() -> Self {
        Self::new("localhost", DEFAULT_PORT, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connect_string() {
        let p = ConnectParams::parse("db.local:3307/shop").unwrap();
        assert_eq!(p.host, "db.local");
        assert_eq!(p.port, 3307);
        assert_eq!(p.database, "shop");

        let p = ConnectParams::parse("db.local").unwrap();
        assert_eq!(p.port, DEFAULT_PORT);
        assert_eq!(p.database, "");

        assert!(ConnectParams::parse("host:abc/db").is_err());
        assert!(ConnectParams::parse("/db").is_err());
    }

    #[test]
    fn test_aliases() {
        assert_eq!(resolve_alias("useSSL"), "sslMode");
        assert_eq!(resolve_alias("serverRSAPublicKeyFile"), "serverRsaPublicKeyFile");
        assert_eq!(resolve_alias("user"), "user");

        let p = ConnectParams::default()
            .from_options([
                ("useSsl", "true"),
                ("enabledSSLCipherSuites", "TLS_AES_256_GCM_SHA384"),
                ("serverRSAPublicKeyFile", "/etc/mysql/public.pem"),
                ("restrictedAuth", "mysql_native_password, dialog"),
                ("password2", "otp"),
                ("zeroDatePolicy", "reject"),
            ])
            .unwrap();
        assert_eq!(p.ssl_mode, SslMode::VerifyFull);
        assert_eq!(p.enabled_ssl_cipher_suites.as_deref(), Some("TLS_AES_256_GCM_SHA384"));
        assert_eq!(p.server_rsa_public_key.as_deref(), Some("/etc/mysql/public.pem"));
        assert_eq!(
            p.restricted_auth,
            Some(vec!["mysql_native_password".to_string(), "dialog".to_string()])
        );
        assert_eq!(p.extra_passwords, vec!["otp".to_string()]);
        assert_eq!(p.zero_date_policy, ZeroDatePolicy::Reject);
    }

    #[test]
    fn test_invalid_option_values() {
        assert!(ConnectParams::default().from_options([("sslMode", "sometimes")]).is_err());
        assert!(ConnectParams::default()
            .from_options([("allowPublicKeyRetrieval", "maybe")])
            .is_err());
    }

    #[test]
    fn test_debug_hides_password() {
        let p = ConnectParams::default().with_credentials("root", "s3cret");
        assert!(!format!("{:?}", p).contains("s3cret"));
        assert_eq!(p.password(), "s3cret");
    }
}
