//! Error types for the MariaDB thin client value layer.

use std::io;
use std::panic::Location;
use thiserror::Error;

use crate::protocol::types::DataType;

/// Result type alias for value-layer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for decode, encode and authentication operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during network communication.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Connection closed by the peer in the middle of an exchange.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Protocol error.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Buffer too small.
    #[error("Buffer too small: need {needed} bytes, have {available} at {location}")]
    BufferTooSmall {
        needed: usize,
        available: usize,
        location: &'static Location<'static>,
    },

    /// Requested target type cannot be decoded from the column's wire type.
    #[error("Data type {data_type} cannot be decoded as {target}")]
    TypeMismatch {
        data_type: DataType,
        target: &'static str,
    },

    /// Decoded value does not fit the requested target type.
    #[error("value '{value}' overflows {target}")]
    Overflow { value: String, target: &'static str },

    /// Textual payload cannot be parsed as the requested target type.
    #[error("value '{value}' cannot be decoded as {target}")]
    MalformedLiteral { value: String, target: &'static str },

    /// No parameter codec accepts the bound value.
    #[error("Type {type_name} is not supported as a parameter")]
    UnsupportedEncodeType { type_name: &'static str },

    /// Unknown wire type code.
    #[error("Unsupported MariaDB data type: {type_num}")]
    UnsupportedType { type_num: u8 },

    /// Authentication failed.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Server requested a plugin the client does not implement.
    #[error(
        "Client does not support authentication protocol requested by server. plugin type was = '{plugin}'"
    )]
    UnsupportedAuthPlugin { plugin: String },

    /// Server requested a plugin excluded by the client configuration.
    #[error(
        "Client restricts authentication plugins and doesn't permit requested plugin ('{plugin}'). Current list is `restrictedAuth={allowed}`"
    )]
    RestrictedAuthPlugin { plugin: String, allowed: String },

    /// ERR packet sent by the server.
    #[error("({code}) {message}")]
    ServerError {
        code: u16,
        sql_state: Option<String>,
        message: String,
    },

    /// Invalid connect string or option.
    #[error("Invalid connect string: {message}")]
    InvalidConnectString { message: String },
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TypeMismatch,
    Overflow,
    MalformedLiteral,
    UnsupportedEncodeType,
    AuthenticationFailure,
    Transport,
    Protocol,
}

impl Error {
    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(data_type: DataType, target: &'static str) -> Self {
        tracing::debug!(%data_type, target, "column type cannot be decoded to requested target");
        Self::TypeMismatch { data_type, target }
    }

    /// Create an overflow error.
    pub fn overflow(value: impl Into<String>, target: &'static str) -> Self {
        Self::Overflow {
            value: value.into(),
            target,
        }
    }

    /// Create a malformed literal error.
    pub fn malformed(value: impl Into<String>, target: &'static str) -> Self {
        Self::MalformedLiteral {
            value: value.into(),
            target,
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            message: message.into(),
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Error::Overflow { .. } => ErrorKind::Overflow,
            Error::MalformedLiteral { .. } => ErrorKind::MalformedLiteral,
            Error::UnsupportedEncodeType { .. } => ErrorKind::UnsupportedEncodeType,
            Error::AuthenticationFailed { .. }
            | Error::UnsupportedAuthPlugin { .. }
            | Error::RestrictedAuthPlugin { .. }
            | Error::ServerError { .. } => ErrorKind::AuthenticationFailure,
            Error::Io(_) | Error::ConnectionClosed => ErrorKind::Transport,
            Error::Protocol { .. }
            | Error::BufferTooSmall { .. }
            | Error::UnsupportedType { .. }
            | Error::InvalidConnectString { .. } => ErrorKind::Protocol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_message() {
        let err = Error::type_mismatch(DataType::Blob, "Boolean");
        assert_eq!(err.to_string(), "Data type BLOB cannot be decoded as Boolean");
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_auth_errors_share_kind() {
        let missing = Error::UnsupportedAuthPlugin {
            plugin: "unknown".to_string(),
        };
        let server = Error::ServerError {
            code: 1045,
            sql_state: Some("28000".to_string()),
            message: "Access denied".to_string(),
        };
        assert_eq!(missing.kind(), ErrorKind::AuthenticationFailure);
        assert_eq!(server.kind(), ErrorKind::AuthenticationFailure);
        assert_eq!(server.to_string(), "(1045) Access denied");
    }
}
