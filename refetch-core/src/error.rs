//! Error types for REFETCH operations

use std::path::PathBuf;
use thiserror::Error;

/// Classification of failures that happened below the HTTP status layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Could not reach the server (DNS, refused connection, TLS).
    Connect,
    /// The request exceeded the configured timeout.
    Timeout,
    /// The response body was not the JSON we expected.
    Decode,
    /// Anything else the transport could not classify.
    Other,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Decode => "decode",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Normalized failure of one logical request.
///
/// `Clone` is required: a deduplicated read hands the same outcome to every
/// caller that joined it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("Transport error ({kind}): {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ClientError {
    /// Create a transport error of the given kind.
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    /// Create a decode failure.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::transport(TransportErrorKind::Decode, message)
    }

    /// Build a status error from a non-2xx response.
    ///
    /// The message comes from the body's `error` field when it is a string,
    /// otherwise it falls back to `HTTP {status}`.
    pub fn from_status(status: u16, body: Option<&serde_json::Value>) -> Self {
        let message = body
            .and_then(|json| json.get("error"))
            .and_then(|err| err.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status));
        Self::Status { status, message }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Master error type for all REFETCH errors.
#[derive(Debug, Error)]
pub enum RefetchError {
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for REFETCH operations.
pub type RefetchResult<T> = Result<T, RefetchError>;

// =============================================================================
// TESTS
// =============================================================================
