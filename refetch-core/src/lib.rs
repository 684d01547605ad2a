//! REFETCH Core - Shared Types
//!
//! Data types every other refetch crate depends on: the error taxonomy,
//! the HTTP method vocabulary, request fingerprints and the configuration
//! schema. No I/O lives here apart from reading the config file.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod method;

pub use config::{CacheSettings, ClientConfig, FetchSettings, LogFormat};
pub use error::{ClientError, ConfigError, RefetchError, RefetchResult, TransportErrorKind};
pub use fingerprint::{Principal, RequestFingerprint};
pub use method::Method;

/// Wall-clock timestamp used for display fields.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
