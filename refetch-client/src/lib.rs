//! REFETCH HTTP client.
//!
//! [`HttpClient`] issues one logical request at a time. Reads (GET) go
//! through the shared [`CacheStore`] and [`PendingRequestRegistry`]; writes
//! always reach the network and may invalidate cached paths on success.
//! The [`Transport`] trait is the seam to the actual wire; production uses
//! [`ReqwestTransport`].
//!
//! [`CacheStore`]: refetch_cache::CacheStore
//! [`PendingRequestRegistry`]: refetch_cache::PendingRequestRegistry

pub mod client;
pub mod endpoints;
pub mod metrics;
pub mod transport;

pub use client::{HttpClient, RequestOptions};
pub use metrics::{ClientMetrics, ResponseTimes};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
