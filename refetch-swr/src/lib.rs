//! REFETCH stale-while-revalidate layer.
//!
//! A [`FetchController`] binds a query to a fetcher and tracks loading,
//! error and staleness for it. Newer operations supersede older ones via
//! [`CancellationToken`]s, and a [`RefreshScheduler`] revalidates stale
//! bindings in the background without flipping `loading`.

pub mod cancel;
pub mod controller;
pub mod presets;
pub mod scheduler;
pub mod state;

pub use cancel::{CancellationToken, TokenSource};
pub use controller::{FetchController, FetchOptions, Fetcher};
pub use scheduler::{BackgroundRefresh, RefreshScheduler, RegistrationId};
pub use state::{FetchSnapshot, FetchState};
