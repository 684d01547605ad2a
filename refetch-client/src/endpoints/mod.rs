//! Typed bindings for the backend's resource endpoints.
//!
//! Each module builds the paths and query strings for one resource and
//! names the cache prefix its writes invalidate.

pub mod ai;
pub mod articles;
pub mod auth;
pub mod calendar;
pub mod digests;
pub mod journals;
pub mod notes;

use std::fmt::Display;

/// Ordered query-string builder; values are percent-encoded.
#[derive(Debug, Default, Clone)]
pub(crate) struct Query {
    pairs: Vec<(&'static str, String)>,
}

impl Query {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn param(mut self, name: &'static str, value: impl Display) -> Self {
        self.pairs.push((name, value.to_string()));
        self
    }

    /// Add the pair only when `value` is non-empty.
    pub(crate) fn param_if_set(self, name: &'static str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.param(name, value)
        }
    }

    /// `path?k=v&...`, or just `path` without parameters.
    pub(crate) fn apply(&self, path: &str) -> String {
        if self.pairs.is_empty() {
            return path.to_string();
        }
        let encoded: Vec<String> = self
            .pairs
            .iter()
            .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
            .collect();
        format!("{}?{}", path, encoded.join("&"))
    }
}

/// Percent-encode one path segment.
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
