//! Principal-scoped request fingerprints.
//!
//! A `RequestFingerprint` cannot be built without naming the principal the
//! request runs as, so two callers with different bearer tokens can never
//! land on the same cache or dedup slot. The token itself is never stored:
//! the principal is a digest prefix of it.

use sha2::{Digest, Sha256};
use std::fmt;

/// Number of digest bytes kept to identify a principal.
const PRINCIPAL_DIGEST_BYTES: usize = 16;

/// Identity of the caller a request is made for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Principal {
    /// No bearer token was supplied.
    Anonymous,
    /// Hex digest prefix of the bearer token.
    Token(String),
}

impl Principal {
    /// Derive the principal for an optional bearer token.
    ///
    /// An empty token is treated the same as no token.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some(token) if !token.is_empty() => {
                let digest = Sha256::digest(token.as_bytes());
                Self::Token(hex::encode(&digest[..PRINCIPAL_DIGEST_BYTES]))
            }
            _ => Self::Anonymous,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("anonymous"),
            Self::Token(digest) => f.write_str(digest),
        }
    }
}

/// Deterministic cache key for (request path, principal).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestFingerprint {
    inner: FingerprintInner,
}

/// Private inner data - cannot be constructed externally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct FingerprintInner {
    path: String,
    principal: Principal,
}

impl RequestFingerprint {
    /// Fingerprint a request path for the given bearer token.
    pub fn new(path: impl Into<String>, token: Option<&str>) -> Self {
        Self::for_principal(path, Principal::from_token(token))
    }

    /// Fingerprint a request path for an already derived principal.
    pub fn for_principal(path: impl Into<String>, principal: Principal) -> Self {
        Self {
            inner: FingerprintInner {
                path: path.into(),
                principal,
            },
        }
    }

    pub fn path(&self) -> &str {
        &self.inner.path
    }

    pub fn principal(&self) -> &Principal {
        &self.inner.principal
    }

    /// Returns true when this key's path starts with `prefix`.
    pub fn path_starts_with(&self, prefix: &str) -> bool {
        self.inner.path.starts_with(prefix)
    }
}

impl fmt::Display for RequestFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.inner.path, self.inner.principal)
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn token_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z0-9._-]{1,64}"
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        /// Property: distinct tokens never share a fingerprint for the same path.
        #[test]
        fn prop_principal_isolation(
            path in "/[a-z]{1,12}(\\?[a-z]=[0-9]{1,3})?",
            token_a in token_strategy(),
            token_b in token_strategy(),
        ) {
            prop_assume!(token_a != token_b);
            let a = RequestFingerprint::new(path.clone(), Some(&token_a));
            let b = RequestFingerprint::new(path, Some(&token_b));
            prop_assert_ne!(a, b);
        }

        /// Property: fingerprinting is deterministic.
        #[test]
        fn prop_fingerprint_deterministic(
            path in "/[a-z/]{1,24}",
            token in proptest::option::of(token_strategy()),
        ) {
            let a = RequestFingerprint::new(path.clone(), token.as_deref());
            let b = RequestFingerprint::new(path, token.as_deref());
            prop_assert_eq!(a, b);
        }

        /// Property: different paths never collide for the same principal.
        #[test]
        fn prop_paths_distinguish(
            path_a in "/[a-z]{1,12}",
            path_b in "/[a-z]{1,12}",
            token in proptest::option::of(token_strategy()),
        ) {
            prop_assume!(path_a != path_b);
            let a = RequestFingerprint::new(path_a, token.as_deref());
            let b = RequestFingerprint::new(path_b, token.as_deref());
            prop_assert_ne!(a, b);
        }
    }
}
