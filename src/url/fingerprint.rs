//! Request fingerprints used as cache keys

use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

/// Deterministic cache key for a request
///
/// Derived from the normalized URL plus the extraction parameters, so the same
/// page fetched as Markdown and as clean HTML gets two distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestFingerprint(String);

impl RequestFingerprint {
    /// Builds a fingerprint from an already-normalized URL and its parameters
    ///
    /// Parameter order does not matter.
    pub fn new(url: &Url, params: &[(&str, &str)]) -> Self {
        let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
        sorted.sort();

        let mut hasher = Sha256::new();
        hasher.update(url.as_str().as_bytes());
        for (key, value) in sorted {
            // NUL cannot appear in a URL, so fields cannot run together
            hasher.update([0u8]);
            hasher.update(key.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
        }

        Self(hex::encode(hasher.finalize()))
    }

    /// Hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for RequestFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
