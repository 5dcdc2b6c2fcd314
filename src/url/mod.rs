//! URL handling module for Scrape-Relay
//!
//! This module provides scheme defaulting, URL normalization, domain
//! extraction, wildcard domain matching and request fingerprinting.

mod domain;
mod fingerprint;
mod normalize;

pub use domain::{domain_slug, extract_domain, matches_wildcard};
pub use fingerprint::RequestFingerprint;
pub use normalize::{ensure_scheme, normalize_url};

use crate::{UrlError, UrlResult};
use url::Url;

/// A user-supplied URL in the two forms a fetch needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedUrl {
    /// The page exactly as asked for, with `https://` added when no scheme was given
    pub requested: Url,

    /// Canonical spelling used for cache keys and routing
    pub normalized: Url,
}

/// Accepts user input (possibly without a scheme) and prepares it for a fetch
///
/// Only `normalized` is rewritten; `requested` is what gets fetched.
///
/// # Examples
///
/// ```
/// use scrape_relay::url::prepare_url;
///
/// let url = prepare_url("www.Example.com/news/").unwrap();
/// assert_eq!(url.requested.as_str(), "https://www.example.com/news/");
/// assert_eq!(url.normalized.as_str(), "https://example.com/news");
/// ```
pub fn prepare_url(input: &str) -> UrlResult<PreparedUrl> {
    if input.trim().is_empty() {
        return Err(UrlError::Malformed("URL cannot be empty".to_string()));
    }
    let with_scheme = ensure_scheme(input);
    let normalized = normalize_url(&with_scheme)?;
    let requested = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;
    Ok(PreparedUrl {
        requested,
        normalized,
    })
}
