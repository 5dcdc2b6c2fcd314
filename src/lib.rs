//! Scrape-Relay: cached, deduplicated page extraction
//!
//! This crate fetches page content through an extraction backend, collapses
//! concurrent requests for the same page into a single fetch, caches results
//! (including recent failures), refuses generic extraction for sites that have
//! a specialized extractor, and presents the result through a chain of viewers.

pub mod cache;
pub mod config;
pub mod fetch;
pub mod output;
pub mod registry;
pub mod render;
pub mod session;
pub mod url;

use thiserror::Error;

/// Main error type for Scrape-Relay operations
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("A specialized scraper exists for {url}")]
    SpecializedScraperExists { url: String },

    #[error("No session became available within {waited_ms}ms")]
    PoolExhausted { waited_ms: u64 },

    #[error("Session pool is closed")]
    PoolClosed,

    #[error("Timed out after {waited_ms}ms waiting for {url}")]
    Timeout { url: String, waited_ms: u64 },

    #[error("Recoverable fetch failure for {url}: {reason}")]
    Recoverable { url: String, reason: String },

    #[error("Fatal fetch failure for {url}: {reason}")]
    Fatal { url: String, reason: String },

    #[error("Session error: {0}")]
    Session(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Returns true if the caller may reasonably retry the same request
    ///
    /// `SpecializedScraperExists` is a routing decision and never retryable.
    /// `Fatal` failures stay cached until an explicit force-refresh, so a
    /// plain retry would only observe the same failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PoolExhausted { .. }
                | Self::PoolClosed
                | Self::Timeout { .. }
                | Self::Recoverable { .. }
        )
    }

    /// Builds the caller-facing error for a cached or broadcast fetch failure
    pub fn from_failure(url: &str, failure: cache::FetchFailure) -> Self {
        match failure {
            cache::FetchFailure::Recoverable(reason) => Self::Recoverable {
                url: url.to_string(),
                reason,
            },
            cache::FetchFailure::Fatal(reason) => Self::Fatal {
                url: url.to_string(),
                reason,
            },
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Scrape-Relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use cache::{CacheStore, FetchFailure};
pub use config::Config;
pub use fetch::{Artifact, ContentType, Orchestrator, ResolveOptions};
pub use url::{normalize_url, RequestFingerprint};
