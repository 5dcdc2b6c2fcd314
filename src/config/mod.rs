//! Configuration module for Scrape-Relay
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; a missing file section falls back to defaults.
//!
//! # Example
//!
//! ```no_run
//! use scrape_relay::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("relay.toml")).unwrap();
//! println!("Pool size: {}", config.pool.size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CacheConfig, Config, ExtractionMode, ExtractorConfig, FetchConfig, PoolConfig, RenderConfig,
    SpecializedEntry,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
