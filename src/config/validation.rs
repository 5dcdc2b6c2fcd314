use crate::config::types::{
    Config, ExtractorConfig, FetchConfig, PoolConfig, RenderConfig, SpecializedEntry,
};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Upper bound on the session pool; each session may be a whole browser
const MAX_POOL_SIZE: u32 = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_extractor_config(&config.extractor)?;
    validate_pool_config(&config.pool)?;
    validate_fetch_config(&config.fetch)?;
    validate_render_config(&config.render)?;
    validate_specialized_domains(&config.specialized)?;
    Ok(())
}

/// Validates extraction backend configuration
fn validate_extractor_config(config: &ExtractorConfig) -> ConfigResult<()> {
    let endpoint = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))?;

    if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Endpoint '{}' must use http or https",
            config.endpoint
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_ms must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates session pool configuration
fn validate_pool_config(config: &PoolConfig) -> ConfigResult<()> {
    if config.size < 1 || config.size > MAX_POOL_SIZE {
        return Err(ConfigError::Validation(format!(
            "pool size must be between 1 and {}, got {}",
            MAX_POOL_SIZE, config.size
        )));
    }

    if config.acquire_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "acquire_timeout_ms must be > 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> ConfigResult<()> {
    if config.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "fetch timeout_ms must be > 0".to_string(),
        ));
    }

    if config.extract_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "extract_timeout_ms must be > 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_render_config(config: &RenderConfig) -> ConfigResult<()> {
    if config.converter.trim().is_empty() {
        return Err(ConfigError::Validation(
            "render converter cannot be empty".to_string(),
        ));
    }

    if config.editor.trim().is_empty() {
        return Err(ConfigError::Validation(
            "render editor cannot be empty".to_string(),
        ));
    }

    if let Some(viewer) = &config.viewer {
        if viewer.trim().is_empty() {
            return Err(ConfigError::Validation(
                "render viewer cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates specialized domain entries
fn validate_specialized_domains(domains: &[SpecializedEntry]) -> ConfigResult<()> {
    for entry in domains {
        validate_domain_pattern(&entry.domain)?;
    }
    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> ConfigResult<()> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    match pattern.strip_prefix("*.") {
        Some(domain) => validate_domain_string(domain),
        None => validate_domain_string(pattern),
    }
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> ConfigResult<()> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}
