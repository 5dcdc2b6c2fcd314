//! Specialized-extractor registry
//!
//! Some sites have a dedicated, higher-fidelity extractor. Generic extraction
//! is refused for those URLs; the registry only answers whether one exists.

use crate::config::SpecializedEntry;
use crate::url::{extract_domain, matches_wildcard};
use url::Url;

/// Answers whether a specialized extractor is registered for a URL
pub trait SpecializedRegistry: Send + Sync {
    fn has_specialized(&self, url: &Url) -> bool;
}

/// Registry backed by a list of domain patterns
#[derive(Debug, Clone, Default)]
pub struct DomainRegistry {
    patterns: Vec<String>,
}

impl DomainRegistry {
    /// Creates a registry from domain patterns (`example.com`, `*.example.com`)
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .collect(),
        }
    }

    /// Builds the registry from the `[[specialized]]` config entries
    pub fn from_entries(entries: &[SpecializedEntry]) -> Self {
        Self::new(entries.iter().map(|e| e.domain.clone()))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl SpecializedRegistry for DomainRegistry {
    fn has_specialized(&self, url: &Url) -> bool {
        let Some(domain) = extract_domain(url) else {
            return false;
        };
        self.patterns
            .iter()
            .any(|pattern| matches_wildcard(pattern, &domain))
    }
}

/// Registry with nothing registered; every URL goes to generic extraction
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpecialized;

impl SpecializedRegistry for NoSpecialized {
    fn has_specialized(&self, _url: &Url) -> bool {
        false
    }
}
