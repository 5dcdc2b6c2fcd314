//! Fetch orchestration
//!
//! # Request Flow
//!
//! 1. Prepare the URL (`https://` is assumed when no scheme is given); the
//!    normalized form keys the cache, the requested form is what gets fetched
//! 2. Route check: URLs with a specialized extractor are rejected before the
//!    cache is touched
//! 3. Cache lookup: hit, negative hit, join an in-flight fetch, or own a new one
//! 4. Owner only: spawn the fetch (acquire session, extract, classify, commit)
//! 5. Wait for the outcome with the caller's own timeout
//!
//! The fetch runs on its own task so that a caller timing out or being
//! cancelled never abandons a fetch other callers are waiting on.

use crate::cache::{Begin, CachePolicy, CacheStore, FetchFailure, Rejection, Resolution};
use crate::config::{Config, ExtractionMode, FetchConfig};
use crate::fetch::artifact::Artifact;
use crate::fetch::extractor::{classify, Classification, Extractor, ExtractorError};
use crate::registry::{DomainRegistry, SpecializedRegistry};
use crate::session::{SessionFactory, SessionPool};
use crate::url::{prepare_url, PreparedUrl, RequestFingerprint};
use crate::RelayError;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Per-call options for [`Orchestrator::resolve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// How long this caller waits for the outcome
    pub timeout: Duration,

    /// Ignore a cached `Ready`/`Failed` entry and fetch again
    pub force_refresh: bool,
}

impl ResolveOptions {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            timeout: config.timeout(),
            force_refresh: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn force_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Fixed settings shared by every fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    /// Extraction mode; part of every fingerprint
    pub mode: ExtractionMode,
    pub acquire_timeout: Duration,
    pub extract_timeout: Duration,
}

impl FetchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.extractor.mode,
            acquire_timeout: config.pool.acquire_timeout(),
            extract_timeout: config.fetch.extract_timeout(),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

struct Shared<F: SessionFactory, X> {
    pool: SessionPool<F>,
    cache: CacheStore,
    registry: Arc<dyn SpecializedRegistry>,
    extractor: X,
    settings: FetchSettings,
}

/// Resolves URLs to artifacts through the cache, the session pool and the extractor
pub struct Orchestrator<F: SessionFactory, X> {
    shared: Arc<Shared<F, X>>,
}

impl<F: SessionFactory, X> Clone for Orchestrator<F, X> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F, X> Orchestrator<F, X>
where
    F: SessionFactory,
    X: Extractor<F::Handle>,
{
    pub fn new(
        pool: SessionPool<F>,
        cache: CacheStore,
        registry: Arc<dyn SpecializedRegistry>,
        extractor: X,
        settings: FetchSettings,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                pool,
                cache,
                registry,
                extractor,
                settings,
            }),
        }
    }

    /// Wires a pool, cache and registry from configuration around `factory` and `extractor`
    pub fn from_config(config: &Config, factory: F, extractor: X) -> Self {
        Self::new(
            SessionPool::new(factory, config.pool.size as usize),
            CacheStore::new(CachePolicy::from_config(&config.cache)),
            Arc::new(DomainRegistry::from_entries(&config.specialized)),
            extractor,
            FetchSettings::from_config(config),
        )
    }

    pub fn cache(&self) -> &CacheStore {
        &self.shared.cache
    }

    pub fn pool(&self) -> &SessionPool<F> {
        &self.shared.pool
    }

    pub fn settings(&self) -> FetchSettings {
        self.shared.settings
    }

    /// Cache key for an already-normalized URL under this orchestrator's mode
    pub fn fingerprint(&self, url: &Url) -> RequestFingerprint {
        RequestFingerprint::new(url, &[("mode", self.shared.settings.mode.as_str())])
    }

    /// Resolves a URL to its artifact
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<Artifact>)` - Fresh or cached content
    /// * `Err(RelayError::SpecializedScraperExists)` - Generic extraction refused
    /// * `Err(RelayError::Recoverable | RelayError::Fatal)` - This or a cached fetch failed
    /// * `Err(RelayError::Timeout)` - The outcome did not arrive within `options.timeout`
    /// * `Err(RelayError::PoolExhausted | RelayError::PoolClosed)` - No session for the fetch
    /// * `Err(RelayError::Url)` - The input is not a usable http(s) URL
    pub async fn resolve(
        &self,
        input: &str,
        options: ResolveOptions,
    ) -> crate::Result<Arc<Artifact>> {
        let PreparedUrl {
            requested,
            normalized,
        } = prepare_url(input)?;

        if self.shared.registry.has_specialized(&normalized) {
            tracing::info!("Specialized scraper registered for {}, skipping", requested);
            return Err(RelayError::SpecializedScraperExists {
                url: requested.to_string(),
            });
        }

        let fingerprint = self.fingerprint(&normalized);
        let waiter = match self
            .shared
            .cache
            .begin(&fingerprint, requested.as_str(), options.force_refresh)
        {
            Begin::Hit(artifact) => return Ok(artifact),
            Begin::NegativeHit(failure) => {
                return Err(RelayError::from_failure(requested.as_str(), failure))
            }
            Begin::Wait(waiter) => waiter,
            Begin::Owner(ticket) => {
                let waiter = ticket.waiter();
                let shared = Arc::clone(&self.shared);
                let fetch_url = requested.clone();
                tokio::spawn(async move {
                    let resolution = shared.fetch(&fetch_url).await;
                    ticket.commit(resolution);
                });
                waiter
            }
        };

        let resolution = waiter.wait(options.timeout).await?;
        into_result(requested.as_str(), resolution)
    }

    /// Shuts the session pool down; later fetches fail with `PoolClosed`
    pub async fn shutdown(&self) {
        self.shared.pool.shutdown().await;
    }
}

impl<F, X> Shared<F, X>
where
    F: SessionFactory,
    X: Extractor<F::Handle>,
{
    /// SessionAcquire -> Extract -> Classify
    async fn fetch(&self, url: &Url) -> Resolution {
        let mut session = match self.pool.acquire(self.settings.acquire_timeout).await {
            Ok(session) => session,
            Err(RelayError::PoolExhausted { waited_ms }) => {
                return Resolution::Rejected(Rejection::PoolExhausted { waited_ms })
            }
            Err(RelayError::PoolClosed) => return Resolution::Rejected(Rejection::PoolClosed),
            Err(e) => {
                tracing::warn!("Could not start a session for {}: {}", url, e);
                return Resolution::Failed(FetchFailure::Recoverable(format!(
                    "session launch failed: {}",
                    e
                )));
            }
        };

        let extract_timeout = self.settings.extract_timeout;
        let outcome = match tokio::time::timeout(
            extract_timeout,
            self.extractor.extract(session.handle_mut(), url),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                // The session stopped responding; it cannot be trusted again
                session.mark_unrecoverable();
                Err(ExtractorError::network(format!(
                    "extraction did not finish within {}ms",
                    extract_timeout.as_millis()
                )))
            }
        };

        let session_id = session.id();
        self.pool.release(session).await;

        let classification = classify(url, outcome);
        match &classification {
            Classification::Success(artifact) => tracing::info!(
                "Fetched {} ({} bytes, {}) on session {}",
                url,
                artifact.len(),
                artifact.content_type,
                session_id
            ),
            Classification::RecoverableFailure(reason) | Classification::FatalFailure(reason) => {
                tracing::warn!("Fetch failed for {}: {}", url, reason)
            }
            Classification::SpecializedExists => {
                tracing::info!("Extractor reported a specialized scraper for {}", url)
            }
        }
        classification.into_resolution()
    }
}

fn into_result(url: &str, resolution: Resolution) -> crate::Result<Arc<Artifact>> {
    match resolution {
        Resolution::Ready(artifact) => Ok(artifact),
        Resolution::Failed(failure) => Err(RelayError::from_failure(url, failure)),
        Resolution::Rejected(Rejection::SpecializedExists) => {
            Err(RelayError::SpecializedScraperExists {
                url: url.to_string(),
            })
        }
        Resolution::Rejected(Rejection::PoolExhausted { waited_ms }) => {
            Err(RelayError::PoolExhausted { waited_ms })
        }
        Resolution::Rejected(Rejection::PoolClosed) => Err(RelayError::PoolClosed),
    }
}
