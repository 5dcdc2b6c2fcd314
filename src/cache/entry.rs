//! Cache entry types and expiry policy

use crate::config::CacheConfig;
use crate::fetch::Artifact;
use crate::url::RequestFingerprint;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Lifecycle state of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    /// A fetch is in flight; lookups wait on it
    Pending,

    /// Fetch succeeded; the artifact is served to later lookups
    Ready,

    /// Fetch failed; the failure is served to later lookups (negative caching)
    Failed,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    /// Returns true once the entry has left `Pending`
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed fetch, as stored in `Failed` entries and broadcast to waiters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// Transient transport problem; eligible for force-refresh
    #[error("recoverable: {0}")]
    Recoverable(String),

    /// Malformed or empty backend response
    #[error("fatal: {0}")]
    Fatal(String),
}

impl FetchFailure {
    pub fn reason(&self) -> &str {
        match self {
            Self::Recoverable(reason) | Self::Fatal(reason) => reason,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable(_))
    }
}

/// Outcomes that end a fetch without leaving anything in the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The extractor reported that a specialized extractor owns this URL
    SpecializedExists,

    /// No session freed up in time
    PoolExhausted { waited_ms: u64 },

    /// The session pool was shut down
    PoolClosed,
}

/// How a fetch ended; every waiter on the same fetch observes the same value
#[derive(Debug, Clone)]
pub enum Resolution {
    Ready(Arc<Artifact>),
    Failed(FetchFailure),
    Rejected(Rejection),
}

impl Resolution {
    /// Returns true if committing this resolution leaves an entry behind
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// Snapshot of one cache entry
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fingerprint: RequestFingerprint,
    pub url: String,
    pub status: EntryStatus,
    pub artifact: Option<Arc<Artifact>>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<FetchFailure>,
}

impl CacheEntry {
    pub(crate) fn pending(fingerprint: RequestFingerprint, url: &str) -> Self {
        Self {
            fingerprint,
            url: url.to_string(),
            status: EntryStatus::Pending,
            artifact: None,
            created_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }

    /// Moves a pending entry to `Ready` or `Failed`
    pub(crate) fn complete(&mut self, resolution: &Resolution) {
        match resolution {
            Resolution::Ready(artifact) => {
                self.status = EntryStatus::Ready;
                self.artifact = Some(Arc::clone(artifact));
            }
            Resolution::Failed(failure) => {
                self.status = EntryStatus::Failed;
                self.error = Some(failure.clone());
            }
            Resolution::Rejected(_) => return,
        }
        self.completed_at = Some(Utc::now());
    }

    /// Time since the entry resolved, if it has
    pub fn age(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|done| Utc::now() - done)
    }

    /// Checks whether a resolved entry has outlived its policy TTL
    ///
    /// Pending entries never expire; they always resolve through their ticket.
    pub fn is_expired(&self, policy: &CachePolicy) -> bool {
        let ttl = match self.status {
            EntryStatus::Pending => return false,
            EntryStatus::Ready => policy.ready_ttl,
            EntryStatus::Failed => policy.failure_ttl,
        };

        match (ttl, self.age()) {
            (Some(ttl), Some(age)) => match chrono::Duration::from_std(ttl) {
                Ok(ttl) => age >= ttl,
                Err(_) => false,
            },
            _ => false,
        }
    }
}

/// Expiry rules for resolved entries
///
/// `None` means the entry is kept until a force-refresh replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CachePolicy {
    pub ready_ttl: Option<Duration>,
    pub failure_ttl: Option<Duration>,
}

impl CachePolicy {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            ready_ttl: config.ready_ttl_secs.map(Duration::from_secs),
            failure_ttl: config.failure_ttl_secs.map(Duration::from_secs),
        }
    }
}
