//! Single-flight cache store
//!
//! The map lock is only held for lookups and state flips. Waiting happens on a
//! per-fetch `watch` channel owned by the [`FetchTicket`], so a slow fetch for
//! one fingerprint never blocks lookups for another.

use crate::cache::entry::{CacheEntry, CachePolicy, EntryStatus, FetchFailure, Resolution};
use crate::fetch::Artifact;
use crate::url::RequestFingerprint;
use crate::RelayError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

struct Slot {
    entry: CacheEntry,
    /// Present while the entry is `Pending`
    outcome: Option<watch::Receiver<Option<Resolution>>>,
}

struct StoreShared {
    policy: CachePolicy,
    slots: Mutex<HashMap<RequestFingerprint, Slot>>,
}

impl StoreShared {
    fn lock(&self) -> MutexGuard<'_, HashMap<RequestFingerprint, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Result of [`CacheStore::begin`]
pub enum Begin {
    /// Fresh `Ready` entry; no fetch needed
    Hit(Arc<Artifact>),

    /// Fresh `Failed` entry; the failure is returned without refetching
    NegativeHit(FetchFailure),

    /// Another caller's fetch is in flight; wait for it
    Wait(Waiter),

    /// Nothing usable was cached; the caller now owns the fetch
    Owner(FetchTicket),
}

/// In-memory fingerprint -> entry map with stampede protection
#[derive(Clone)]
pub struct CacheStore {
    shared: Arc<StoreShared>,
}

impl CacheStore {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            shared: Arc::new(StoreShared {
                policy,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.shared.policy
    }

    /// Looks up a fingerprint and decides who fetches
    ///
    /// Lookup and the creation of a `Pending` entry happen under one lock, so
    /// exactly one concurrent caller receives [`Begin::Owner`].
    ///
    /// With `force_refresh`, `Ready` and `Failed` entries are ignored. An
    /// in-flight fetch is still joined rather than duplicated.
    pub fn begin(&self, fingerprint: &RequestFingerprint, url: &str, force_refresh: bool) -> Begin {
        let mut slots = self.shared.lock();

        if let Some(slot) = slots.get(fingerprint) {
            let fresh = !force_refresh && !slot.entry.is_expired(&self.shared.policy);
            match slot.entry.status {
                EntryStatus::Pending => {
                    if let Some(rx) = &slot.outcome {
                        tracing::debug!("Joining in-flight fetch {}", fingerprint.short());
                        return Begin::Wait(Waiter {
                            url: slot.entry.url.clone(),
                            outcome: rx.clone(),
                        });
                    }
                }
                EntryStatus::Ready if fresh => {
                    if let Some(artifact) = &slot.entry.artifact {
                        tracing::debug!("Cache hit {}", fingerprint.short());
                        return Begin::Hit(Arc::clone(artifact));
                    }
                }
                EntryStatus::Failed if fresh => {
                    if let Some(failure) = &slot.entry.error {
                        tracing::debug!("Negative cache hit {}", fingerprint.short());
                        return Begin::NegativeHit(failure.clone());
                    }
                }
                _ => {}
            }
        }

        tracing::debug!(
            "Cache miss {} (force_refresh={})",
            fingerprint.short(),
            force_refresh
        );
        let (tx, rx) = watch::channel(None);
        slots.insert(
            fingerprint.clone(),
            Slot {
                entry: CacheEntry::pending(fingerprint.clone(), url),
                outcome: Some(rx),
            },
        );

        Begin::Owner(FetchTicket {
            fingerprint: fingerprint.clone(),
            url: url.to_string(),
            store: Arc::clone(&self.shared),
            outcome: tx,
            committed: false,
        })
    }

    /// Snapshot of the entry for a fingerprint
    pub fn entry(&self, fingerprint: &RequestFingerprint) -> Option<CacheEntry> {
        self.shared.lock().get(fingerprint).map(|slot| slot.entry.clone())
    }

    /// Drops a resolved entry; in-flight entries are left alone
    ///
    /// # Returns
    ///
    /// `true` if an entry was removed
    pub fn invalidate(&self, fingerprint: &RequestFingerprint) -> bool {
        let mut slots = self.shared.lock();
        match slots.get(fingerprint) {
            Some(slot) if slot.entry.status.is_resolved() => {
                slots.remove(fingerprint);
                true
            }
            _ => false,
        }
    }

    /// Removes every resolved entry past its TTL, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let policy = self.shared.policy;
        let mut slots = self.shared.lock();
        let before = slots.len();
        slots.retain(|_, slot| !slot.entry.is_expired(&policy));
        before - slots.len()
    }

    pub fn len(&self) -> usize {
        self.shared.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.lock().is_empty()
    }
}

/// Handle for waiting on another caller's in-flight fetch
pub struct Waiter {
    url: String,
    outcome: watch::Receiver<Option<Resolution>>,
}

impl Waiter {
    /// Waits up to `timeout` for the fetch to resolve
    ///
    /// Timing out only abandons this wait; the fetch keeps running and still
    /// populates the cache.
    pub async fn wait(mut self, timeout: Duration) -> Result<Resolution, RelayError> {
        let started = Instant::now();
        match tokio::time::timeout(timeout, self.outcome.wait_for(Option::is_some)).await {
            Ok(Ok(resolved)) => Ok(resolved
                .clone()
                .unwrap_or_else(|| Resolution::Failed(abandoned()))),
            // Sender gone without a value: the ticket's Drop always sends first
            Ok(Err(_)) => Ok(Resolution::Failed(abandoned())),
            Err(_) => Err(RelayError::Timeout {
                url: self.url,
                waited_ms: started.elapsed().as_millis() as u64,
            }),
        }
    }
}

fn abandoned() -> FetchFailure {
    FetchFailure::Fatal("fetch abandoned before completion".to_string())
}

/// Exclusive right to perform the fetch for one fingerprint
///
/// [`FetchTicket::commit`] consumes the ticket, so an entry is resolved exactly
/// once. A ticket dropped without committing resolves its entry as a fatal
/// failure so waiters are never stranded.
pub struct FetchTicket {
    fingerprint: RequestFingerprint,
    url: String,
    store: Arc<StoreShared>,
    outcome: watch::Sender<Option<Resolution>>,
    committed: bool,
}

impl FetchTicket {
    pub fn fingerprint(&self) -> &RequestFingerprint {
        &self.fingerprint
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// A waiter on this ticket's own outcome, for the caller that started the fetch
    pub fn waiter(&self) -> Waiter {
        Waiter {
            url: self.url.clone(),
            outcome: self.outcome.subscribe(),
        }
    }

    /// Resolves the pending entry and releases every waiter with `resolution`
    ///
    /// `Ready` and `Failed` stay cached; `Rejected` removes the entry.
    pub fn commit(mut self, resolution: Resolution) {
        self.resolve(resolution);
    }

    fn resolve(&mut self, resolution: Resolution) {
        self.committed = true;
        {
            let mut slots = self.store.lock();
            if resolution.is_cacheable() {
                if let Some(slot) = slots.get_mut(&self.fingerprint) {
                    debug_assert_eq!(slot.entry.status, EntryStatus::Pending);
                    slot.entry.complete(&resolution);
                    slot.outcome = None;
                }
            } else {
                slots.remove(&self.fingerprint);
            }
            // Sent under the lock so no new waiter can subscribe to a resolved entry
            self.outcome.send_replace(Some(resolution));
        }
        tracing::trace!("Committed {}", self.fingerprint.short());
    }
}

impl Drop for FetchTicket {
    fn drop(&mut self) {
        if !self.committed {
            tracing::warn!(
                "Fetch for {} abandoned without commit",
                self.fingerprint.short()
            );
            self.resolve(Resolution::Failed(abandoned()));
        }
    }
}
