//! Bounded session pool
//!
//! A counting semaphore caps the number of sessions that exist at once. A
//! permit is held for as long as a session is checked out, and a session is
//! only launched while holding a permit, so `idle + in_use <= size` always.

use crate::session::state::{Session, SessionState};
use crate::session::SessionFactory;
use crate::RelayError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Point-in-time pool counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Configured maximum number of sessions
    pub size: usize,
    /// Sessions currently holding resources (idle + in use)
    pub open: usize,
    pub idle: usize,
    pub in_use: usize,
    /// Sessions closed over the pool's lifetime
    pub closed_total: u64,
    /// Whether `shutdown` has been called
    pub closed: bool,
}

struct PoolInner<H> {
    idle: Vec<Session<H>>,
    in_use: usize,
    next_id: u64,
    closed_total: u64,
    closed: bool,
}

struct PoolShared<F: SessionFactory> {
    factory: F,
    size: usize,
    permits: Arc<Semaphore>,
    inner: Mutex<PoolInner<F::Handle>>,
}

impl<F: SessionFactory> PoolShared<F> {
    fn lock(&self) -> MutexGuard<'_, PoolInner<F::Handle>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fixed-size pool of reusable sessions
pub struct SessionPool<F: SessionFactory> {
    shared: Arc<PoolShared<F>>,
}

impl<F: SessionFactory> Clone for SessionPool<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// A session checked out of the pool
///
/// Hand it back with [`SessionPool::release`]. Dropping it instead discards
/// the session, since it may have been abandoned mid-operation.
pub struct PooledSession<F: SessionFactory> {
    session: Option<Session<F::Handle>>,
    shared: Arc<PoolShared<F>>,
    _permit: OwnedSemaphorePermit,
}

impl<F: SessionFactory> SessionPool<F> {
    /// Creates an empty pool; sessions are launched on first demand
    pub fn new(factory: F, size: usize) -> Self {
        let size = size.max(1);
        Self {
            shared: Arc::new(PoolShared {
                factory,
                size,
                permits: Arc::new(Semaphore::new(size)),
                inner: Mutex::new(PoolInner {
                    idle: Vec::with_capacity(size),
                    in_use: 0,
                    next_id: 1,
                    closed_total: 0,
                    closed: false,
                }),
            }),
        }
    }

    pub fn factory(&self) -> &F {
        &self.shared.factory
    }

    /// Checks out a session, waiting up to `timeout` for one to free up
    ///
    /// # Returns
    ///
    /// * `Ok(PooledSession)` - A session in the `InUse` state
    /// * `Err(RelayError::PoolExhausted)` - Nothing freed up within `timeout`
    /// * `Err(RelayError::PoolClosed)` - The pool was shut down
    /// * `Err(_)` - Launching a replacement session failed
    pub async fn acquire(&self, timeout: Duration) -> crate::Result<PooledSession<F>> {
        if self.shared.lock().closed {
            return Err(RelayError::PoolClosed);
        }

        let started = Instant::now();
        let permit =
            match tokio::time::timeout(timeout, Arc::clone(&self.shared.permits).acquire_owned())
                .await
            {
                Ok(Ok(permit)) => permit,
                Ok(Err(_)) => return Err(RelayError::PoolClosed),
                Err(_) => {
                    let waited_ms = started.elapsed().as_millis() as u64;
                    tracing::debug!("No session freed up within {}ms", waited_ms);
                    return Err(RelayError::PoolExhausted { waited_ms });
                }
            };

        let reused = {
            let mut inner = self.shared.lock();
            if inner.closed {
                return Err(RelayError::PoolClosed);
            }
            inner.idle.pop()
        };

        let mut session = match reused {
            Some(session) => {
                tracing::debug!("Reusing session {}", session.id);
                session
            }
            None => {
                let handle = self.shared.factory.launch().await?;
                let id = {
                    let mut inner = self.shared.lock();
                    let id = inner.next_id;
                    inner.next_id += 1;
                    id
                };
                tracing::debug!("Launched session {}", id);
                Session::new(id, handle)
            }
        };

        session.transition(SessionState::InUse);
        self.shared.lock().in_use += 1;

        Ok(PooledSession {
            session: Some(session),
            shared: Arc::clone(&self.shared),
            _permit: permit,
        })
    }

    /// Returns a session to the pool
    ///
    /// Healthy sessions are reset and parked as `Idle`. Sessions marked
    /// unrecoverable, sessions whose reset fails, and sessions released after
    /// shutdown are closed; a replacement is launched by a later `acquire`.
    pub async fn release(&self, mut pooled: PooledSession<F>) {
        let Some(mut session) = pooled.session.take() else {
            return;
        };

        let mut discard = session.unrecoverable;
        if !discard {
            if let Err(e) = self.shared.factory.reset(&mut session.handle).await {
                tracing::warn!("Session {} failed to reset, closing it: {}", session.id, e);
                discard = true;
            }
        }

        if !discard {
            let mut inner = self.shared.lock();
            if !inner.closed {
                inner.in_use -= 1;
                session.transition(SessionState::Idle);
                inner.idle.push(session);
                // `pooled` (and its permit) drops after the session is parked
                return;
            }
        }

        let id = session.id;
        session.transition(SessionState::Closed);
        self.shared.factory.close(session.handle).await;
        {
            let mut inner = self.shared.lock();
            inner.in_use -= 1;
            inner.closed_total += 1;
        }
        tracing::debug!("Closed session {}", id);
    }

    /// Closes every idle session and refuses further acquires
    ///
    /// Sessions still checked out are closed when they are released.
    pub async fn shutdown(&self) {
        let idle = {
            let mut inner = self.shared.lock();
            if inner.closed {
                return;
            }
            inner.closed = true;
            std::mem::take(&mut inner.idle)
        };
        self.shared.permits.close();

        let count = idle.len();
        for mut session in idle {
            session.transition(SessionState::Closed);
            self.shared.factory.close(session.handle).await;
        }
        self.shared.lock().closed_total += count as u64;
        tracing::info!("Session pool shut down, closed {} idle sessions", count);
    }

    pub fn stats(&self) -> PoolStats {
        let inner = self.shared.lock();
        PoolStats {
            size: self.shared.size,
            open: inner.idle.len() + inner.in_use,
            idle: inner.idle.len(),
            in_use: inner.in_use,
            closed_total: inner.closed_total,
            closed: inner.closed,
        }
    }
}

impl<F: SessionFactory> PooledSession<F> {
    pub fn id(&self) -> u64 {
        self.session.as_ref().map(|s| s.id).unwrap_or_default()
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(SessionState::Closed)
    }

    /// The underlying handle
    ///
    /// # Panics
    ///
    /// Never in practice: the session is only taken out by `release` or `Drop`,
    /// both of which consume the guard.
    pub fn handle_mut(&mut self) -> &mut F::Handle {
        &mut self
            .session
            .as_mut()
            .expect("pooled session accessed after release")
            .handle
    }

    /// Flags the session as corrupted so `release` closes it instead of reusing it
    pub fn mark_unrecoverable(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.unrecoverable = true;
        }
    }

    pub fn is_unrecoverable(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.unrecoverable)
    }
}

impl<F: SessionFactory> Drop for PooledSession<F> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::warn!("Session {} dropped without release, discarding it", session.id);
            let mut inner = self.shared.lock();
            inner.in_use -= 1;
            inner.closed_total += 1;
        }
    }
}
