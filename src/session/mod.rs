//! Session management module
//!
//! Creating a fetch-capable session is expensive (process or browser startup),
//! so sessions are created lazily, capped at a fixed pool size, and recycled
//! across requests.
//!
//! # Components
//!
//! - `SessionFactory`: launches, resets and closes the underlying handles
//! - `SessionPool`: bounded acquire/release lifecycle over those handles
//! - `Session` / `SessionState`: the pooled wrapper and its lifecycle state

mod pool;
mod state;

pub use pool::{PoolStats, PooledSession, SessionPool};
pub use state::{Session, SessionState};

use async_trait::async_trait;

/// Creates and tears down the handles the pool hands out
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    /// The live context a fetch runs against
    type Handle: Send + 'static;

    /// Starts a new handle
    async fn launch(&self) -> crate::Result<Self::Handle>;

    /// Clears per-fetch state before the handle is parked again
    ///
    /// An error here means the handle is no longer trustworthy and it is closed
    /// instead of being reused.
    async fn reset(&self, _handle: &mut Self::Handle) -> crate::Result<()> {
        Ok(())
    }

    /// Releases the handle's resources
    async fn close(&self, _handle: Self::Handle) {}
}
