//! Session lifecycle definitions
//!
//! A session is a reusable handle to an expensive fetch-capable context
//! (a browser instance, an HTTP client with its connection pool).

use chrono::{DateTime, Utc};
use std::fmt;

/// Represents where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Parked in the pool, ready to be handed out
    Idle,

    /// Held by exactly one fetch
    InUse,

    /// Shut down; never handed out again
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InUse => "in_use",
            Self::Closed => "closed",
        }
    }

    /// Returns true if the session still holds live resources
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pooled session wrapping the factory's handle
#[derive(Debug)]
pub struct Session<H> {
    pub(crate) id: u64,
    pub(crate) state: SessionState,
    pub(crate) last_used_at: DateTime<Utc>,
    pub(crate) unrecoverable: bool,
    pub(crate) handle: H,
}

impl<H> Session<H> {
    pub(crate) fn new(id: u64, handle: H) -> Self {
        Self {
            id,
            state: SessionState::Idle,
            last_used_at: Utc::now(),
            unrecoverable: false,
            handle,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_used_at(&self) -> DateTime<Utc> {
        self.last_used_at
    }

    /// Moves the session into `next`, stamping the use time
    pub(crate) fn transition(&mut self, next: SessionState) {
        tracing::trace!("session {}: {} -> {}", self.id, self.state, next);
        self.state = next;
        self.last_used_at = Utc::now();
    }
}
