//! Cache store module
//!
//! Maps a request fingerprint to a cached artifact, a cached failure, or an
//! in-flight fetch. The store is the single arbiter of "at most one fetch per
//! fingerprint": the first caller gets a [`FetchTicket`], everyone else either
//! hits the cache or waits on the ticket's outcome.

mod entry;
mod store;

pub use entry::{CacheEntry, CachePolicy, EntryStatus, FetchFailure, Rejection, Resolution};
pub use store::{Begin, CacheStore, FetchTicket, Waiter};
