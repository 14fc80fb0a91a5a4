//! Session-scoped caching for instant warm starts.
//!
//! This module provides the `SnapshotCache` the orchestrator writes after
//! every successful sync and reads once at start-up, on top of a
//! `SessionStore`. Values are JSON and live only as long as the session.

pub mod manager;
pub mod session_store;

pub use manager::{CachedData, SnapshotCache, SNAPSHOT_KEY};
pub use session_store::{FileSessionStore, MemorySessionStore, SessionStore};
