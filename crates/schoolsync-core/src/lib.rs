//! schoolsync core library.
//!
//! Keeps a school administration dashboard in sync with its backend: five
//! loosely-shaped collections are fetched in parallel, normalized into strict
//! types, aggregated into one snapshot and cached for the session so a
//! restart can paint immediately while the next sync runs.

pub mod api;
pub mod cache;
pub mod chunked;
pub mod config;
pub mod models;
pub mod normalize;
pub mod sync;
pub mod utils;

pub use api::{ApiClient, ApiError, DashboardApi};
pub use cache::{FileSessionStore, MemorySessionStore, SessionStore, SnapshotCache};
pub use config::Config;
pub use models::{AggregateSnapshot, NotificationView, Source};
pub use sync::{CycleOutcome, DashboardState, NotificationPoller, PollOutcome, SyncOrchestrator, SyncPhase};
