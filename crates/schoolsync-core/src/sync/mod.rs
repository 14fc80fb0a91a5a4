//! Sync orchestration: cycles, notification polling and the reload-once
//! policy.

pub mod orchestrator;
pub mod poller;
pub mod reload;
pub mod state;

pub use orchestrator::{PollOutcome, SyncOptions, SyncOrchestrator};
pub use poller::NotificationPoller;
pub use reload::{NoReload, ReloadHook, ReloadOnce, RELOAD_MARKER_KEY};
pub use state::{CycleOutcome, DashboardState, SyncPhase};
