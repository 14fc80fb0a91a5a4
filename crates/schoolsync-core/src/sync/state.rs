use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::{AggregateSnapshot, Source};

/// Where the dashboard is in its sync lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    /// Showing the session snapshot while the live fetch runs.
    CacheHydrated,
    Fetching,
    Succeeded,
    /// Some sources failed and contributed empty data.
    PartiallyFailed,
    /// Every source failed; the previous snapshot is still shown.
    Failed,
}

/// How a single sync cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Succeeded,
    PartiallyFailed { degraded: Vec<Source> },
    Failed,
    /// Superseded by a newer cycle or shut down; nothing was written.
    Aborted,
}

/// Read-only projection of the orchestrator's state handed to observers.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub phase: SyncPhase,
    pub snapshot: Arc<AggregateSnapshot>,
    pub degraded: Vec<Source>,
    /// Single aggregate failure message, set only when every source failed.
    pub error: Option<String>,
    /// When the shown snapshot was cached, if it came from the session cache.
    pub cached_at: Option<DateTime<Utc>>,
    pub synced_at: Option<DateTime<Utc>>,
}

impl DashboardState {
    /// True once there is something to paint, cached or live.
    pub fn is_ready(&self) -> bool {
        self.cached_at.is_some() || self.synced_at.is_some()
    }

    /// True while the shown snapshot is the one restored from the session.
    pub fn from_cache(&self) -> bool {
        self.cached_at.is_some() && self.synced_at.is_none()
    }

    pub fn is_degraded(&self, source: Source) -> bool {
        self.degraded.contains(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_and_origin() {
        let mut state = DashboardState::default();
        assert!(!state.is_ready());
        assert!(!state.from_cache());

        state.cached_at = Some(Utc::now());
        assert!(state.is_ready());
        assert!(state.from_cache());

        state.synced_at = Some(Utc::now());
        assert!(!state.from_cache());
    }
}
