use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::session_store::SessionStore;
use crate::models::AggregateSnapshot;

/// Session key holding the last known-good dashboard snapshot.
pub const SNAPSHOT_KEY: &str = "dashboard_snapshot";

/// Consider a snapshot stale after 1 hour.
const CACHE_STALE_MINUTES: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    #[serde(default = "Utc::now")]
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            let remaining_mins = minutes % 60;
            if remaining_mins >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            let remaining_hours = (minutes % 1440) / 60;
            if remaining_hours >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

/// Session-scoped snapshot of the last good dashboard state.
///
/// Reads never fail (anything unreadable is "no snapshot") and writes are
/// best effort (storage or serialization failures are logged and dropped).
#[derive(Clone)]
pub struct SnapshotCache {
    store: Arc<dyn SessionStore>,
}

impl SnapshotCache {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// The underlying session store, shared with other session-scoped state.
    pub fn store(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.store)
    }

    pub fn read(&self) -> Option<AggregateSnapshot> {
        self.read_cached().map(|cached| cached.data)
    }

    /// Snapshot together with the time it was written.
    pub fn read_cached(&self) -> Option<CachedData<AggregateSnapshot>> {
        self.load(SNAPSHOT_KEY)
    }

    pub fn write(&self, snapshot: &AggregateSnapshot) {
        self.save(SNAPSHOT_KEY, snapshot);
    }

    pub fn clear(&self) {
        self.store.remove(SNAPSHOT_KEY);
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Option<CachedData<T>> {
        let contents = self.store.get(name)?;
        match serde_json::from_str::<CachedData<T>>(&contents) {
            Ok(cached) => Some(cached),
            Err(e) => {
                debug!(cache = name, error = %e, "Ignoring unreadable cache entry");
                None
            }
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) {
        let cached = CachedData::new(data);
        let contents = match serde_json::to_string(&cached) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to serialize cache entry");
                return;
            }
        };
        if let Err(e) = self.store.set(name, &contents) {
            debug!(cache = name, error = %e, "Failed to write cache entry");
        }
    }
}
