//! One-time page reload on the session's first notifications.

use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::cache::SessionStore;

/// Session key marking that the reload already happened.
pub const RELOAD_MARKER_KEY: &str = "notifications_reload_done";

/// Performs the actual reload of the host view.
pub trait ReloadHook: Send + Sync {
    fn reload(&self);
}

/// Hook for hosts that never reload.
pub struct NoReload;

impl ReloadHook for NoReload {
    fn reload(&self) {}
}

/// Fires once per session when the notification count first goes from zero
/// to non-zero.
///
/// The in-memory count resets with every new instance; the session marker
/// does not, so a remount within the same session never fires again.
pub struct ReloadOnce {
    store: Arc<dyn SessionStore>,
    previous_count: Mutex<usize>,
}

impl ReloadOnce {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            previous_count: Mutex::new(0),
        }
    }

    /// Record the latest live notification count. Returns true exactly when
    /// the reload should be scheduled.
    pub fn observe(&self, count: usize) -> bool {
        let previous = {
            let mut guard = self.previous_count.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *guard, count)
        };

        if previous != 0 || count == 0 || self.already_done() {
            return false;
        }

        // Without the marker the reload would fire again after it happened.
        if let Err(e) = self.store.set(RELOAD_MARKER_KEY, "true") {
            warn!(error = %e, "Could not record reload marker, skipping reload");
            return false;
        }
        info!(count, "First notifications of the session, scheduling reload");
        true
    }

    pub fn already_done(&self) -> bool {
        self.store.get(RELOAD_MARKER_KEY).is_some()
    }
}
