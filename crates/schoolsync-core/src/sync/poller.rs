use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::orchestrator::{PollOutcome, SyncOrchestrator};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Background task re-polling notifications on a fixed interval.
///
/// Ticks that fall due while a poll is running are skipped, not queued.
/// Dropping the handle without calling [`stop`](Self::stop) also ends the
/// task at its next scheduling point.
pub struct NotificationPoller {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl NotificationPoller {
    /// A zero `every` is raised to one millisecond.
    pub fn spawn(orchestrator: Arc<SyncOrchestrator>, every: Duration) -> Self {
        let every = every.max(MIN_INTERVAL);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; the initial cycle has
            // just loaded notifications.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        tokio::select! {
                            _ = &mut stop_rx => break,
                            outcome = orchestrator.poll_notifications() => {
                                if outcome == PollOutcome::Failed {
                                    warn!("Notification poll failed, keeping current list");
                                } else {
                                    debug!(?outcome, "Notification poll finished");
                                }
                            }
                        }
                    }
                }
            }
            debug!("Notification poller stopped");
        });

        Self {
            stop_tx: Some(stop_tx),
            task,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop polling and wait for the task to wind down. An in-flight poll is
    /// dropped.
    pub async fn stop(mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!(error = %e, "Notification poller task join failed");
        }
    }
}
