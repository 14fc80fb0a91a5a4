//! Multi-source sync cycles.
//!
//! A cycle fetches all five sources concurrently, degrades each failed source
//! to an empty contribution, aggregates the results into an
//! [`AggregateSnapshot`] and publishes it to observers. Starting a new cycle
//! cancels the previous one; a cancelled cycle never writes anything.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::poller::NotificationPoller;
use super::reload::{ReloadHook, ReloadOnce};
use super::state::{CycleOutcome, DashboardState, SyncPhase};
use crate::api::{ApiError, DashboardApi};
use crate::cache::SnapshotCache;
use crate::config::Config;
use crate::models::notification::same_identity_and_read;
use crate::models::{AggregateSnapshot, NotificationView, RawRecord, Source};
use crate::normalize::{classify, normalize, notification};

/// Timing and batching knobs for the orchestrator.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub chunk_size: usize,
    pub reload_delay: Duration,
    pub poll_interval: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Config::default().sync_options()
    }
}

/// How a notification poll ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A poll was already in flight.
    Skipped,
    /// Same ids and read flags as the shown list; nothing published.
    Unchanged,
    Updated,
    /// The fetch failed; the shown list is kept.
    Failed,
    /// A newer cycle started (or shutdown) while the poll was in flight.
    Aborted,
}

#[derive(Debug)]
enum FetchFailure {
    Aborted,
    Degraded(ApiError),
}

struct CycleControl {
    generation: u64,
    cancel: watch::Sender<bool>,
}

/// Clears the in-flight flag when the poll finishes, however it finishes.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SyncOrchestrator {
    api: Arc<dyn DashboardApi>,
    cache: SnapshotCache,
    reload: ReloadOnce,
    reload_hook: Arc<dyn ReloadHook>,
    options: SyncOptions,
    state_tx: watch::Sender<Arc<DashboardState>>,
    control: Mutex<CycleControl>,
    poll_in_flight: AtomicBool,
}

impl SyncOrchestrator {
    pub fn new(
        api: Arc<dyn DashboardApi>,
        cache: SnapshotCache,
        reload_hook: Arc<dyn ReloadHook>,
        options: SyncOptions,
    ) -> Self {
        let (state_tx, _) = watch::channel(Arc::new(DashboardState::default()));
        let (cancel, _) = watch::channel(false);
        Self {
            api,
            reload: ReloadOnce::new(cache.store()),
            cache,
            reload_hook,
            options,
            state_tx,
            control: Mutex::new(CycleControl {
                generation: 0,
                cancel,
            }),
            poll_in_flight: AtomicBool::new(false),
        }
    }

    /// Current state projection.
    pub fn state(&self) -> Arc<DashboardState> {
        Arc::clone(&self.state_tx.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardState>> {
        self.state_tx.subscribe()
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Hydrate, run the initial cycle, then start polling notifications.
    pub async fn start(self: &Arc<Self>) -> (CycleOutcome, NotificationPoller) {
        self.hydrate_from_cache();
        let outcome = self.run_cycle().await;
        let poller = NotificationPoller::spawn(Arc::clone(self), self.options.poll_interval);
        (outcome, poller)
    }

    /// Publish the session snapshot, if any, so there is something to show
    /// while the first live cycle runs. Returns whether a snapshot was found.
    pub fn hydrate_from_cache(&self) -> bool {
        let Some(cached) = self.cache.read_cached() else {
            debug!("No cached snapshot for this session");
            return false;
        };

        let _control = self.lock_control();
        let current = self.state();
        if current.synced_at.is_some() {
            // Live data already arrived; the cache can only be older.
            return false;
        }
        info!(age = %cached.age_display(), "Showing cached dashboard snapshot");
        self.state_tx.send_replace(Arc::new(DashboardState {
            phase: SyncPhase::CacheHydrated,
            snapshot: Arc::new(cached.data),
            degraded: Vec::new(),
            error: None,
            cached_at: Some(cached.cached_at),
            synced_at: None,
        }));
        true
    }

    /// Fetch every source and publish the aggregate.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let (generation, cancel) = self.begin_cycle();
        info!(generation, "Sync cycle started");

        let (events, staff, persons, notifications, results) = tokio::join!(
            self.fetch_records(Source::Events, cancel.clone()),
            self.fetch_records(Source::Staff, cancel.clone()),
            self.fetch_records(Source::Persons, cancel.clone()),
            self.fetch_records(Source::Notifications, cancel.clone()),
            self.fetch_records(Source::Results, cancel.clone()),
        );

        let mut degraded = Vec::new();
        let mut failures = Vec::new();
        let mut take = |source: Source, fetched: Result<Vec<RawRecord>, FetchFailure>| match fetched {
            Ok(records) => Some(records),
            Err(FetchFailure::Aborted) => None,
            Err(FetchFailure::Degraded(e)) => {
                degraded.push(source);
                failures.push(format!("{}: {}", source, e));
                Some(Vec::new())
            }
        };

        let (Some(events), Some(staff), Some(persons), Some(notifications), Some(results)) = (
            take(Source::Events, events),
            take(Source::Staff, staff),
            take(Source::Persons, persons),
            take(Source::Notifications, notifications),
            take(Source::Results, results),
        ) else {
            debug!(generation, "Sync cycle aborted");
            return CycleOutcome::Aborted;
        };

        if degraded.len() == Source::ALL.len() {
            let message = format!("Could not load dashboard data ({})", failures.join("; "));
            return if self.apply_failure(generation, message) {
                warn!(generation, "Every source failed, keeping previous snapshot");
                CycleOutcome::Failed
            } else {
                debug!(generation, "Sync cycle superseded before reporting failure");
                CycleOutcome::Aborted
            };
        }

        let views = notification::format(&notifications, self.options.chunk_size).await;
        let snapshot = aggregate(events, &staff, &persons, views, results);

        if !self.apply_snapshot(generation, snapshot, degraded.clone()) {
            debug!(generation, "Sync cycle superseded, discarding results");
            return CycleOutcome::Aborted;
        }

        if degraded.is_empty() {
            info!(generation, "Sync cycle finished");
            CycleOutcome::Succeeded
        } else {
            info!(generation, degraded = degraded.len(), "Sync cycle finished with degraded sources");
            CycleOutcome::PartiallyFailed { degraded }
        }
    }

    /// Fetch only notifications and publish them if they changed.
    pub async fn poll_notifications(&self) -> PollOutcome {
        let Some(_in_flight) = InFlightGuard::acquire(&self.poll_in_flight) else {
            debug!("Notification poll already in flight, skipping");
            return PollOutcome::Skipped;
        };

        let (generation, cancel) = {
            let control = self.lock_control();
            (control.generation, control.cancel.subscribe())
        };

        let records = match self.fetch_records(Source::Notifications, cancel).await {
            Ok(records) => records,
            Err(FetchFailure::Aborted) => return PollOutcome::Aborted,
            Err(FetchFailure::Degraded(_)) => return PollOutcome::Failed,
        };
        let views = notification::format(&records, self.options.chunk_size).await;

        let count = {
            let control = self.lock_control();
            if control.generation != generation {
                debug!("Notification poll superseded by a newer cycle");
                return PollOutcome::Aborted;
            }
            let current = self.state();
            if same_identity_and_read(&current.snapshot.notifications, &views) {
                return PollOutcome::Unchanged;
            }
            let mut snapshot = (*current.snapshot).clone();
            snapshot.notifications = views;
            let count = snapshot.notifications.len();
            self.cache.write(&snapshot);
            self.state_tx.send_replace(Arc::new(with_notifications_restored(&current, snapshot)));
            count
        };

        debug!(count, "Notifications changed");
        self.observe_notification_count(count);
        PollOutcome::Updated
    }

    /// Mark a notification read locally and tell the backend in the
    /// background. A failed backend call is not rolled back; the next poll
    /// shows the server's view. Must be called from within a tokio runtime.
    ///
    /// Returns false when no unread notification has this id.
    pub fn mark_read(&self, id: &str) -> bool {
        {
            let _control = self.lock_control();
            let current = self.state();
            let Some(index) = current
                .snapshot
                .notifications
                .iter()
                .position(|n| n.id == id && !n.read)
            else {
                return false;
            };
            let mut snapshot = (*current.snapshot).clone();
            snapshot.notifications[index].read = true;
            self.publish_snapshot(&current, snapshot);
        }

        let api = Arc::clone(&self.api);
        let id = id.to_string();
        tokio::spawn(async move {
            if let Err(e) = api.mark_notification_read(&id).await {
                debug!(id = %id, error = %e, "Mark-read call failed, keeping local state");
            }
        });
        true
    }

    /// Cancel whatever cycle or poll is in flight. Nothing it fetched is
    /// applied afterwards.
    pub fn shutdown(&self) {
        let mut control = self.lock_control();
        control.generation += 1;
        control.cancel.send_replace(true);
        debug!("Sync orchestrator shut down");
    }

    fn lock_control(&self) -> MutexGuard<'_, CycleControl> {
        self.control.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin_cycle(&self) -> (u64, watch::Receiver<bool>) {
        let mut control = self.lock_control();
        control.generation += 1;
        let (cancel, cancel_rx) = watch::channel(false);
        let previous = std::mem::replace(&mut control.cancel, cancel);
        previous.send_replace(true);

        let current = self.state();
        let mut next = (*current).clone();
        next.phase = SyncPhase::Fetching;
        self.state_tx.send_replace(Arc::new(next));

        (control.generation, cancel_rx)
    }

    async fn fetch_records(
        &self,
        source: Source,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<Vec<RawRecord>, FetchFailure> {
        tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => Err(FetchFailure::Aborted),
            fetched = self.api.fetch_source(source) => match fetched {
                Ok(envelope) => {
                    let records = normalize(&envelope, source.collection_keys());
                    debug!(source = %source, count = records.len(), "Source fetched");
                    Ok(records)
                }
                Err(e) => {
                    warn!(source = %source, error = %e, "Source fetch failed, using empty data");
                    Err(FetchFailure::Degraded(e))
                }
            },
        }
    }

    fn apply_snapshot(&self, generation: u64, snapshot: AggregateSnapshot, degraded: Vec<Source>) -> bool {
        let count = snapshot.notifications.len();
        {
            let control = self.lock_control();
            if control.generation != generation {
                return false;
            }
            self.cache.write(&snapshot);
            let phase = if degraded.is_empty() {
                SyncPhase::Succeeded
            } else {
                SyncPhase::PartiallyFailed
            };
            self.state_tx.send_replace(Arc::new(DashboardState {
                phase,
                snapshot: Arc::new(snapshot),
                degraded,
                error: None,
                cached_at: None,
                synced_at: Some(Utc::now()),
            }));
        }
        self.observe_notification_count(count);
        true
    }

    fn apply_failure(&self, generation: u64, message: String) -> bool {
        let control = self.lock_control();
        if control.generation != generation {
            return false;
        }
        let current = self.state();
        let mut next = (*current).clone();
        // The shown snapshot stays valid; only the phase and error report
        // the failure.
        next.phase = SyncPhase::Failed;
        next.error = Some(message);
        self.state_tx.send_replace(Arc::new(next));
        true
    }

    /// Replace the snapshot keeping phase and origin. Caller holds the
    /// control lock.
    fn publish_snapshot(&self, current: &DashboardState, snapshot: AggregateSnapshot) {
        self.cache.write(&snapshot);
        let mut next = current.clone();
        next.snapshot = Arc::new(snapshot);
        self.state_tx.send_replace(Arc::new(next));
    }

    fn observe_notification_count(&self, count: usize) {
        if !self.reload.observe(count) {
            return;
        }
        let hook = Arc::clone(&self.reload_hook);
        let delay = self.options.reload_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            info!("Reloading after first notifications");
            hook.reload();
        });
    }
}

/// State after a successful notification poll. Notifications are live again
/// so they are no longer degraded; a partial cycle's phase is recomputed
/// from what is still degraded. A failed cycle stays `Failed` because the
/// other sources were not refreshed.
fn with_notifications_restored(current: &DashboardState, snapshot: AggregateSnapshot) -> DashboardState {
    let mut next = current.clone();
    next.snapshot = Arc::new(snapshot);
    next.degraded.retain(|source| *source != Source::Notifications);
    if matches!(next.phase, SyncPhase::Succeeded | SyncPhase::PartiallyFailed) {
        next.phase = if next.degraded.is_empty() {
            SyncPhase::Succeeded
        } else {
            SyncPhase::PartiallyFailed
        };
    }
    next
}

/// Resolves once the cycle is cancelled or its signal is dropped.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            return;
        }
    }
}

fn aggregate(
    events: Vec<RawRecord>,
    staff: &[RawRecord],
    persons: &[RawRecord],
    notifications: Vec<NotificationView>,
    results: Vec<RawRecord>,
) -> AggregateSnapshot {
    let classification = classify(persons);
    AggregateSnapshot {
        events,
        teacher_count: staff.len(),
        person_count: persons.len(),
        group_tally: classification.tally,
        issues: classification.issues,
        notifications,
        result_count: results.len(),
        results,
    }
}
