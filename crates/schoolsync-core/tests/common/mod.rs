#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use schoolsync_core::cache::{MemorySessionStore, SessionStore, SnapshotCache};
use schoolsync_core::sync::{ReloadHook, SyncOptions, SyncOrchestrator};
use schoolsync_core::{ApiError, DashboardApi, Source};
use serde_json::{json, Value};

#[derive(Clone)]
pub struct Reply {
    body: Result<Value, String>,
    delay: Duration,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self {
            body: Ok(body),
            delay: Duration::ZERO,
        }
    }

    pub fn err(message: &str) -> Self {
        Self {
            body: Err(message.to_string()),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Backend fake. Queued replies are used once, in order, before the
/// standing reply for a source; sources with neither answer `[]`.
#[derive(Default)]
pub struct ScriptedApi {
    queued: Mutex<HashMap<Source, VecDeque<Reply>>>,
    standing: Mutex<HashMap<Source, Reply>>,
    started: Mutex<HashMap<Source, usize>>,
    completed: AtomicUsize,
    marked: Mutex<Vec<String>>,
    fail_mark_read: AtomicBool,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, source: Source, reply: Reply) {
        self.standing.lock().unwrap().insert(source, reply);
    }

    pub fn push(&self, source: Source, reply: Reply) {
        self.queued
            .lock()
            .unwrap()
            .entry(source)
            .or_default()
            .push_back(reply);
    }

    pub fn started(&self, source: Source) -> usize {
        self.started.lock().unwrap().get(&source).copied().unwrap_or(0)
    }

    pub fn total_started(&self) -> usize {
        self.started.lock().unwrap().values().sum()
    }

    /// Fetches that ran to completion (were not dropped mid-flight).
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn marked(&self) -> Vec<String> {
        self.marked.lock().unwrap().clone()
    }

    pub fn fail_mark_read(&self) {
        self.fail_mark_read.store(true, Ordering::SeqCst);
    }

    /// Yield until `count` fetches have been issued.
    pub async fn wait_for_started(&self, count: usize) {
        for _ in 0..1000 {
            if self.total_started() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("only {} of {} fetches started", self.total_started(), count);
    }

    fn next_reply(&self, source: Source) -> Reply {
        if let Some(reply) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&source)
            .and_then(|q| q.pop_front())
        {
            return reply;
        }
        self.standing
            .lock()
            .unwrap()
            .get(&source)
            .cloned()
            .unwrap_or_else(|| Reply::ok(json!([])))
    }
}

#[async_trait]
impl DashboardApi for ScriptedApi {
    async fn fetch_source(&self, source: Source) -> Result<Value, ApiError> {
        let reply = self.next_reply(source);
        *self.started.lock().unwrap().entry(source).or_default() += 1;
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        reply.body.map_err(ApiError::ServerError)
    }

    async fn mark_notification_read(&self, id: &str) -> Result<(), ApiError> {
        self.marked.lock().unwrap().push(id.to_string());
        if self.fail_mark_read.load(Ordering::SeqCst) {
            return Err(ApiError::ServerError("mark-read unavailable".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingReload {
    count: AtomicUsize,
}

impl CountingReload {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ReloadHook for CountingReload {
    fn reload(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn options() -> SyncOptions {
    SyncOptions {
        chunk_size: 2,
        reload_delay: Duration::from_millis(1500),
        poll_interval: Duration::from_secs(30),
    }
}

pub fn memory_store() -> Arc<dyn SessionStore> {
    Arc::new(MemorySessionStore::new())
}

pub fn orchestrator(
    api: &Arc<ScriptedApi>,
    store: &Arc<dyn SessionStore>,
    hook: &Arc<CountingReload>,
) -> Arc<SyncOrchestrator> {
    Arc::new(SyncOrchestrator::new(
        Arc::clone(api) as Arc<dyn DashboardApi>,
        SnapshotCache::new(Arc::clone(store)),
        Arc::clone(hook) as Arc<dyn ReloadHook>,
        options(),
    ))
}

/// A well-formed backend: every source wrapped in a different envelope.
pub fn healthy_backend(api: &ScriptedApi) {
    api.set(Source::Events, Reply::ok(json!({"data": [{"title": "Sports day", "date": "2024-05-01"}]})));
    api.set(Source::Staff, Reply::ok(json!({"teachers": [{"name": "T1"}, {"name": "T2"}]})));
    api.set(
        Source::Persons,
        Reply::ok(json!({"payload": {"students": [
            {"studentId": "S1", "name": "Asha", "email": "a@example.com", "className": "7A"},
            {"studentId": "S2", "email": "b@example.com", "className": "7B"}
        ]}})),
    );
    api.set(Source::Notifications, Reply::ok(notifications(&[("n1", false), ("n2", true)])));
    api.set(Source::Results, Reply::ok(json!([{"score": 91}, {"score": 78}, {"score": 66}])));
}

/// Notification records with descending timestamps, in the given order.
pub fn notifications(items: &[(&str, bool)]) -> Value {
    let base = 1_714_000_000_000_i64;
    let records: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(i, (id, read))| {
            json!({
                "id": id,
                "title": format!("Student {} created", id),
                "createdAt": base - (i as i64) * 60_000,
                "read": read
            })
        })
        .collect();
    json!({"notifications": records})
}
