//! Event stream manager
//!
//! Owns the per-task subscriber sets and fans task events out to them.
//! Each task id gets its own lock and its own heartbeat timer, so streams
//! for different tasks never contend. Events are transient: publishing to a
//! task nobody watches is a silent no-op.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, RwLock};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::protocol::{TaskEvent, TaskEventKind};

/// Fixed heartbeat period of the externally observable contract.
pub const HEARTBEAT_PERIOD: Duration = Duration::from_secs(30);

/// Subscriber set and heartbeat timer for one task id.
struct TaskStream {
    subscribers: HashMap<Uuid, mpsc::UnboundedSender<TaskEvent>>,
    heartbeat: Option<JoinHandle<()>>,
}

impl TaskStream {
    fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
            heartbeat: None,
        }
    }
}

struct StreamInner {
    tasks: RwLock<HashMap<String, Arc<Mutex<TaskStream>>>>,
    heartbeat_period: Duration,
}

impl StreamInner {
    /// Snapshot the subscriber set and deliver `event` to every member.
    ///
    /// The snapshot is taken under the task's lock, so a subscribe or
    /// unsubscribe racing this broadcast either fully precedes it or fully
    /// follows it; membership is never observed half-changed.
    fn fan_out(&self, stream: &Mutex<TaskStream>, event: TaskEvent) -> usize {
        let guard = stream.lock().expect("task stream lock poisoned");
        let targets: Vec<mpsc::UnboundedSender<TaskEvent>> =
            guard.subscribers.values().cloned().collect();

        let mut delivered = 0;
        for sender in targets {
            if sender.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    fn stream_for(&self, task_id: &str) -> Option<Arc<Mutex<TaskStream>>> {
        let tasks = self.tasks.read().expect("stream table lock poisoned");
        tasks.get(task_id).cloned()
    }

    /// Remove a subscriber; tears the whole task entry (and its heartbeat)
    /// down when the set becomes empty.
    fn remove_subscriber(&self, task_id: &str, subscriber_id: Uuid) -> bool {
        let mut tasks = self.tasks.write().expect("stream table lock poisoned");
        let Some(stream) = tasks.get(task_id).cloned() else {
            return false;
        };

        let mut guard = stream.lock().expect("task stream lock poisoned");
        let removed = guard.subscribers.remove(&subscriber_id).is_some();

        if removed && guard.subscribers.is_empty() {
            // Heartbeat must be cancelled no later than the last removal
            if let Some(handle) = guard.heartbeat.take() {
                handle.abort();
            }
            drop(guard);
            tasks.remove(task_id);
            tracing::debug!(task_id, "Task stream torn down");
        }

        removed
    }
}

/// Manages per-task event streams: subscriptions, heartbeats and fan-out.
#[derive(Clone)]
pub struct StreamManager {
    inner: Arc<StreamInner>,
}

impl StreamManager {
    /// Create a stream manager with the contractual 30 second heartbeat.
    pub fn new() -> Self {
        Self::with_heartbeat_period(HEARTBEAT_PERIOD)
    }

    /// Create a stream manager with a custom heartbeat period.
    ///
    /// The 30 second period is part of the external contract; this exists
    /// so tests can run against a short one.
    pub fn with_heartbeat_period(period: Duration) -> Self {
        Self {
            inner: Arc::new(StreamInner {
                tasks: RwLock::new(HashMap::new()),
                heartbeat_period: period,
            }),
        }
    }

    /// Subscribe to a task's event stream.
    ///
    /// The new handle immediately receives a `status {"status":"connected"}`
    /// event; the first subscriber of a task starts its heartbeat timer.
    /// Every call yields an independent handle, including repeat calls from
    /// the same client.
    pub fn subscribe(&self, task_id: &str) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let subscriber_id = Uuid::now_v7();

        {
            let mut tasks = self.inner.tasks.write().expect("stream table lock poisoned");
            let stream = tasks
                .entry(task_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(TaskStream::new())))
                .clone();

            let mut guard = stream.lock().expect("task stream lock poisoned");
            guard.subscribers.insert(subscriber_id, sender.clone());

            if guard.heartbeat.is_none() {
                guard.heartbeat = Some(self.spawn_heartbeat(task_id.to_string()));
            }
        }

        // Connected event goes to the new handle only
        let _ = sender.send(TaskEvent::connected(task_id));

        tracing::debug!(task_id, subscriber_id = %subscriber_id, "Subscriber added");

        Subscription {
            task_id: task_id.to_string(),
            id: subscriber_id,
            receiver,
            inner: self.inner.clone(),
        }
    }

    /// Remove a subscriber explicitly. Returns whether it was present.
    ///
    /// Dropping the [`Subscription`] has the same effect; this exists for
    /// transports that learn about disconnection out of band.
    pub fn unsubscribe(&self, task_id: &str, subscriber_id: Uuid) -> bool {
        self.inner.remove_subscriber(task_id, subscriber_id)
    }

    /// Broadcast an event to every current subscriber of `task_id`.
    ///
    /// The timestamp is stamped here. Publishing to an unknown task is a
    /// silent no-op: a task may finish before anyone subscribes. Returns
    /// the number of handles the event was delivered to.
    pub fn publish(&self, task_id: &str, kind: TaskEventKind, data: Value) -> usize {
        let Some(stream) = self.inner.stream_for(task_id) else {
            tracing::trace!(task_id, "Publish to task without subscribers");
            return 0;
        };

        let event = TaskEvent::new(kind, task_id, data);
        self.inner.fan_out(&stream, event)
    }

    /// Per-task subscriber counts plus aggregate totals.
    pub fn stats(&self) -> StreamStats {
        let tasks = self.inner.tasks.read().expect("stream table lock poisoned");

        let mut by_task = HashMap::new();
        for (task_id, stream) in tasks.iter() {
            let count = stream
                .lock()
                .expect("task stream lock poisoned")
                .subscribers
                .len();
            debug_assert!(count > 0, "empty task stream left behind");
            by_task.insert(task_id.clone(), count);
        }

        StreamStats {
            active_streams: by_task.len(),
            total_connections: by_task.values().sum(),
            by_task,
        }
    }

    fn spawn_heartbeat(&self, task_id: String) -> JoinHandle<()> {
        let inner = self.inner.clone();
        let period = self.inner.heartbeat_period;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately; skip it
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(stream) = inner.stream_for(&task_id) else {
                    break;
                };
                inner.fan_out(&stream, TaskEvent::heartbeat(&task_id));
            }
        })
    }
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate stream observability data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStats {
    pub active_streams: usize,
    pub total_connections: usize,
    pub by_task: HashMap<String, usize>,
}

/// One open event stream for a task.
///
/// Holds the receiving end of the subscriber channel. Dropping the handle
/// releases the subscriber slot, which is how transport-signalled
/// disconnection reaches the stream manager.
pub struct Subscription {
    task_id: String,
    id: Uuid,
    receiver: mpsc::UnboundedReceiver<TaskEvent>,
    inner: Arc<StreamInner>,
}

impl Subscription {
    /// The task this subscription watches.
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Unique handle id of this subscription.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Receive the next event. Returns `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<TaskEvent> {
        self.receiver.recv().await
    }
}

impl Stream for Subscription {
    type Item = TaskEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<TaskEvent>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.inner.remove_subscriber(&self.task_id, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_subscribe_receives_connected_event() {
        let manager = StreamManager::new();
        let mut sub = manager.subscribe("t1");

        let event = sub.recv().await.unwrap();
        assert_eq!(event.kind, TaskEventKind::Status);
        assert_eq!(event.task_id, "t1");
        assert_eq!(event.data["status"], "connected");
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let manager = StreamManager::new();
        let mut first = manager.subscribe("t1");
        let mut second = manager.subscribe("t1");
        first.recv().await.unwrap();
        second.recv().await.unwrap();

        let delivered = manager.publish("t1", TaskEventKind::Progress, json!({"step": 1}));
        assert_eq!(delivered, 2);

        for sub in [&mut first, &mut second] {
            let event = sub.recv().await.unwrap();
            assert_eq!(event.kind, TaskEventKind::Progress);
            assert_eq!(event.data["step"], 1);
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let manager = StreamManager::new();
        assert_eq!(
            manager.publish("ghost", TaskEventKind::Result, json!({})),
            0
        );
    }

    #[tokio::test]
    async fn test_unsubscribed_handle_receives_nothing_further() {
        let manager = StreamManager::new();
        let mut sub = manager.subscribe("t1");
        sub.recv().await.unwrap(); // connected

        assert!(manager.unsubscribe("t1", sub.id()));
        assert_eq!(manager.publish("t1", TaskEventKind::Progress, json!({})), 0);

        // Channel is closed once the slot is gone
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let manager = StreamManager::new();
        let sub = manager.subscribe("t1");
        let id = sub.id();

        assert!(manager.unsubscribe("t1", id));
        assert!(!manager.unsubscribe("t1", id));
    }

    #[tokio::test]
    async fn test_drop_releases_subscriber_slot() {
        let manager = StreamManager::new();
        let sub = manager.subscribe("t1");
        assert_eq!(manager.stats().total_connections, 1);

        drop(sub);
        let stats = manager.stats();
        assert_eq!(stats.total_connections, 0);
        assert_eq!(stats.active_streams, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_fires_on_schedule() {
        let manager = StreamManager::new();
        let mut sub = manager.subscribe("t1");
        sub.recv().await.unwrap(); // connected

        // Paused clock auto-advances to the 30s tick
        let event = sub.recv().await.unwrap();
        assert_eq!(event.kind, TaskEventKind::Heartbeat);
        assert_eq!(event.task_id, "t1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_heartbeat_after_last_unsubscribe() {
        let manager = StreamManager::new();
        let mut sub = manager.subscribe("t1");
        sub.recv().await.unwrap();
        manager.unsubscribe("t1", sub.id());

        tokio::time::advance(Duration::from_secs(120)).await;
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_task_regains_subscribers_after_teardown() {
        let manager = StreamManager::new();
        let first = manager.subscribe("t1");
        drop(first);
        assert_eq!(manager.stats().active_streams, 0);

        let mut second = manager.subscribe("t1");
        let event = second.recv().await.unwrap();
        assert_eq!(event.data["status"], "connected");
        assert_eq!(manager.stats().active_streams, 1);
    }

    #[tokio::test]
    async fn test_stats_counts_by_task() {
        let manager = StreamManager::new();
        let _a = manager.subscribe("t1");
        let _b = manager.subscribe("t1");
        let _c = manager.subscribe("t2");

        let stats = manager.stats();
        assert_eq!(stats.active_streams, 2);
        assert_eq!(stats.total_connections, 3);
        assert_eq!(stats.by_task["t1"], 2);
        assert_eq!(stats.by_task["t2"], 1);
    }
}
