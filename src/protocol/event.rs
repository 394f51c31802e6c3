//! Task event types for stream fan-out

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A point-in-time notification about a task
///
/// Events are transient and best-effort: they are delivered to whoever is
/// subscribed at publish time and never replayed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskEvent {
    /// Event kind
    #[serde(rename = "type")]
    pub kind: TaskEventKind,

    /// Task this event belongs to
    pub task_id: String,

    /// Opaque payload
    pub data: Value,

    /// Assigned at publish time. Not guaranteed monotonic per task.
    pub timestamp: DateTime<Utc>,
}

impl TaskEvent {
    /// Create an event stamped with the current time
    pub fn new(kind: TaskEventKind, task_id: impl Into<String>, data: Value) -> Self {
        Self {
            kind,
            task_id: task_id.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    /// The `status: connected` event sent to a new subscriber
    pub fn connected(task_id: impl Into<String>) -> Self {
        Self::new(
            TaskEventKind::Status,
            task_id,
            serde_json::json!({"status": "connected"}),
        )
    }

    /// A heartbeat tick
    pub fn heartbeat(task_id: impl Into<String>) -> Self {
        Self::new(TaskEventKind::Heartbeat, task_id, Value::Null)
    }
}

/// Kinds of task events carried over an event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskEventKind {
    Status,
    Progress,
    Result,
    Error,
    Heartbeat,
}

impl TaskEventKind {
    /// Wire name used in the `event:` line of an SSE frame.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Progress => "progress",
            Self::Result => "result",
            Self::Error => "error",
            Self::Heartbeat => "heartbeat",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = TaskEvent::new(
            TaskEventKind::Progress,
            "t1",
            serde_json::json!({"step": 1}),
        );
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "progress");
        assert_eq!(json["taskId"], "t1");
        assert_eq!(json["data"]["step"], 1);
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn test_connected_event_payload() {
        let event = TaskEvent::connected("t1");
        assert_eq!(event.kind, TaskEventKind::Status);
        assert_eq!(event.data["status"], "connected");
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(TaskEventKind::Heartbeat.as_str(), "heartbeat");
        assert_eq!(
            serde_json::to_string(&TaskEventKind::Result).unwrap(),
            "\"result\""
        );
    }
}
