//! Server-sent event endpoints
//!
//! Each connection owns a [`Subscription`](crate::stream::Subscription);
//! dropping the response stream on disconnect releases the subscriber slot.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use futures::StreamExt;

use crate::protocol::{TaskEvent, TaskEventKind};
use crate::stream::HEARTBEAT_PERIOD;

use super::AppState;

/// Render a task event as one SSE frame: the kind on the `event:` line,
/// the JSON body on the `data:` line.
fn frame(event: &TaskEvent) -> Result<Event, Infallible> {
    let data = serde_json::to_string(event).unwrap_or_else(|_| String::from("{}"));
    Ok(Event::default().event(event.kind.as_str()).data(data))
}

/// `GET /stream/tasks/:task_id`: live event feed for one task.
pub async fn task_events(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    let subscription = state.streams.subscribe(&task_id);
    let stream = subscription.map(|event| frame(&event));

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Sse::new(stream),
    )
}

/// `GET /stream/agents`: registry snapshot on connect, then heartbeats.
pub async fn agent_events(State(state): State<AppState>) -> impl IntoResponse {
    let stream = async_stream::stream! {
        let agents = state.registry.list().await;
        let snapshot = TaskEvent::new(
            TaskEventKind::Status,
            "agents",
            serde_json::json!({ "agents": agents }),
        );
        yield frame(&snapshot);

        let mut interval = tokio::time::interval(HEARTBEAT_PERIOD);
        // The first tick completes immediately; skip it
        interval.tick().await;
        loop {
            interval.tick().await;
            yield frame(&TaskEvent::heartbeat("agents"));
        }
    };

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Sse::new(stream),
    )
}
