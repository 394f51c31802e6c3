//! HTTP surface of the gateway

mod handlers;
mod sse;

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::discovery::Discovery;
use crate::registry::AgentRegistry;
use crate::router::TaskRouter;
use crate::stats::StatsReporter;
use crate::stream::StreamManager;

/// Shared service handles, constructed once at startup.
///
/// No ambient globals: every handler receives this state explicitly.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AgentRegistry>,
    pub discovery: Arc<Discovery>,
    pub router: Arc<TaskRouter>,
    pub streams: StreamManager,
    pub stats: Arc<StatsReporter>,
}

impl AppState {
    /// Wire up the gateway services from a configuration.
    pub fn new(config: &GatewayConfig) -> Self {
        let registry = Arc::new(AgentRegistry::new());
        let discovery = Arc::new(Discovery::with_timeout(
            registry.clone(),
            config.discovery_timeout,
        ));
        let router = Arc::new(TaskRouter::new(registry.clone()));
        let streams = StreamManager::new();
        let stats = Arc::new(StatsReporter::new(registry.clone(), streams.clone()));

        Self {
            registry,
            discovery,
            router,
            streams,
            stats,
        }
    }
}

/// Build the gateway's HTTP router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route(
            "/agents",
            post(handlers::register_agent).get(handlers::list_agents),
        )
        .route(
            "/agents/:id",
            get(handlers::get_agent).delete(handlers::unregister_agent),
        )
        .route("/discover", post(handlers::discover_agent))
        .route("/route", post(handlers::route_task))
        .route("/translate", post(handlers::translate_message))
        .route("/protocols", get(handlers::list_protocols))
        .route("/health", get(handlers::health))
        .route("/stream/tasks/:task_id", get(sse::task_events))
        .route("/stream/agents", get(sse::agent_events))
        .route("/stream/stats", get(handlers::stream_stats))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
