//! Read-only gateway observability

use std::sync::Arc;

use serde::Serialize;

use crate::protocol::Protocol;
use crate::registry::AgentRegistry;
use crate::stream::{StreamManager, StreamStats};

/// Health summary served on `GET /health`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub registered_agents: usize,
    pub supported_protocols: Vec<Protocol>,
}

/// Aggregates registry and stream state for the observability endpoints.
pub struct StatsReporter {
    registry: Arc<AgentRegistry>,
    streams: StreamManager,
}

impl StatsReporter {
    /// Create a new reporter over the gateway's registry and streams.
    pub fn new(registry: Arc<AgentRegistry>, streams: StreamManager) -> Self {
        Self { registry, streams }
    }

    /// Current health summary.
    pub async fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok",
            registered_agents: self.registry.count().await,
            supported_protocols: Protocol::all().to_vec(),
        }
    }

    /// Current stream statistics.
    pub fn streams(&self) -> StreamStats {
        self.streams.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::AgentCard;

    #[tokio::test]
    async fn test_health_report() {
        let registry = Arc::new(AgentRegistry::new());
        registry
            .register(AgentCard::new("a", "Agent A", "http://localhost"))
            .await;

        let reporter = StatsReporter::new(registry, StreamManager::new());
        let health = reporter.health().await;

        assert_eq!(health.status, "ok");
        assert_eq!(health.registered_agents, 1);
        assert_eq!(health.supported_protocols.len(), 6);
    }

    #[tokio::test]
    async fn test_stream_stats_pass_through() {
        let registry = Arc::new(AgentRegistry::new());
        let streams = StreamManager::new();
        let _sub = streams.subscribe("t1");

        let reporter = StatsReporter::new(registry, streams);
        let stats = reporter.streams();

        assert_eq!(stats.active_streams, 1);
        assert_eq!(stats.total_connections, 1);
    }
}
