//! Agent discovery
//!
//! Fetches remote agent descriptors from their well-known endpoint and
//! upserts them into the registry. The network fetch never holds a registry
//! lock; the upsert is a separate, fast step after the response is parsed,
//! so a failed discovery never leaves a partial write behind.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use url::Url;

use crate::protocol::{AgentCard, GatewayError, GatewayResult};
use crate::registry::AgentRegistry;

/// Well-known path agent cards are published at, per the A2A convention.
const WELL_KNOWN_PATH: &str = "/.well-known/agent.json";

/// Agent discovery service.
pub struct Discovery {
    registry: Arc<AgentRegistry>,
    client: reqwest::Client,
}

impl Discovery {
    /// Create a new discovery service with a 10 second fetch timeout.
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self::with_timeout(registry, Duration::from_secs(10))
    }

    /// Create a discovery service with a custom fetch timeout.
    pub fn with_timeout(registry: Arc<AgentRegistry>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { registry, client }
    }

    /// Discover an agent from its base URL and register it.
    ///
    /// Fetches `{url}/.well-known/agent.json`, validates the descriptor and
    /// upserts it with `discoveredFrom` set to the origin. Returns the
    /// stored card.
    pub async fn discover(&self, base_url: &str) -> GatewayResult<AgentCard> {
        let mut card = self.fetch_descriptor(base_url).await?;
        card.discovered_from = Some(base_url.to_string());

        tracing::info!(agent_id = %card.id, name = %card.name, url = %base_url, "Agent discovered");

        Ok(self.registry.register(card).await)
    }

    /// Discover several agents in parallel. Individual failures do not
    /// abort the batch.
    pub async fn discover_many(&self, base_urls: &[&str]) -> Vec<GatewayResult<AgentCard>> {
        join_all(base_urls.iter().map(|url| self.discover(url))).await
    }

    /// Ping a registered agent's `/health` endpoint.
    pub async fn health_check(&self, agent_id: &str) -> GatewayResult<bool> {
        let card = self
            .registry
            .get(agent_id)
            .await
            .ok_or_else(|| GatewayError::AgentNotFound {
                agent_id: agent_id.to_string(),
            })?;

        let url = format!("{}/health", card.url.trim_end_matches('/'));
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Fetch and validate a descriptor without touching the registry.
    async fn fetch_descriptor(&self, base_url: &str) -> GatewayResult<AgentCard> {
        Url::parse(base_url)
            .map_err(|err| GatewayError::Discovery(format!("invalid url {}: {}", base_url, err)))?;

        let url = format!("{}{}", base_url.trim_end_matches('/'), WELL_KNOWN_PATH);
        tracing::debug!(url = %url, "Fetching agent descriptor");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(GatewayError::Discovery(format!(
                "descriptor fetch returned {}",
                response.status()
            )));
        }

        let card: AgentCard = response
            .json()
            .await
            .map_err(|err| GatewayError::Discovery(format!("malformed descriptor: {}", err)))?;

        validate_descriptor(&card)?;
        Ok(card)
    }
}

fn validate_descriptor(card: &AgentCard) -> GatewayResult<()> {
    for (field, value) in [("id", &card.id), ("name", &card.name), ("url", &card.url)] {
        if value.is_empty() {
            return Err(GatewayError::Discovery(format!(
                "descriptor missing required field '{}'",
                field
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_validation() {
        let valid = AgentCard::new("agent-1", "Agent", "http://localhost");
        assert!(validate_descriptor(&valid).is_ok());

        let missing_id = AgentCard::new("", "Agent", "http://localhost");
        assert!(matches!(
            validate_descriptor(&missing_id),
            Err(GatewayError::Discovery(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_without_fetching() {
        let registry = Arc::new(AgentRegistry::new());
        let discovery = Discovery::new(registry.clone());

        let result = discovery.discover("not a url").await;
        assert!(matches!(result, Err(GatewayError::Discovery(_))));
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_health_check_unknown_agent() {
        let registry = Arc::new(AgentRegistry::new());
        let discovery = Discovery::new(registry);

        let result = discovery.health_check("unknown").await;
        assert!(matches!(result, Err(GatewayError::AgentNotFound { .. })));
    }
}
