//! Task router
//!
//! Selects the best-matching agent for a task from the registry using
//! skill-based scoring, and serializes the routed task into the selected
//! agent's wire protocol.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::protocol::{AgentCard, GatewayError, GatewayResult, UnifiedMessage};
use crate::registry::AgentRegistry;
use crate::translator;

/// Outcome of a routing decision.
#[derive(Debug, Clone)]
pub struct RouteDecision {
    /// The selected agent
    pub agent: AgentCard,
    /// Match score, 0-100
    pub score: u32,
    /// The task being routed
    pub task_id: String,
}

/// Skill-based task router.
pub struct TaskRouter {
    registry: Arc<AgentRegistry>,
}

impl TaskRouter {
    /// Create a new task router.
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }

    /// Route a task to the best-matching active agent.
    ///
    /// Scoring: with no required skills every active agent scores 100;
    /// otherwise each satisfied skill contributes `100 / n` and the sum is
    /// rounded. The strictly highest score wins, ties break to the
    /// first-registered agent. A best score of zero is no match.
    pub async fn route_task(
        &self,
        required_skills: &[String],
        task_id: &str,
    ) -> GatewayResult<RouteDecision> {
        let candidates = self.registry.list_by_registration().await;

        let mut best: Option<(AgentCard, u32)> = None;
        for card in candidates {
            if !card.active {
                continue;
            }

            let score = match_score(&card, required_skills);
            if score > best.as_ref().map(|(_, s)| *s).unwrap_or(0) {
                best = Some((card, score));
            }
        }

        match best {
            Some((agent, score)) if score > 0 => {
                tracing::info!(
                    task_id,
                    agent_id = %agent.id,
                    score,
                    "Task routed"
                );
                Ok(RouteDecision {
                    agent,
                    score,
                    task_id: task_id.to_string(),
                })
            }
            _ => {
                tracing::warn!(task_id, ?required_skills, "No matching agent for task");
                Err(GatewayError::NoMatch)
            }
        }
    }

    /// Serialize the routed task into the selected agent's protocol.
    pub fn dispatch_payload(&self, decision: &RouteDecision) -> GatewayResult<Value> {
        let mut params = Map::new();
        params.insert("taskId".to_string(), Value::String(decision.task_id.clone()));
        params.insert("agentId".to_string(), Value::String(decision.agent.id.clone()));

        let message = UnifiedMessage::new("tasks/send", params);
        translator::from_unified(decision.agent.preferred_protocol(), &message)
    }
}

/// Score an agent against a set of required skills (0-100).
///
/// `round(matched * 100 / n)`, with an empty requirement set matching
/// unconditionally at 100.
fn match_score(card: &AgentCard, required_skills: &[String]) -> u32 {
    if required_skills.is_empty() {
        return 100;
    }

    let matched = required_skills
        .iter()
        .filter(|skill| card.matches_skill(skill))
        .count();

    let weight = 100.0 / required_skills.len() as f64;
    (matched as f64 * weight).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Protocol, Skill};

    fn skilled_card(id: &str, skills: &[&str]) -> AgentCard {
        let mut card = AgentCard::new(id, format!("Agent {}", id), "http://localhost");
        for skill in skills {
            card = card.with_skill(Skill::new(*skill));
        }
        card
    }

    #[tokio::test]
    async fn test_route_by_skill() {
        let registry = Arc::new(AgentRegistry::new());
        registry.register(skilled_card("billing-agent", &["billing"])).await;
        registry.register(skilled_card("support-agent", &["support"])).await;

        let router = TaskRouter::new(registry);
        let decision = router
            .route_task(&["billing".to_string()], "t1")
            .await
            .unwrap();

        assert_eq!(decision.agent.id, "billing-agent");
        assert_eq!(decision.score, 100);
        assert_eq!(decision.task_id, "t1");
    }

    #[tokio::test]
    async fn test_partial_match_scores_by_cardinality() {
        let registry = Arc::new(AgentRegistry::new());
        registry.register(skilled_card("a", &["billing"])).await;
        registry.register(skilled_card("b", &["support"])).await;

        let router = TaskRouter::new(registry);
        let decision = router
            .route_task(&["billing".to_string(), "support".to_string()], "t1")
            .await
            .unwrap();

        // Each candidate scores 50; tie breaks to the first registered
        assert_eq!(decision.agent.id, "a");
        assert_eq!(decision.score, 50);
    }

    #[tokio::test]
    async fn test_rounding_of_thirds() {
        let card = skilled_card("a", &["x", "y"]);
        let required: Vec<String> =
            vec!["x".to_string(), "y".to_string(), "z".to_string()];

        // 2 of 3 matched: 66.66… rounds to 67
        assert_eq!(match_score(&card, &required), 67);
    }

    #[tokio::test]
    async fn test_empty_skills_matches_any_active_agent() {
        let registry = Arc::new(AgentRegistry::new());
        registry.register(skilled_card("only", &[])).await;

        let router = TaskRouter::new(registry);
        let decision = router.route_task(&[], "t1").await.unwrap();

        assert_eq!(decision.agent.id, "only");
        assert_eq!(decision.score, 100);
    }

    #[tokio::test]
    async fn test_no_matching_agent() {
        let registry = Arc::new(AgentRegistry::new());
        registry.register(skilled_card("a", &["billing"])).await;

        let router = TaskRouter::new(registry);
        let result = router
            .route_task(&["quantum-teleportation".to_string()], "t1")
            .await;

        assert!(matches!(result, Err(GatewayError::NoMatch)));
    }

    #[tokio::test]
    async fn test_empty_registry_is_no_match() {
        let router = TaskRouter::new(Arc::new(AgentRegistry::new()));
        let result = router.route_task(&[], "t1").await;
        assert!(matches!(result, Err(GatewayError::NoMatch)));
    }

    #[tokio::test]
    async fn test_inactive_agents_are_skipped() {
        let registry = Arc::new(AgentRegistry::new());
        registry
            .register(skilled_card("sleeper", &["billing"]).inactive())
            .await;

        let router = TaskRouter::new(registry);
        let result = router.route_task(&["billing".to_string()], "t1").await;

        assert!(matches!(result, Err(GatewayError::NoMatch)));
    }

    #[tokio::test]
    async fn test_dispatch_payload_uses_agent_protocol() {
        let registry = Arc::new(AgentRegistry::new());
        registry
            .register(skilled_card("a", &["billing"]).with_protocols([Protocol::A2a]))
            .await;

        let router = TaskRouter::new(registry);
        let decision = router
            .route_task(&["billing".to_string()], "t42")
            .await
            .unwrap();
        let payload = router.dispatch_payload(&decision).unwrap();

        assert_eq!(payload["jsonrpc"], "2.0");
        assert_eq!(payload["method"], "tasks/send");
        assert_eq!(payload["params"]["taskId"], "t42");
        assert_eq!(payload["targetProtocol"], "a2a");
    }
}
