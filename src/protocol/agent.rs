//! Agent descriptor types

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Protocol;

/// Agent Card describing a discoverable agent
///
/// Cards are published at `/.well-known/agent.json` and describe the agent's
/// identity, capabilities, skills and accepted protocols. The registry stamps
/// `registeredAt`/`updatedAt` on every write; callers never set them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    /// Unique agent id (UUID). Assigned by the registry when empty.
    #[serde(default)]
    pub id: String,

    /// Display name of the agent
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Base URL the agent is reachable at
    pub url: String,

    /// Agent version string
    #[serde(default)]
    pub version: String,

    /// Capability tags (unordered, deduplicated)
    #[serde(default)]
    pub capabilities: BTreeSet<String>,

    /// Skills the agent advertises, matched during routing
    #[serde(default)]
    pub skills: Vec<Skill>,

    /// Protocols the agent accepts
    #[serde(default = "default_protocols")]
    pub protocols: BTreeSet<Protocol>,

    /// Stamped by the registry on every write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<DateTime<Utc>>,

    /// Stamped by the registry on every write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Whether the agent is eligible for routing
    #[serde(default = "default_active")]
    pub active: bool,

    /// Origin URL, set only when the card was created via discovery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovered_from: Option<String>,
}

fn default_protocols() -> BTreeSet<Protocol> {
    BTreeSet::from([Protocol::Verimantle])
}

fn default_active() -> bool {
    true
}

impl AgentCard {
    /// Create a new agent card
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            url: url.into(),
            version: String::new(),
            capabilities: BTreeSet::new(),
            skills: Vec::new(),
            protocols: default_protocols(),
            registered_at: None,
            updated_at: None,
            active: true,
            discovered_from: None,
        }
    }

    /// Add a skill to the card
    pub fn with_skill(mut self, skill: Skill) -> Self {
        self.skills.push(skill);
        self
    }

    /// Add a capability tag
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    /// Replace the accepted protocol set
    pub fn with_protocols(mut self, protocols: impl IntoIterator<Item = Protocol>) -> Self {
        self.protocols = protocols.into_iter().collect();
        self
    }

    /// Mark the card inactive
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Check whether any skill satisfies `query`.
    ///
    /// A skill matches when the query case-insensitively equals its id,
    /// is a case-insensitive substring of its name, or is a member of its
    /// tag set (case-insensitive).
    pub fn matches_skill(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.skills.iter().any(|skill| skill.matches(&query))
    }

    /// The protocol used when dispatching to this agent.
    pub fn preferred_protocol(&self) -> Protocol {
        self.protocols
            .iter()
            .next()
            .copied()
            .unwrap_or(Protocol::Verimantle)
    }
}

/// A named capability an agent advertises
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Skill {
    /// Skill id, matched exactly (case-insensitive)
    pub id: String,

    /// Display name, matched by substring (case-insensitive)
    #[serde(default)]
    pub name: String,

    /// Tags for matching
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Skill {
    /// Create a new skill whose name defaults to its id
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            tags: BTreeSet::new(),
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Match against an already-lowercased query. An empty query matches
    /// nothing, since every name contains the empty substring.
    pub(crate) fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return false;
        }
        self.id.to_lowercase() == query
            || self.name.to_lowercase().contains(query)
            || self.tags.iter().any(|tag| tag.to_lowercase() == query)
    }
}
