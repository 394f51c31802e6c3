//! Core protocol types for the Nexus gateway

pub mod agent;
pub mod error;
pub mod event;
pub mod message;

pub use agent::{AgentCard, Skill};
pub use error::{GatewayError, GatewayResult};
pub use event::{TaskEvent, TaskEventKind};
pub use message::UnifiedMessage;

use serde::{Deserialize, Serialize};

/// Wire protocols the gateway can translate between.
///
/// Each variant carries its own envelope rules in the translator; the
/// [`UnifiedMessage`] is the common projection all of them map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Google Agent-to-Agent protocol (JSON-RPC 2.0)
    A2a,
    /// Anthropic Model Context Protocol (JSON-RPC 2.0)
    Mcp,
    /// Native gateway protocol
    Verimantle,
    /// W3C Agent Network Protocol
    Anp,
    /// ECMA Natural Language Interaction Protocol
    Nlip,
    /// NEAR Agent Interaction and Transaction Protocol
    Aitp,
}

impl Protocol {
    /// Human-readable protocol name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::A2a => "Google A2A",
            Self::Mcp => "Anthropic MCP",
            Self::Verimantle => "Verimantle Native",
            Self::Anp => "W3C ANP",
            Self::Nlip => "ECMA NLIP",
            Self::Aitp => "NEAR AITP",
        }
    }

    /// Whether messages in this protocol travel in a JSON-RPC 2.0 envelope.
    pub fn is_json_rpc(&self) -> bool {
        matches!(self, Self::A2a | Self::Mcp)
    }

    /// All protocols the gateway knows about, catalog order.
    pub fn all() -> [Protocol; 6] {
        [
            Self::A2a,
            Self::Mcp,
            Self::Verimantle,
            Self::Anp,
            Self::Nlip,
            Self::Aitp,
        ]
    }

    /// Static catalog served on `GET /protocols`.
    pub fn catalog() -> Vec<ProtocolInfo> {
        Self::all()
            .into_iter()
            .map(ProtocolInfo::for_protocol)
            .collect()
    }
}

/// Support level of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolStatus {
    /// Fully translated by the gateway
    Supported,
    /// The gateway's own wire format
    Native,
    /// Recognized but translated generically
    Planned,
}

/// Catalog entry describing one supported protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolInfo {
    pub id: Protocol,
    pub name: String,
    pub version: String,
    pub status: ProtocolStatus,
}

impl ProtocolInfo {
    fn for_protocol(protocol: Protocol) -> Self {
        let (version, status) = match protocol {
            Protocol::A2a => ("0.3", ProtocolStatus::Supported),
            Protocol::Mcp => ("2025-06-18", ProtocolStatus::Supported),
            Protocol::Verimantle => ("1.0", ProtocolStatus::Native),
            Protocol::Anp => ("1.0", ProtocolStatus::Planned),
            Protocol::Nlip => ("1.0", ProtocolStatus::Planned),
            Protocol::Aitp => ("0.1", ProtocolStatus::Planned),
        };

        Self {
            id: protocol,
            name: protocol.name().to_string(),
            version: version.to_string(),
            status,
        }
    }
}
