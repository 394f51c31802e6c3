//! Protocol-neutral message envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::Protocol;

/// Protocol-neutral envelope used as the pivot for translation
///
/// Translating into a `UnifiedMessage` and back to the same protocol must
/// reproduce `method` and `params` unchanged; protocol-specific envelope
/// fields (the JSON-RPC version marker) may be added, never removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedMessage {
    /// Unique message id, generated when the source omits one
    pub id: String,

    /// JSON-RPC style method, empty allowed
    #[serde(default)]
    pub method: String,

    /// Normalized parameters, key-unique
    #[serde(default)]
    pub params: Map<String, Value>,

    /// Protocol the message arrived in
    pub source_protocol: Protocol,

    /// Protocol the message is bound for; set at serialization time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_protocol: Option<Protocol>,

    /// When the message was normalized
    pub timestamp: DateTime<Utc>,
}

impl UnifiedMessage {
    /// Create a new message with a generated id
    pub fn new(method: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            method: method.into(),
            params,
            source_protocol: Protocol::Verimantle,
            target_protocol: None,
            timestamp: Utc::now(),
        }
    }

    /// Replace the generated id (used when the source message carried one)
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the source protocol
    pub fn from_protocol(mut self, protocol: Protocol) -> Self {
        self.source_protocol = protocol;
        self
    }

    /// Set the target protocol
    pub fn to_protocol(mut self, protocol: Protocol) -> Self {
        self.target_protocol = Some(protocol);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_generates_id() {
        let msg = UnifiedMessage::new("tasks/send", Map::new());
        assert!(!msg.id.is_empty());
        assert_eq!(msg.source_protocol, Protocol::Verimantle);
        assert!(msg.target_protocol.is_none());
    }

    #[test]
    fn test_message_serialization_camel_case() {
        let msg = UnifiedMessage::new("ping", Map::new())
            .from_protocol(Protocol::A2a)
            .to_protocol(Protocol::Mcp);

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["sourceProtocol"], "a2a");
        assert_eq!(json["targetProtocol"], "mcp");
        assert!(json.get("source_protocol").is_none());
    }

    #[test]
    fn test_target_protocol_omitted_until_set() {
        let msg = UnifiedMessage::new("ping", Map::new());
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("targetProtocol").is_none());
    }
}
