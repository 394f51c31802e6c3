//! Protocol translation
//!
//! Stateless normalization between protocol-specific message shapes and the
//! [`UnifiedMessage`] pivot. Translation only touches the envelope: `method`
//! and `params` pass through unchanged in both directions, so a round trip
//! through any protocol reproduces them bit-for-bit.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::protocol::{GatewayError, GatewayResult, Protocol, UnifiedMessage};

/// JSON-RPC version marker attached to a2a/mcp envelopes.
const JSON_RPC_VERSION: &str = "2.0";

/// Normalize a raw protocol message into the unified representation.
///
/// For the JSON-RPC protocols (a2a, mcp) `method` and `params` are read
/// directly from the envelope. Every other protocol, the native one
/// included, falls back to treating the entire message as `params` when no
/// explicit `params` field is present.
pub fn to_unified(source: Protocol, raw: &Value) -> GatewayResult<UnifiedMessage> {
    let object = raw.as_object().ok_or_else(|| {
        GatewayError::Translation(format!(
            "{} message must be a JSON object",
            source.name()
        ))
    })?;

    let id = message_id(object);
    let method = object
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let params = if source.is_json_rpc() {
        extract_params(object)?.unwrap_or_default()
    } else {
        // Native and generic protocols: the whole message is the payload
        // unless it declares its own params field.
        extract_params(object)?.unwrap_or_else(|| object.clone())
    };

    Ok(UnifiedMessage::new(method, params)
        .from_protocol(source)
        .with_id(id))
}

/// Serialize a unified message into the target protocol's wire shape.
///
/// All unified fields are copied; a2a/mcp additionally gain the JSON-RPC
/// version marker. Fields are only ever added, never removed or renamed.
pub fn from_unified(target: Protocol, message: &UnifiedMessage) -> GatewayResult<Value> {
    let stamped = message.clone().to_protocol(target);
    let mut value = serde_json::to_value(&stamped)?;

    if target.is_json_rpc() {
        let object = value
            .as_object_mut()
            .expect("UnifiedMessage serializes to an object");
        object.insert("jsonrpc".to_string(), Value::String(JSON_RPC_VERSION.into()));
    }

    Ok(value)
}

/// Translate a raw message across a protocol boundary in one step.
pub fn translate(source: Protocol, target: Protocol, raw: &Value) -> GatewayResult<Value> {
    let unified = to_unified(source, raw)?;
    from_unified(target, &unified)
}

fn message_id(object: &Map<String, Value>) -> String {
    match object.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        // MCP allows numeric JSON-RPC ids
        Some(Value::Number(id)) => id.to_string(),
        _ => Uuid::now_v7().to_string(),
    }
}

fn extract_params(object: &Map<String, Value>) -> GatewayResult<Option<Map<String, Value>>> {
    match object.get("params") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(params)) => Ok(Some(params.clone())),
        Some(other) => Err(GatewayError::Translation(format!(
            "params must be an object, got {}",
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_a2a_message_reads_method_and_params() {
        let raw = json!({"id": "1", "method": "tasks/send", "params": {"task": "hello"}});
        let unified = to_unified(Protocol::A2a, &raw).unwrap();

        assert_eq!(unified.id, "1");
        assert_eq!(unified.method, "tasks/send");
        assert_eq!(unified.params["task"], "hello");
        assert_eq!(unified.source_protocol, Protocol::A2a);
    }

    #[test]
    fn test_a2a_defaults_when_fields_missing() {
        let raw = json!({});
        let unified = to_unified(Protocol::A2a, &raw).unwrap();

        assert!(!unified.id.is_empty());
        assert_eq!(unified.method, "");
        assert!(unified.params.is_empty());
    }

    #[test]
    fn test_native_message_falls_back_to_whole_payload() {
        let raw = json!({"action": "verify", "target": "agent-1"});
        let unified = to_unified(Protocol::Verimantle, &raw).unwrap();

        assert_eq!(unified.params["action"], "verify");
        assert_eq!(unified.params["target"], "agent-1");
    }

    #[test]
    fn test_native_message_prefers_explicit_params() {
        let raw = json!({"method": "verify", "params": {"x": 1}});
        let unified = to_unified(Protocol::Nlip, &raw).unwrap();

        assert_eq!(unified.method, "verify");
        assert_eq!(unified.params.len(), 1);
        assert_eq!(unified.params["x"], 1);
    }

    #[test]
    fn test_numeric_json_rpc_id_is_preserved() {
        let raw = json!({"id": 7, "method": "ping"});
        let unified = to_unified(Protocol::Mcp, &raw).unwrap();
        assert_eq!(unified.id, "7");
    }

    #[test]
    fn test_non_object_message_is_rejected() {
        let raw = json!("just a string");
        let result = to_unified(Protocol::A2a, &raw);
        assert!(matches!(result, Err(GatewayError::Translation(_))));
    }

    #[test]
    fn test_non_object_params_are_rejected() {
        let raw = json!({"method": "ping", "params": [1, 2, 3]});
        let result = to_unified(Protocol::Mcp, &raw);
        assert!(matches!(result, Err(GatewayError::Translation(_))));
    }

    #[test]
    fn test_from_unified_adds_json_rpc_marker() {
        let raw = json!({"id": "1", "method": "ping", "params": {}});
        let unified = to_unified(Protocol::A2a, &raw).unwrap();
        let wire = from_unified(Protocol::Mcp, &unified).unwrap();

        assert_eq!(wire["jsonrpc"], "2.0");
        assert_eq!(wire["method"], "ping");
        assert_eq!(wire["targetProtocol"], "mcp");
    }

    #[test]
    fn test_from_unified_native_only_sets_target() {
        let unified = UnifiedMessage::new("ping", Map::new()).from_protocol(Protocol::A2a);
        let wire = from_unified(Protocol::Verimantle, &unified).unwrap();

        assert!(wire.get("jsonrpc").is_none());
        assert_eq!(wire["targetProtocol"], "verimantle");
    }

    #[test]
    fn test_round_trip_preserves_method_and_params() {
        let original = json!({
            "id": "1",
            "method": "foo",
            "params": {"x": 1}
        });

        // a2a -> unified -> mcp -> unified -> a2a
        let as_mcp = translate(Protocol::A2a, Protocol::Mcp, &original).unwrap();
        let back = translate(Protocol::Mcp, Protocol::A2a, &as_mcp).unwrap();

        assert_eq!(back["method"], original["method"]);
        assert_eq!(back["params"], original["params"]);
    }

    #[test]
    fn test_same_protocol_round_trip() {
        let original = json!({"id": "9", "method": "echo", "params": {"msg": "hi"}});

        let wire = from_unified(
            Protocol::Verimantle,
            &to_unified(Protocol::Verimantle, &original).unwrap(),
        )
        .unwrap();
        let unified = to_unified(Protocol::Verimantle, &wire).unwrap();

        assert_eq!(unified.method, "echo");
        assert_eq!(unified.params["msg"], "hi");
    }
}
