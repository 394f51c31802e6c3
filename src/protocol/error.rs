//! Error types for gateway operations

use thiserror::Error;

/// Main error type for gateway operations
///
/// All variants are recovered at the HTTP boundary and mapped to the
/// documented status codes; none crash the process.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Unknown agent id on get/delete
    #[error("Agent not found: {agent_id}")]
    AgentNotFound { agent_id: String },

    /// The router found no agent scoring above zero
    #[error("No agent matches the required skills")]
    NoMatch,

    /// Network failure or malformed remote descriptor during discovery
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Malformed input message for the declared protocol
    #[error("Translation error: {0}")]
    Translation(String),

    /// Card store failure (external persistence capability)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Discovery("request timed out".to_string())
        } else if err.is_connect() {
            GatewayError::Discovery(format!("connection error: {}", err))
        } else {
            GatewayError::Discovery(err.to_string())
        }
    }
}
