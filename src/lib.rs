//! # Nexus Gateway
//!
//! A multi-protocol gateway for agent meshes: agents speaking different
//! protocols register once and become reachable through a single HTTP
//! surface.
//!
//! The gateway keeps a registry of agent cards, translates messages between
//! protocol envelopes through a unified intermediate form, routes tasks to
//! the best-scoring agent by skill, and fans task events out to subscribers
//! over server-sent events.
//!
//! ## Example
//!
//! ```rust,no_run
//! use nexus_gateway::config::GatewayConfig;
//! use nexus_gateway::server::{app, AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = GatewayConfig::from_env();
//!     let state = AppState::new(&config);
//!
//!     let listener = tokio::net::TcpListener::bind(config.bind).await?;
//!     axum::serve(listener, app(state)).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod discovery;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod server;
pub mod stats;
pub mod stream;
pub mod translator;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        discovery::Discovery,
        protocol::{AgentCard, GatewayError, Protocol, Skill, TaskEvent, TaskEventKind},
        registry::AgentRegistry,
        router::{RouteDecision, TaskRouter},
        stream::{StreamManager, Subscription},
    };
}
