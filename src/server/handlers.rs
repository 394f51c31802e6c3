//! REST handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::{AgentCard, GatewayError, Protocol, ProtocolInfo};
use crate::stats::HealthReport;
use crate::stream::StreamStats;
use crate::translator;

use super::AppState;

/// Boundary error: every [`GatewayError`] is recovered here and turned
/// into its documented status code.
pub struct ApiError(GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GatewayError::AgentNotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::NoMatch
            | GatewayError::Translation(_)
            | GatewayError::Serialization(_) => StatusCode::BAD_REQUEST,
            GatewayError::Discovery(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

pub async fn register_agent(
    State(state): State<AppState>,
    Json(card): Json<AgentCard>,
) -> (StatusCode, Json<AgentCard>) {
    let stored = state.registry.register(card).await;
    (StatusCode::CREATED, Json(stored))
}

#[derive(Deserialize)]
pub struct ListAgentsQuery {
    skill: Option<String>,
}

pub async fn list_agents(
    State(state): State<AppState>,
    Query(query): Query<ListAgentsQuery>,
) -> Json<Vec<AgentCard>> {
    let agents = match query.skill {
        Some(skill) => state.registry.find_by_skill(&skill).await,
        None => state.registry.list().await,
    };
    Json(agents)
}

pub async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AgentCard>, ApiError> {
    let card = state
        .registry
        .get(&id)
        .await
        .ok_or(GatewayError::AgentNotFound { agent_id: id })?;
    Ok(Json(card))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnregisterResponse {
    success: bool,
    agent_id: String,
}

pub async fn unregister_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UnregisterResponse>, ApiError> {
    if !state.registry.unregister(&id).await {
        return Err(GatewayError::AgentNotFound { agent_id: id }.into());
    }

    Ok(Json(UnregisterResponse {
        success: true,
        agent_id: id,
    }))
}

#[derive(Deserialize)]
pub struct DiscoverRequest {
    url: String,
}

pub async fn discover_agent(
    State(state): State<AppState>,
    Json(request): Json<DiscoverRequest>,
) -> Result<Json<AgentCard>, ApiError> {
    let card = state.discovery.discover(&request.url).await?;
    Ok(Json(card))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    task_id: String,
    #[serde(default)]
    required_skills: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    selected_agent: AgentCard,
    task_id: String,
    match_score: u32,
}

pub async fn route_task(
    State(state): State<AppState>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, ApiError> {
    let decision = state
        .router
        .route_task(&request.required_skills, &request.task_id)
        .await?;

    Ok(Json(RouteResponse {
        selected_agent: decision.agent,
        task_id: decision.task_id,
        match_score: decision.score,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateRequest {
    source_protocol: Protocol,
    target_protocol: Protocol,
    message: Value,
}

pub async fn translate_message(Json(body): Json<Value>) -> Result<Json<Value>, ApiError> {
    // Manual parse so malformed requests surface as 400, not 422
    let request: TranslateRequest = serde_json::from_value(body)
        .map_err(|err| GatewayError::Translation(format!("invalid request: {}", err)))?;

    let translated = translator::translate(
        request.source_protocol,
        request.target_protocol,
        &request.message,
    )?;
    Ok(Json(translated))
}

pub async fn list_protocols() -> Json<Vec<ProtocolInfo>> {
    Json(Protocol::catalog())
}

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.stats.health().await)
}

pub async fn stream_stats(State(state): State<AppState>) -> Json<StreamStats> {
    Json(state.stats.streams())
}
