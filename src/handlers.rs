use axum::extract::State;
use axum::Json;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::OnceLock;
use tracing::info;

use crate::error::GatewayError;
use crate::events::{self, HistoryEntry};
use crate::session;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AgentRequest {
    pub agent_name: String,
    pub message: String,
    pub user_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AgentResponse {
    pub response: String,
    pub session_id: String,
    pub agent_name: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryRequest {
    pub agent_name: String,
    pub user_id: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}

// Identifiers are interpolated into backend URL paths, so they are limited
// to a conservative character class, with a leading word character to rule
// out "." and "..".
fn is_safe_identifier(value: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"^\w[\w\-.]{0,127}$").unwrap());
    pattern.is_match(value)
}

fn validate_identifier(field: &'static str, value: &str) -> Result<(), GatewayError> {
    if is_safe_identifier(value) {
        Ok(())
    } else {
        Err(GatewayError::InvalidIdentifier {
            field,
            value: value.to_string(),
        })
    }
}

/// POST /run_agent
///
/// One full turn: resolve the agent, make sure a backend session exists,
/// dispatch the message, extract the final reply from the event log.
pub async fn run_agent(
    State(state): State<AppState>,
    Json(request): Json<AgentRequest>,
) -> Result<Json<AgentResponse>, GatewayError> {
    info!(
        "Turn request for agent {} (user {}, session {:?})",
        request.agent_name, request.user_id, request.session_id
    );

    validate_identifier("agent_name", &request.agent_name)?;
    validate_identifier("user_id", &request.user_id)?;
    if let Some(id) = request.session_id.as_deref().filter(|id| !id.is_empty()) {
        validate_identifier("session_id", id)?;
    }

    let base_url = state
        .registry
        .resolve(&request.agent_name)
        .ok_or_else(|| GatewayError::UnknownAgent(request.agent_name.clone()))?;

    let session_id = session::ensure_session(
        &state.runtime,
        base_url,
        &request.agent_name,
        &request.user_id,
        request.session_id.clone(),
    )
    .await?;

    let events = state
        .runtime
        .run(
            base_url,
            &request.agent_name,
            &request.user_id,
            &session_id,
            &request.message,
        )
        .await?;

    let response = events::extract_final_reply(&events);

    Ok(Json(AgentResponse {
        response,
        session_id,
        agent_name: request.agent_name,
        status: "success".to_string(),
    }))
}

/// POST /get_history
///
/// Reconstruct the normalized transcript for a session. An empty session id
/// short-circuits to an empty transcript without contacting the backend,
/// and so does a session the backend does not know.
pub async fn get_history(
    State(state): State<AppState>,
    Json(request): Json<HistoryRequest>,
) -> Result<Json<HistoryResponse>, GatewayError> {
    if request.session_id.is_empty() {
        return Ok(Json(HistoryResponse {
            history: Vec::new(),
        }));
    }

    validate_identifier("agent_name", &request.agent_name)?;
    validate_identifier("user_id", &request.user_id)?;
    validate_identifier("session_id", &request.session_id)?;

    let base_url = state
        .registry
        .resolve(&request.agent_name)
        .ok_or_else(|| GatewayError::UnknownAgent(request.agent_name.clone()))?;

    info!(
        "History request for agent {} (user {}, session {})",
        request.agent_name, request.user_id, request.session_id
    );

    let history = match state
        .runtime
        .fetch_session(
            base_url,
            &request.agent_name,
            &request.user_id,
            &request.session_id,
        )
        .await?
    {
        Some(dump) => events::normalize_history(&dump.events),
        None => Vec::new(),
    };

    Ok(Json(HistoryResponse { history }))
}

/// GET /agents
pub async fn list_agents(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "agents": state.registry.names() }))
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "agents": state.registry.names()
    }))
}
