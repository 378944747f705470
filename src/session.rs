use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::runtime::RuntimeClient;

/// Generate a fresh session identifier.
///
/// Format: session-{YYYYmmddHHMMSS}-{uuid}. The timestamp prefix keeps
/// identifiers sortable; the uuid suffix keeps concurrent creations for the
/// same user within the same second from colliding.
pub fn new_session_id() -> String {
    format!(
        "session-{}-{}",
        Utc::now().format("%Y%m%d%H%M%S"),
        Uuid::new_v4().as_simple()
    )
}

/// Return a usable session identifier for this turn.
///
/// A caller-supplied identifier is trusted and returned unchanged without
/// any network call. Otherwise a new identifier is generated and registered
/// with the backend; creation failure propagates, with no retry.
pub async fn ensure_session(
    runtime: &RuntimeClient,
    base_url: &str,
    agent_name: &str,
    user_id: &str,
    existing: Option<String>,
) -> Result<String, GatewayError> {
    if let Some(id) = existing.filter(|id| !id.is_empty()) {
        return Ok(id);
    }

    let session_id = new_session_id();
    runtime
        .create_session(base_url, agent_name, user_id, &session_id)
        .await?;
    info!(
        "Created session {} for agent {} (user {})",
        session_id, agent_name, user_id
    );
    Ok(session_id)
}
