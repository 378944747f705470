use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SystemConfig;
use crate::error::GatewayError;
use crate::events::Event;

/// HTTP client for a backend agent runtime.
///
/// One instance is shared by every request; the base URL is passed per call
/// because different agents may resolve to different runtimes. Per-call
/// timeouts separate cheap session metadata operations from long-running
/// inference.
#[derive(Debug, Clone)]
pub struct RuntimeClient {
    client: Client,
    session_timeout: Duration,
    run_timeout: Duration,
    history_timeout: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunRequest {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
    pub new_message: NewMessage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewMessage {
    pub role: String,
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessagePart {
    pub text: String,
}

/// A session record as returned by the runtime's session endpoint. Only the
/// event log matters to the gateway.
#[derive(Debug, Deserialize)]
pub struct SessionDump {
    #[serde(default)]
    pub events: Vec<Event>,
}

impl RuntimeClient {
    pub fn new(system: &SystemConfig) -> Self {
        Self {
            client: Client::new(),
            session_timeout: Duration::from_secs(system.session_timeout_secs),
            run_timeout: Duration::from_secs(system.run_timeout_secs),
            history_timeout: Duration::from_secs(system.history_timeout_secs),
        }
    }

    /// Create a backend session keyed by (agent, user, session id). Any 2xx
    /// counts as success; the runtime owns the session from here on.
    pub async fn create_session(
        &self,
        base_url: &str,
        agent_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<(), GatewayError> {
        let url = session_url(base_url, agent_name, user_id, session_id);
        debug!("Creating session: POST {}", url);

        let response = self
            .client
            .post(&url)
            .timeout(self.session_timeout)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::SessionCreationFailed {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    /// Dispatch one user turn into an existing session and return the raw
    /// event log the runtime produced for it. Not idempotent: re-sending
    /// may duplicate the turn in the backend's log.
    pub async fn run(
        &self,
        base_url: &str,
        agent_name: &str,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> Result<Vec<Event>, GatewayError> {
        let url = format!("{}/run", base_url);
        let request = RunRequest {
            app_name: agent_name.to_string(),
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            new_message: NewMessage {
                role: "user".to_string(),
                parts: vec![MessagePart {
                    text: message.to_string(),
                }],
            },
        };
        debug!("Dispatching turn: POST {} (session {})", url, session_id);

        let response = self
            .client
            .post(&url)
            .timeout(self.run_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::DispatchTimeout(self.run_timeout.as_secs())
                } else {
                    GatewayError::Transport(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::DispatchFailed {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(GatewayError::MalformedResponse)
    }

    /// Fetch the full session record for history reconstruction. A 404
    /// means the session does not exist, reported as `Ok(None)` — a session
    /// with no history is not an error.
    pub async fn fetch_session(
        &self,
        base_url: &str,
        agent_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<SessionDump>, GatewayError> {
        let url = session_url(base_url, agent_name, user_id, session_id);
        debug!("Fetching session: GET {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.history_timeout)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("Session {} not found at runtime", session_id);
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::HistoryFetchFailed {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let dump = serde_json::from_str(&body).map_err(GatewayError::MalformedResponse)?;
        Ok(Some(dump))
    }
}

fn session_url(base_url: &str, agent_name: &str, user_id: &str, session_id: &str) -> String {
    format!(
        "{}/apps/{}/users/{}/sessions/{}",
        base_url, agent_name, user_id, session_id
    )
}
