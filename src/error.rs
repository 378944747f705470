use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the gateway.
///
/// Every variant carries a stable machine-readable kind and maps to an HTTP
/// status class; handlers bubble these up with `?` and axum renders them as
/// structured JSON. Nothing is retried automatically anywhere.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A path-embedded identifier failed validation.
    #[error("invalid {field}: {value:?}")]
    InvalidIdentifier { field: &'static str, value: String },

    /// Requested agent name is not in the registry.
    #[error("agent '{0}' not found")]
    UnknownAgent(String),

    /// Backend rejected or failed session creation.
    #[error("session creation failed with status {status}: {body}")]
    SessionCreationFailed { status: u16, body: String },

    /// Backend rejected or failed the turn dispatch.
    #[error("agent run failed with status {status}: {body}")]
    DispatchFailed { status: u16, body: String },

    /// The turn dispatch did not complete within its budget.
    #[error("agent run timed out after {0}s")]
    DispatchTimeout(u64),

    /// Backend history lookup failed for a reason other than not-found.
    #[error("history fetch failed with status {status}: {body}")]
    HistoryFetchFailed { status: u16, body: String },

    /// Backend returned a success status with a body that does not decode
    /// as the expected event structure.
    #[error("malformed backend response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// Network-level failure talking to the backend.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier { .. } => "invalid_request",
            Self::UnknownAgent(_) => "unknown_agent",
            Self::SessionCreationFailed { .. } => "session_creation_failed",
            Self::DispatchFailed { .. } | Self::DispatchTimeout(_) => "dispatch_failed",
            Self::HistoryFetchFailed { .. } => "history_fetch_failed",
            Self::MalformedResponse(_) => "malformed_backend_response",
            Self::Transport(_) => "transport_failure",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidIdentifier { .. } => StatusCode::BAD_REQUEST,
            Self::UnknownAgent(_) => StatusCode::NOT_FOUND,
            Self::DispatchTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}: {}", self.kind(), self);
        } else {
            tracing::warn!("{}: {}", self.kind(), self);
        }
        let body = Json(json!({
            "error": self.kind(),
            "detail": self.to_string(),
        }));
        (status, body).into_response()
    }
}
