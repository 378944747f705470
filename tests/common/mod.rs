//! Common test utilities: a stub agent runtime and a gateway wired to it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use agent_gateway::config::{AgentRegistry, Config, SystemConfig};
use agent_gateway::routes;
use agent_gateway::runtime::RuntimeClient;
use agent_gateway::state::AppState;

pub const TEST_AGENT: &str = "greeting_agent";

/// Canned responses for the stub runtime.
#[derive(Clone)]
pub struct StubConfig {
    pub create_status: StatusCode,
    pub run_status: StatusCode,
    pub run_body: String,
    pub history_status: StatusCode,
    pub history_body: String,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            create_status: StatusCode::OK,
            run_status: StatusCode::OK,
            run_body: json!([
                {"author": "USER", "content": {"role": "user", "parts": [{"text": "hi"}]}},
                {"author": "MODEL", "content": {"role": "model", "parts": [{"text": "hello"}]}}
            ])
            .to_string(),
            history_status: StatusCode::OK,
            history_body: json!({
                "id": "session-fixed",
                "events": [
                    {"author": "USER", "content": {"role": "user", "parts": [{"text": "q"}]}},
                    {"author": "SYSTEM", "content": {"role": "system", "parts": [{"text": "boot"}]}},
                    {"author": "MODEL", "content": {"role": "model", "parts": [{"text": "a"}]}}
                ]
            })
            .to_string(),
        }
    }
}

/// Observed backend traffic, for asserting which calls were (not) made.
#[derive(Clone, Default)]
pub struct StubCounters {
    pub session_creates: Arc<AtomicUsize>,
    pub runs: Arc<AtomicUsize>,
    pub history_fetches: Arc<AtomicUsize>,
}

impl StubCounters {
    pub fn created(&self) -> usize {
        self.session_creates.load(Ordering::SeqCst)
    }

    pub fn ran(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn fetched(&self) -> usize {
        self.history_fetches.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct StubState {
    config: StubConfig,
    counters: StubCounters,
}

/// Start a stub agent runtime on an ephemeral port and return its base URL
/// together with its call counters.
pub async fn spawn_stub_runtime(config: StubConfig) -> (String, StubCounters) {
    let counters = StubCounters::default();
    let state = StubState {
        config,
        counters: counters.clone(),
    };

    let app = Router::new()
        .route(
            "/apps/:app/users/:user/sessions/:session",
            post(stub_create_session).get(stub_fetch_session),
        )
        .route("/run", post(stub_run))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), counters)
}

async fn stub_create_session(
    State(state): State<StubState>,
    Path((_app, _user, _session)): Path<(String, String, String)>,
) -> impl IntoResponse {
    state.counters.session_creates.fetch_add(1, Ordering::SeqCst);
    (state.config.create_status, Json(json!({})))
}

async fn stub_run(State(state): State<StubState>) -> impl IntoResponse {
    state.counters.runs.fetch_add(1, Ordering::SeqCst);
    (state.config.run_status, state.config.run_body.clone())
}

async fn stub_fetch_session(
    State(state): State<StubState>,
    Path((_app, _user, _session)): Path<(String, String, String)>,
) -> impl IntoResponse {
    state.counters.history_fetches.fetch_add(1, Ordering::SeqCst);
    (state.config.history_status, state.config.history_body.clone())
}

/// Create a gateway app with [`TEST_AGENT`] registered against the given
/// runtime URL.
pub fn gateway_app(runtime_url: &str) -> Router {
    let registry: AgentRegistry = [(
        TEST_AGENT.to_string(),
        runtime_url.trim_end_matches('/').to_string(),
    )]
    .into_iter()
    .collect();

    let state = AppState {
        config: Config::default(),
        registry: Arc::new(registry),
        runtime: Arc::new(RuntimeClient::new(&SystemConfig::default())),
    };

    Router::new().merge(routes::create_routes()).with_state(state)
}
