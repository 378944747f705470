use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Turn and history endpoints
        .route("/run_agent", post(handlers::run_agent))
        .route("/get_history", post(handlers::get_history))
        // Discovery
        .route("/agents", get(handlers::list_agents))
        .route("/health", get(handlers::health_check))
}
