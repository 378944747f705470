use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use agent_gateway::config::Config;
use agent_gateway::routes;
use agent_gateway::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("agent_gateway=debug,tower_http=debug")
        .init();

    // Load configuration - try multiple paths
    let config_paths: Vec<String> = vec![
        std::env::var("CONFIG_PATH").ok(),
        Some("config.json".to_string()),
        Some("config.yaml".to_string()),
        Some("config/gateway.json".to_string()),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut config = None;
    let mut loaded_path = String::new();

    for path in &config_paths {
        match Config::load(path) {
            Ok(cfg) => {
                config = Some(cfg);
                loaded_path = path.clone();
                break;
            }
            Err(e) => {
                tracing::debug!("Failed to load config from {}: {}", path, e);
                continue;
            }
        }
    }

    let config = config.ok_or_else(|| {
        anyhow::anyhow!("Could not find config file. Tried: {:?}", config_paths)
    })?;

    info!("Loaded configuration from: {}", loaded_path);

    let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
    let app_state = AppState::new(config, &environment)?;

    if app_state.registry.is_empty() {
        warn!("Agent registry is empty; every turn request will fail as unknown_agent");
    } else {
        info!(
            "Registered {} agents for environment '{}'",
            app_state.registry.len(),
            environment
        );
    }

    // Build application
    let app = Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state.clone());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], app_state.config.system_config.port));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
