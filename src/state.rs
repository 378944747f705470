use std::sync::Arc;

use crate::config::{AgentRegistry, Config};
use crate::runtime::RuntimeClient;

/// Shared, immutable per-process state. All conversation state lives in the
/// backend runtimes; nothing here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: Arc<AgentRegistry>,
    pub runtime: Arc<RuntimeClient>,
}

impl AppState {
    pub fn new(config: Config, environment: &str) -> anyhow::Result<Self> {
        let registry = Arc::new(config.registry(environment)?);
        let runtime = Arc::new(RuntimeClient::new(&config.system_config));

        Ok(Self {
            config,
            registry,
            runtime,
        })
    }
}
