use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;

use anyhow::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system_config: SystemConfig,
    pub agent_config: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Session creation is a cheap metadata operation.
    #[serde(default = "default_session_timeout")]
    pub session_timeout_secs: u64,
    /// Turn dispatch waits on inference and gets the longest budget.
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,
    #[serde(default = "default_history_timeout")]
    pub history_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_session_timeout() -> u64 {
    10
}

fn default_run_timeout() -> u64 {
    60
}

fn default_history_timeout() -> u64 {
    30
}

/// Which agents exist and where their runtime lives, per environment.
/// All agents of one environment share a single runtime base URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentConfig>,
    #[serde(default)]
    pub agents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub runtime_url: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;

        // Determine file type by extension
        let path_lower = path.to_lowercase();
        if path_lower.ends_with(".yaml") || path_lower.ends_with(".yml") {
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        }
    }

    /// Build the agent registry for one environment. Every configured agent
    /// name maps to that environment's runtime base URL.
    pub fn registry(&self, environment: &str) -> Result<AgentRegistry> {
        let env = self
            .agent_config
            .environments
            .get(environment)
            .ok_or_else(|| {
                anyhow::anyhow!("environment '{}' not present in config", environment)
            })?;
        let base_url = env.runtime_url.trim_end_matches('/').to_string();

        Ok(self
            .agent_config
            .agents
            .iter()
            .map(|name| (name.clone(), base_url.clone()))
            .collect())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            system_config: SystemConfig::default(),
            agent_config: AgentConfig::default(),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_timeout_secs: default_session_timeout(),
            run_timeout_secs: default_run_timeout(),
            history_timeout_secs: default_history_timeout(),
        }
    }
}

/// Maps agent names to runtime base URLs. Resolution happens before any
/// network call; an unresolved name never reaches the backend.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<String, String>,
}

impl AgentRegistry {
    pub fn resolve(&self, agent_name: &str) -> Option<&str> {
        self.agents.get(agent_name).map(String::as_str)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl FromIterator<(String, String)> for AgentRegistry {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            agents: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_config(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn test_default_system_config() {
        let system = SystemConfig::default();
        assert_eq!(system.host, "0.0.0.0");
        assert_eq!(system.port, 8080);
        assert_eq!(system.session_timeout_secs, 10);
        assert_eq!(system.run_timeout_secs, 60);
        assert_eq!(system.history_timeout_secs, 30);
    }

    #[test]
    fn test_load_json() {
        let file = temp_config(
            ".json",
            r#"{
                "system_config": {"port": 9090},
                "agent_config": {
                    "environments": {"local": {"runtime_url": "http://localhost:8000/"}},
                    "agents": ["greeting_agent", "calc_agent"]
                }
            }"#,
        );

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.system_config.port, 9090);
        assert_eq!(config.system_config.host, "0.0.0.0"); // default
        assert_eq!(config.agent_config.agents.len(), 2);

        let registry = config.registry("local").unwrap();
        assert_eq!(registry.len(), 2);
        // trailing slash trimmed
        assert_eq!(
            registry.resolve("greeting_agent"),
            Some("http://localhost:8000")
        );
        assert_eq!(registry.resolve("unknown_agent"), None);
    }

    #[test]
    fn test_load_yaml() {
        let file = temp_config(
            ".yaml",
            r#"
system_config:
  port: 3000
  run_timeout_secs: 120
agent_config:
  environments:
    staging:
      runtime_url: "http://runtime.staging:8000"
  agents:
    - jarvis_agent
"#,
        );

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.system_config.port, 3000);
        assert_eq!(config.system_config.run_timeout_secs, 120);
        assert_eq!(config.system_config.session_timeout_secs, 10); // default

        let registry = config.registry("staging").unwrap();
        assert_eq!(
            registry.resolve("jarvis_agent"),
            Some("http://runtime.staging:8000")
        );
    }

    #[test]
    fn test_unknown_environment_is_an_error() {
        let file = temp_config(
            ".json",
            r#"{
                "agent_config": {
                    "environments": {"local": {"runtime_url": "http://localhost:8000"}},
                    "agents": ["greeting_agent"]
                }
            }"#,
        );

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        let result = config.registry("production");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("production"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Config::load("does-not-exist.json").is_err());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let file = temp_config(".json", "{not json");
        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_registry_names_are_sorted() {
        let registry: AgentRegistry = [
            ("b_agent".to_string(), "http://x".to_string()),
            ("a_agent".to_string(), "http://x".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(registry.names(), vec!["a_agent", "b_agent"]);
    }
}
