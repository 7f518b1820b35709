// ABOUTME: Configuration parsing from TOML file with environment variable overrides
// ABOUTME: Provides sensible defaults for every field and validates the result

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub presence: PresenceConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Data directory holding the identity database.
    #[serde(default = "default_workspace_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Seconds between membership polls per observer.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_name")]
    pub name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        WorkspaceConfig {
            path: default_workspace_path(),
        }
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        PresenceConfig {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        AssistantConfig {
            name: default_assistant_name(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workspace_path() -> String {
    crate::paths::data_dir().to_string_lossy().to_string()
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_assistant_name() -> String {
    crate::assistant::ASSISTANT_NAME.to_string()
}

impl Config {
    /// Load configuration from config.toml with environment variable overrides
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";
        let mut config = if Path::new(config_path).exists() {
            let content =
                std::fs::read_to_string(config_path).context("Failed to read config.toml")?;
            toml::from_str::<Config>(&content).context("Failed to parse config.toml")?
        } else {
            Config {
                server: ServerConfig::default(),
                workspace: WorkspaceConfig::default(),
                presence: PresenceConfig::default(),
                assistant: AssistantConfig::default(),
            }
        };

        // Override with environment variables if present
        if let Ok(val) = std::env::var("BURPLA_HOST") {
            config.server.host = val;
        }
        if let Ok(val) = std::env::var("BURPLA_PORT") {
            config.server.port = val
                .parse()
                .with_context(|| format!("BURPLA_PORT must be a valid port number, got: {}", val))?;
        }
        if let Ok(val) = std::env::var("WORKSPACE_PATH") {
            config.workspace.path = val;
        }
        if let Ok(val) = std::env::var("PRESENCE_POLL_SECS") {
            config.presence.poll_interval_secs = val.parse().with_context(|| {
                format!("PRESENCE_POLL_SECS must be a positive integer, got: {}", val)
            })?;
        }
        if let Ok(val) = std::env::var("ASSISTANT_NAME") {
            config.assistant.name = val;
        }

        // Validate
        if config.server.host.trim().is_empty() {
            anyhow::bail!("server.host must not be empty");
        }
        if config.presence.poll_interval_secs == 0 {
            anyhow::bail!("presence.poll_interval_secs must be at least 1");
        }
        if config.workspace.path.trim().is_empty() {
            anyhow::bail!("workspace.path must not be empty");
        }
        if config.assistant.name.trim().is_empty() {
            anyhow::bail!("assistant.name must not be empty");
        }

        Ok(config)
    }
}
