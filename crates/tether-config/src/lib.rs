//! Layered TOML configuration for Tether.
//!
//! Reads configuration from multiple sources with precedence:
//! CLI flags > env vars > config file > defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tether_mcp::McpConfig;
use tether_types::ConfigError;

/// The default Anthropic API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.anthropic.com";

/// The default model to use.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// The default max tokens for a response.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// The default timeout for one model request, in milliseconds.
pub const DEFAULT_API_TIMEOUT_MS: u64 = 300_000;

/// The default cap on model calls per exchange.
pub const DEFAULT_MAX_TURNS: usize = 25;

/// Name of the settings file inside the config directory.
pub const SETTINGS_FILE: &str = "config.toml";

/// Resolved configuration for a Tether session.
#[derive(Debug, Clone)]
pub struct TetherConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub api_base_url: String,
    pub api_timeout_ms: u64,
    pub instruction: Option<String>,
    pub max_turns: usize,
    pub mcp: McpConfig,
    pub config_dir: PathBuf,
}

/// Settings that can be read from a TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub mcp: McpConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentSettings {
    /// System instruction sent with every exchange.
    pub instruction: Option<String>,
    pub max_turns: Option<usize>,
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub max_turns: Option<usize>,
}

/// Environment variables consulted during resolution.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_base_url: Option<String>,
}

impl EnvOverrides {
    /// Read `ANTHROPIC_API_KEY`, `TETHER_MODEL` and `ANTHROPIC_API_BASE_URL`.
    pub fn from_process() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            api_key: var("ANTHROPIC_API_KEY"),
            model: var("TETHER_MODEL"),
            api_base_url: var("ANTHROPIC_API_BASE_URL"),
        }
    }
}

impl TetherConfig {
    /// Load configuration from all sources, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables
    /// 3. Config file (~/.tether/config.toml)
    /// 4. Defaults
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let config_dir = config_dir();
        let settings = load_settings_file(&config_dir.join(SETTINGS_FILE));
        Self::resolve(overrides, EnvOverrides::from_process(), settings, config_dir)
    }

    /// Path of the settings file this configuration was loaded from.
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    /// Merge already-gathered sources.
    pub fn resolve(
        overrides: CliOverrides,
        env: EnvOverrides,
        settings: SettingsFile,
        config_dir: PathBuf,
    ) -> Result<Self, ConfigError> {
        let api_key = overrides
            .api_key
            .or(env.api_key)
            .or(settings.api.api_key)
            .ok_or_else(|| ConfigError::MissingKey {
                key: "api_key (set ANTHROPIC_API_KEY or add to ~/.tether/config.toml)".into(),
            })?;

        let model = overrides
            .model
            .or(env.model)
            .or(settings.api.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_tokens = overrides
            .max_tokens
            .or(settings.api.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let api_base_url = env
            .api_base_url
            .or(settings.api.base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let api_timeout_ms = settings.api.timeout_ms.unwrap_or(DEFAULT_API_TIMEOUT_MS);

        let max_turns = overrides
            .max_turns
            .or(settings.agent.max_turns)
            .unwrap_or(DEFAULT_MAX_TURNS);

        let config = TetherConfig {
            api_key,
            model,
            max_tokens,
            api_base_url,
            api_timeout_ms,
            instruction: settings.agent.instruction,
            max_turns,
            mcp: settings.mcp,
            config_dir,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens == 0 {
            return Err(invalid("api.max_tokens", "must be greater than zero"));
        }
        if self.api_timeout_ms == 0 {
            return Err(invalid("api.timeout_ms", "must be greater than zero"));
        }
        if self.max_turns == 0 {
            return Err(invalid("agent.max_turns", "must be greater than zero"));
        }
        for group in &self.mcp.groups {
            if group.name.trim().is_empty() {
                return Err(invalid("mcp.groups.name", "must not be empty"));
            }
            for server in &group.servers {
                if server.url.trim().is_empty() {
                    return Err(invalid(
                        "mcp.groups.servers.url",
                        &format!("group '{}' has a server without a url", group.name),
                    ));
                }
                if server.timeout_ms == 0 {
                    return Err(invalid(
                        "mcp.groups.servers.timeout_ms",
                        &format!("must be greater than zero for {}", server.url),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Get the Tether config directory path (~/.tether/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TETHER_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tether")
}

/// Load and parse a TOML settings file, returning defaults on any error.
fn load_settings_file(path: &Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            SettingsFile::default()
        }),
        Err(_) => SettingsFile::default(),
    }
}
