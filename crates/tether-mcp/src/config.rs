//! Configuration types for tool servers and action groups.

use serde::{Deserialize, Serialize};

fn default_timeout() -> u64 {
    30000
}

/// Top-level MCP configuration: action groups in registration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default)]
    pub groups: Vec<ActionGroupConfig>,
}

/// A named set of tool servers whose tools are advertised together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionGroupConfig {
    pub name: String,
    #[serde(default)]
    pub servers: Vec<McpServerConfig>,
}

/// How a tool server frames its HTTP responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Plain JSON bodies only.
    Json,
    /// Streamable HTTP: SSE-framed or plain JSON bodies.
    #[default]
    Sse,
}

/// Connection settings for a single tool server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Endpoint receiving JSON-RPC POSTs (e.g., "http://localhost:3001/mcp").
    pub url: String,
    /// Response framing (default: sse).
    #[serde(default)]
    pub transport: TransportKind,
    /// Timeout for each request in milliseconds (default: 30000).
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

impl McpServerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            transport: TransportKind::default(),
            timeout_ms: default_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_group() {
        let toml_str = r#"
[[groups]]
name = "SampleActionGroup"

[[groups.servers]]
url = "http://localhost:3001/mcp"
"#;
        let config: McpConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.groups.len(), 1);
        let group = &config.groups[0];
        assert_eq!(group.name, "SampleActionGroup");
        assert_eq!(group.servers[0].url, "http://localhost:3001/mcp");
        assert_eq!(group.servers[0].transport, TransportKind::Sse);
        assert_eq!(group.servers[0].timeout_ms, 30000);
    }

    #[test]
    fn parse_groups_keep_order_and_overrides() {
        let toml_str = r#"
[[groups]]
name = "time"

[[groups.servers]]
url = "http://localhost:3001/mcp"
transport = "json"
timeout_ms = 5000

[[groups]]
name = "clusters"

[[groups.servers]]
url = "http://localhost:3002/mcp"

[[groups.servers]]
url = "http://localhost:3003/mcp"
"#;
        let config: McpConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.groups.len(), 2);
        assert_eq!(config.groups[0].name, "time");
        assert_eq!(config.groups[0].servers[0].transport, TransportKind::Json);
        assert_eq!(config.groups[0].servers[0].timeout_ms, 5000);
        assert_eq!(config.groups[1].servers.len(), 2);
    }

    #[test]
    fn unknown_transport_is_rejected() {
        let toml_str = r#"
[[groups]]
name = "x"

[[groups.servers]]
url = "http://localhost:3001/mcp"
transport = "stdio"
"#;
        assert!(toml::from_str::<McpConfig>(toml_str).is_err());
    }

    #[test]
    fn default_config_is_empty() {
        let config = McpConfig::default();
        assert!(config.groups.is_empty());
    }
}
