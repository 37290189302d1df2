//! Action groups and the tool registry.
//!
//! An action group is a named set of initialized clients together with the
//! tools they advertised. The registry holds groups in registration order and
//! resolves tool names by first match: groups are scanned in the order they
//! were added, tools within a group in the order servers advertised them.
//! A later tool with a duplicate name is unreachable.

use crate::client::McpClient;
use crate::config::{ActionGroupConfig, McpConfig};
use crate::error::McpError;
use crate::tool::{Tool, ToolCall, ToolResult};
use std::sync::Arc;
use tether_types::ToolDefinition;

/// A tool together with the index of the member client that advertised it.
#[derive(Debug, Clone)]
struct GroupTool {
    tool: Tool,
    owner: usize,
}

/// A named set of tool servers, fully initialized.
pub struct ActionGroup {
    name: String,
    clients: Vec<Arc<McpClient>>,
    tools: Vec<GroupTool>,
}

impl ActionGroup {
    /// Initialize every client in order and collect its tools.
    ///
    /// Any failure aborts construction and no group is returned.
    pub async fn build(
        name: impl Into<String>,
        clients: Vec<Arc<McpClient>>,
    ) -> Result<Self, McpError> {
        let name = name.into();
        let mut tools = Vec::new();

        for (owner, client) in clients.iter().enumerate() {
            client.initialize().await?;
            let advertised = client.list_tools().await?;
            tracing::debug!(
                group = %name,
                endpoint = client.endpoint(),
                count = advertised.len(),
                "discovered tools"
            );
            tools.extend(advertised.into_iter().map(|tool| GroupTool { tool, owner }));
        }

        tracing::info!(
            "Action group '{}' ready ({} servers, {} tools)",
            name,
            clients.len(),
            tools.len()
        );

        Ok(Self {
            name,
            clients,
            tools,
        })
    }

    /// Connect to every server in a group config and build the group.
    pub async fn from_config(config: &ActionGroupConfig) -> Result<Self, McpError> {
        let clients = config
            .servers
            .iter()
            .map(|server| McpClient::connect(server).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;
        Self::build(config.name.clone(), clients).await
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tools in advertisement order.
    pub fn tools(&self) -> impl Iterator<Item = &Tool> {
        self.tools.iter().map(|t| &t.tool)
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    fn owner_of(&self, tool_name: &str) -> Option<&Arc<McpClient>> {
        self.tools
            .iter()
            .find(|t| t.tool.name == tool_name)
            .and_then(|t| self.clients.get(t.owner))
    }
}

/// All action groups available to an orchestrator. Read-only once built.
#[derive(Default)]
pub struct ToolRegistry {
    groups: Vec<ActionGroup>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured group. The first failing group aborts.
    pub async fn connect(config: &McpConfig) -> Result<Self, McpError> {
        let mut registry = Self::new();
        for group_config in &config.groups {
            let group = ActionGroup::from_config(group_config).await.inspect_err(|e| {
                tracing::warn!("Failed to build action group '{}': {}", group_config.name, e);
            })?;
            registry.add_group(group);
        }
        Ok(registry)
    }

    pub fn add_group(&mut self, group: ActionGroup) {
        self.groups.push(group);
    }

    /// The client owning the first tool named `name`, if any.
    pub fn find_client_for_tool(&self, name: &str) -> Option<Arc<McpClient>> {
        self.groups
            .iter()
            .find_map(|g| g.owner_of(name))
            .cloned()
    }

    /// Every tool projected for the model, in resolution order.
    pub fn catalogue(&self) -> Vec<ToolDefinition> {
        self.groups
            .iter()
            .flat_map(ActionGroup::tools)
            .map(Tool::definition)
            .collect()
    }

    /// Resolve a tool by name and call it.
    pub async fn call_tool(&self, call: &ToolCall) -> Result<ToolResult, McpError> {
        let client = self
            .find_client_for_tool(&call.name)
            .ok_or_else(|| McpError::ToolNotFound {
                name: call.name.clone(),
            })?;
        client.call_tool(call).await
    }

    /// `(group name, tool count)` for each group.
    pub fn group_summary(&self) -> Vec<(&str, usize)> {
        self.groups
            .iter()
            .map(|g| (g.name(), g.tool_count()))
            .collect()
    }

    pub fn tool_count(&self) -> usize {
        self.groups.iter().map(ActionGroup::tool_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tool_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientState;
    use crate::error::McpErrorKind;
    use crate::test_support::StubTransport;
    use crate::transport::Transport;

    fn client(stub: &Arc<StubTransport>) -> Arc<McpClient> {
        Arc::new(McpClient::new(Arc::clone(stub) as Arc<dyn Transport>))
    }

    #[tokio::test]
    async fn build_initializes_and_lists_each_client() {
        let a = Arc::new(StubTransport::with_tools(&["time"]));
        let b = Arc::new(StubTransport::with_tools(&["echo", "list"]));
        let group = ActionGroup::build("sample", vec![client(&a), client(&b)])
            .await
            .unwrap();

        assert_eq!(group.name(), "sample");
        let names: Vec<&str> = group.tools().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["time", "echo", "list"]);
        for stub in [&a, &b] {
            assert_eq!(
                stub.sent_methods(),
                vec!["initialize", "notifications/initialized", "tools/list"]
            );
        }
    }

    #[tokio::test]
    async fn build_fails_when_any_client_fails() {
        let good = Arc::new(StubTransport::with_tools(&["time"]));
        let bad = Arc::new(StubTransport::new(|_| {
            Err(McpError::Network("connection refused".into()))
        }));
        let good_client = client(&good);
        let err = ActionGroup::build("broken", vec![Arc::clone(&good_client), client(&bad)])
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), McpErrorKind::Transport);
        assert_eq!(good_client.state(), ClientState::Ready);
    }

    #[tokio::test]
    async fn first_registered_owner_wins() {
        let first = Arc::new(StubTransport::with_tools(&["echo"]));
        let second = Arc::new(StubTransport::with_tools(&["echo", "time"]));
        let first_client = client(&first);
        let second_client = client(&second);

        let mut registry = ToolRegistry::new();
        registry.add_group(
            ActionGroup::build("one", vec![Arc::clone(&first_client)])
                .await
                .unwrap(),
        );
        registry.add_group(
            ActionGroup::build("two", vec![Arc::clone(&second_client)])
                .await
                .unwrap(),
        );

        let owner = registry.find_client_for_tool("echo").unwrap();
        assert!(Arc::ptr_eq(&owner, &first_client));
        let owner = registry.find_client_for_tool("time").unwrap();
        assert!(Arc::ptr_eq(&owner, &second_client));
        assert!(registry.find_client_for_tool("missing").is_none());

        let names: Vec<String> = registry.catalogue().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["echo", "echo", "time"]);
        assert_eq!(registry.group_summary(), vec![("one", 1), ("two", 2)]);
        assert_eq!(registry.tool_count(), 3);
    }

    #[tokio::test]
    async fn call_tool_routes_to_owner() {
        let a = Arc::new(StubTransport::with_tools(&["time"]));
        let b = Arc::new(StubTransport::with_tools(&["echo"]));
        let mut registry = ToolRegistry::new();
        registry.add_group(
            ActionGroup::build("g", vec![client(&a), client(&b)])
                .await
                .unwrap(),
        );

        let result = registry
            .call_tool(&ToolCall::new("echo", &serde_json::json!({"text": "hi"})))
            .await
            .unwrap();
        assert_eq!(result.joined_text(), "echo ok");
        assert_eq!(b.sent_methods().last().map(String::as_str), Some("tools/call"));
        assert_eq!(a.sent_methods().last().map(String::as_str), Some("tools/list"));
    }

    #[tokio::test]
    async fn call_unknown_tool_is_not_found() {
        let registry = ToolRegistry::new();
        let err = registry
            .call_tool(&ToolCall::new("nope", &serde_json::json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Tool 'nope' not found");
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn empty_config_connects_no_groups() {
        let registry = ToolRegistry::connect(&McpConfig::default()).await.unwrap();
        assert!(registry.group_summary().is_empty());
        assert!(registry.catalogue().is_empty());
    }
}
