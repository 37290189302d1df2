//! MCP client: manages one server session.
//!
//! Handles the protocol handshake (initialize + initialized notification),
//! tool discovery (tools/list), and tool invocation (tools/call).

use crate::config::McpServerConfig;
use crate::error::{McpError, McpErrorKind};
use crate::frame::{self, BodyShape};
use crate::jsonrpc::Envelope;
use crate::tool::{Tool, ToolCall, ToolResult};
use crate::transport::{Transport, build_transport};
use serde::Deserialize;
use std::sync::{Arc, Mutex, PoisonError};

/// MCP protocol version we support.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name reported in `clientInfo`.
const CLIENT_NAME: &str = "tether";

/// Lifecycle of a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl ClientState {
    pub fn as_str(self) -> &'static str {
        match self {
            ClientState::Uninitialized => "uninitialized",
            ClientState::Initializing => "initializing",
            ClientState::Ready => "ready",
            ClientState::Failed => "failed",
        }
    }
}

#[derive(Deserialize)]
struct ToolsListResult {
    tools: Vec<Tool>,
}

/// Client for a single MCP server.
///
/// Request ids come from a per-client counter. The counter is bumped and the
/// envelope sent while holding one async lock, so a client shared between
/// tasks never has two requests in flight.
pub struct McpClient {
    transport: Arc<dyn Transport>,
    state: Mutex<ClientState>,
    last_id: tokio::sync::Mutex<u64>,
}

impl McpClient {
    /// Create a client over an existing transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            state: Mutex::new(ClientState::Uninitialized),
            last_id: tokio::sync::Mutex::new(0),
        }
    }

    /// Create a client for a configured server. No network traffic happens
    /// until [`McpClient::initialize`].
    pub fn connect(config: &McpServerConfig) -> Result<Self, McpError> {
        Ok(Self::new(build_transport(config)?))
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    pub fn state(&self) -> ClientState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: ClientState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    fn require_ready(&self, operation: &'static str) -> Result<(), McpError> {
        match self.state() {
            ClientState::Ready => Ok(()),
            state => Err(McpError::InvalidState {
                operation,
                state: state.as_str(),
            }),
        }
    }

    /// Perform the handshake. Allowed only once, from `Uninitialized`.
    pub async fn initialize(&self) -> Result<(), McpError> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state != ClientState::Uninitialized {
                return Err(McpError::InvalidState {
                    operation: "initialize",
                    state: state.as_str(),
                });
            }
            *state = ClientState::Initializing;
        }

        let mut guard = HandshakeGuard {
            client: self,
            completed: false,
        };
        match self.handshake().await {
            Ok(()) => {
                guard.completed = true;
                self.set_state(ClientState::Ready);
                tracing::info!("MCP server {} initialized", self.endpoint());
                Ok(())
            }
            Err(e) => {
                tracing::warn!("MCP handshake with {} failed: {e}", self.endpoint());
                Err(e)
            }
        }
    }

    async fn handshake(&self) -> Result<(), McpError> {
        let init_params = serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": true }
            },
            "clientInfo": {
                "name": CLIENT_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        });

        let result = self.send_request("initialize", Some(init_params)).await?;
        tracing::debug!(
            server_info = %result.get("serverInfo").unwrap_or(&serde_json::Value::Null),
            "initialize acknowledged"
        );

        self.send_notification("notifications/initialized", Some(serde_json::json!({})))
            .await
    }

    /// Discover the tools this server exposes.
    pub async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
        self.require_ready("list tools")?;
        let result = self
            .send_request("tools/list", Some(serde_json::json!({})))
            .await?;
        let list: ToolsListResult = serde_json::from_value(result)
            .map_err(|e| McpError::Decoding(format!("tools/list result: {e}")))?;
        Ok(list.tools)
    }

    /// Call a tool on this server.
    pub async fn call_tool(&self, call: &ToolCall) -> Result<ToolResult, McpError> {
        self.require_ready("call tools")?;
        let params = serde_json::to_value(call)?;
        let result = self.send_request("tools/call", Some(params)).await?;
        serde_json::from_value(result)
            .map_err(|e| McpError::Decoding(format!("tools/call result: {e}")))
    }

    async fn send_request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, McpError> {
        let mut last_id = self.last_id.lock().await;
        *last_id += 1;
        let request = Envelope::request(*last_id, method, params);
        let response = self.transport.send(&request).await?;
        response.into_result()
    }

    /// Send a notification. Only an embedded JSON-RPC error in the reply
    /// fails it; an unparseable body or a non-2xx status is ignored.
    async fn send_notification(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<(), McpError> {
        let _guard = self.last_id.lock().await;
        let notification = Envelope::notification(method, params);
        match self.transport.send(&notification).await {
            Ok(reply) => match reply.error {
                Some(err) => Err(err.into()),
                None => Ok(()),
            },
            Err(e) if e.kind() == McpErrorKind::Decoding => {
                tracing::debug!("ignoring unparseable reply to {method}: {e}");
                Ok(())
            }
            Err(McpError::Http { status, body }) => match embedded_error(&body) {
                Some(err) => Err(err),
                None => {
                    tracing::debug!("ignoring HTTP {status} reply to {method}");
                    Ok(())
                }
            },
            Err(e) => Err(e),
        }
    }
}

/// Marks the client `Failed` unless the handshake ran to completion,
/// including when the `initialize` future is dropped midway.
struct HandshakeGuard<'a> {
    client: &'a McpClient,
    completed: bool,
}

impl Drop for HandshakeGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.client.set_state(ClientState::Failed);
        }
    }
}

/// The JSON-RPC error carried by a rejected reply body, if it has one.
fn embedded_error(body: &str) -> Option<McpError> {
    let envelope = match BodyShape::classify(body) {
        BodyShape::Empty => return None,
        BodyShape::Json => frame::decode_json(body),
        BodyShape::EventStream => frame::decode_event_stream(body, None),
    };
    envelope.ok()?.error.map(McpError::from)
}
