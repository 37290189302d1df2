//! MCP (Model Context Protocol) client implementation for Tether.
//!
//! Talks to remote tool servers over HTTP. Each request is one JSON-RPC 2.0
//! envelope POSTed to the server; replies arrive either as a bare JSON body or
//! framed as a Server-Sent Events stream. Clients are grouped into action
//! groups whose tools are resolved by name through a [`ToolRegistry`].

pub mod client;
pub mod config;
pub mod error;
pub mod frame;
pub mod jsonrpc;
pub mod registry;
pub mod tool;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use client::{ClientState, McpClient};
pub use config::{ActionGroupConfig, McpConfig, McpServerConfig, TransportKind};
pub use error::{McpError, McpErrorKind};
pub use jsonrpc::{Envelope, JsonRpcError};
pub use registry::{ActionGroup, ToolRegistry};
pub use tool::{Tool, ToolCall, ToolContent, ToolResult};
pub use transport::{HttpTransport, SseTransport, Transport, build_transport};
