//! In-memory transport used by unit tests.

use crate::error::McpError;
use crate::jsonrpc::{Envelope, JsonRpcError};
use crate::transport::Transport;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

type Handler = Box<dyn Fn(&Envelope) -> Result<Envelope, McpError> + Send + Sync>;

/// A transport answering from a closure and recording every envelope sent.
pub struct StubTransport {
    handler: Handler,
    sent: Mutex<Vec<Envelope>>,
}

impl StubTransport {
    pub fn new(
        handler: impl Fn(&Envelope) -> Result<Envelope, McpError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// A well-behaved server advertising the named tools; `tools/call`
    /// answers `"<tool> ok"`.
    pub fn with_tools(names: &[&str]) -> Self {
        let tools: Vec<serde_json::Value> = names
            .iter()
            .map(|n| {
                serde_json::json!({
                    "name": n,
                    "description": format!("{n} tool"),
                    "inputSchema": {"type": "object"}
                })
            })
            .collect();
        Self::new(move |req| {
            let result = match req.method.as_deref() {
                Some("initialize") => serde_json::json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {"tools": {}},
                    "serverInfo": {"name": "stub", "version": "0.0.1"}
                }),
                Some("notifications/initialized") => return Ok(Envelope::null_result(None)),
                Some("tools/list") => serde_json::json!({ "tools": tools }),
                Some("tools/call") => {
                    let name = req.params.as_ref().and_then(|p| p["name"].as_str()).unwrap_or("");
                    serde_json::json!({
                        "content": [{"type": "text", "text": format!("{name} ok")}],
                        "isError": false
                    })
                }
                _ => {
                    return Ok(Envelope::failure(
                        req.id,
                        JsonRpcError {
                            code: -32601,
                            message: "Method not found".into(),
                            data: None,
                        },
                    ));
                }
            };
            Ok(Envelope::success(req.id, result))
        })
    }

    pub fn sent(&self) -> Vec<Envelope> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_methods(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|e| e.method)
            .collect()
    }
}

impl Transport for StubTransport {
    fn send<'a>(
        &'a self,
        envelope: &'a Envelope,
    ) -> Pin<Box<dyn Future<Output = Result<Envelope, McpError>> + Send + 'a>> {
        self.sent.lock().unwrap().push(envelope.clone());
        let reply = (self.handler)(envelope);
        Box::pin(async move { reply })
    }

    fn endpoint(&self) -> &str {
        "stub://server"
    }
}
