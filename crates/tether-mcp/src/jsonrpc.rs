//! JSON-RPC 2.0 envelopes for MCP communication.

use crate::error::McpError;
use serde::{Deserialize, Serialize};

/// The protocol version string carried in every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// One JSON-RPC 2.0 request, notification or response.
///
/// Requests carry `method` and `id`; notifications carry `method` without an
/// `id`; responses carry `id` and exactly one of `result` / `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl Envelope {
    fn empty() -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: None,
            params: None,
            result: None,
            error: None,
        }
    }

    /// Create a request expecting a response.
    pub fn request(id: u64, method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            id: Some(id),
            method: Some(method.into()),
            params,
            ..Self::empty()
        }
    }

    /// Create a notification (no id, no response expected).
    pub fn notification(method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            method: Some(method.into()),
            params,
            ..Self::empty()
        }
    }

    /// Create a successful response.
    pub fn success(id: Option<u64>, result: serde_json::Value) -> Self {
        Self {
            id,
            result: Some(result),
            ..Self::empty()
        }
    }

    /// Create an error response.
    pub fn failure(id: Option<u64>, error: JsonRpcError) -> Self {
        Self {
            id,
            error: Some(error),
            ..Self::empty()
        }
    }

    /// The response a transport reports when the server sent no payload.
    pub fn null_result(id: Option<u64>) -> Self {
        Self::success(id, serde_json::Value::Null)
    }

    pub fn is_notification(&self) -> bool {
        self.method.is_some() && self.id.is_none()
    }

    /// Unwrap a response into its result, converting an `error` member into
    /// [`McpError::Protocol`]. A response with neither member yields `null`.
    pub fn into_result(self) -> Result<serde_json::Value, McpError> {
        if let Some(err) = self.error {
            return Err(err.into());
        }
        Ok(self.result.unwrap_or(serde_json::Value::Null))
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl From<JsonRpcError> for McpError {
    fn from(err: JsonRpcError) -> Self {
        McpError::Protocol {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_request_with_params() {
        let req = Envelope::request(
            1,
            "tools/call",
            Some(serde_json::json!({"name": "time", "arguments": {}})),
        );
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["id"], 1);
        assert_eq!(json["method"], "tools/call");
        assert!(json["params"].is_object());
        assert!(json.get("result").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn serialize_request_without_params() {
        let req = Envelope::request(2, "tools/list", None);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["id"], 2);
        assert!(json.get("params").is_none());
    }

    #[test]
    fn serialize_notification_has_no_id() {
        let notif = Envelope::notification("notifications/initialized", Some(serde_json::json!({})));
        assert!(notif.is_notification());
        let json = serde_json::to_value(&notif).unwrap();
        assert_eq!(json["method"], "notifications/initialized");
        assert!(json.get("id").is_none());
        assert_eq!(json["params"], serde_json::json!({}));
    }

    #[test]
    fn deserialize_response_with_result() {
        let json = r#"{"jsonrpc":"2.0","id":1,"result":{"tools":[]}}"#;
        let resp: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(resp.id, Some(1));
        assert!(!resp.is_notification());
        assert_eq!(resp.into_result().unwrap()["tools"], serde_json::json!([]));
    }

    #[test]
    fn error_member_becomes_protocol_error() {
        let json =
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#;
        let resp: Envelope = serde_json::from_str(json).unwrap();
        match resp.into_result() {
            Err(McpError::Protocol {
                code,
                message,
                data,
            }) => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
                assert!(data.is_none());
            }
            other => panic!("Expected Protocol error, got {other:?}"),
        }
    }

    #[test]
    fn error_data_is_preserved() {
        let json = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32600,"message":"Invalid","data":"extra info"}}"#;
        let resp: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(resp.error.unwrap().data.unwrap(), "extra info");
    }

    #[test]
    fn missing_result_is_null() {
        let resp = Envelope::null_result(Some(4));
        assert_eq!(resp.into_result().unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn envelopes_roundtrip_through_json() {
        let envelopes = [
            Envelope::request(42, "test/method", Some(serde_json::json!({"key": "val"}))),
            Envelope::notification("notifications/initialized", None),
            Envelope::success(Some(7), serde_json::json!({"content": []})),
            Envelope::failure(
                Some(8),
                JsonRpcError {
                    code: -32000,
                    message: "boom".into(),
                    data: Some(serde_json::json!({"retry": false})),
                },
            ),
        ];
        for envelope in envelopes {
            let text = serde_json::to_string(&envelope).unwrap();
            let back: Envelope = serde_json::from_str(&text).unwrap();
            assert_eq!(back, envelope);
        }
    }
}
