//! Tool records exchanged with MCP servers.

use serde::{Deserialize, Serialize};
use tether_types::ToolDefinition;

fn default_schema() -> serde_json::Value {
    serde_json::json!({"type": "object", "properties": {}})
}

/// A tool advertised by a server through `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_schema", rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

impl Tool {
    /// Project into the shape advertised to the model.
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }
}

/// Arguments for a `tools/call` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl ToolCall {
    /// Build a call from a model-supplied input; non-object input becomes `{}`.
    pub fn new(name: impl Into<String>, input: &serde_json::Value) -> Self {
        let arguments = match input {
            serde_json::Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Result of a `tools/call` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Text blocks joined with newlines; other block kinds are skipped.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                ToolContent::Text { text } => Some(text.as_str()),
                ToolContent::Unsupported => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A content item in a tool result. Only text is modeled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text {
        text: String,
    },
    #[serde(other)]
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_tool() {
        let json = r#"{
            "name": "time",
            "description": "Current time in a format",
            "inputSchema": {
                "type": "object",
                "properties": {"format": {"type": "string"}},
                "required": ["format"]
            }
        }"#;
        let tool: Tool = serde_json::from_str(json).unwrap();
        assert_eq!(tool.name, "time");
        assert_eq!(tool.input_schema["required"][0], "format");
    }

    #[test]
    fn deserialize_tool_with_defaults() {
        let tool: Tool = serde_json::from_str(r#"{"name": "list"}"#).unwrap();
        assert_eq!(tool.description, "");
        assert_eq!(tool.input_schema["type"], "object");
    }

    #[test]
    fn definition_copies_fields() {
        let tool = Tool {
            name: "echo".into(),
            description: "Echo input".into(),
            input_schema: serde_json::json!({"type": "object"}),
        };
        let def = tool.definition();
        assert_eq!(def.name, "echo");
        assert_eq!(def.description, "Echo input");
        assert_eq!(def.input_schema, tool.input_schema);
    }

    #[test]
    fn tool_call_from_non_object_input() {
        let call = ToolCall::new("time", &serde_json::json!("RFC3339"));
        assert!(call.arguments.is_empty());
        let call = ToolCall::new("time", &serde_json::json!({"format": "RFC3339"}));
        assert_eq!(call.arguments["format"], "RFC3339");
    }

    #[test]
    fn deserialize_result_with_mixed_content() {
        let json = r#"{
            "content": [
                {"type": "text", "text": "line one"},
                {"type": "image", "data": "aGk=", "mimeType": "image/png"},
                {"type": "text", "text": "line two"}
            ],
            "isError": true
        }"#;
        let result: ToolResult = serde_json::from_str(json).unwrap();
        assert!(result.is_error);
        assert_eq!(result.content[1], ToolContent::Unsupported);
        assert_eq!(result.joined_text(), "line one\nline two");
    }

    #[test]
    fn result_is_error_defaults_false() {
        let result: ToolResult =
            serde_json::from_str(r#"{"content": [{"type": "text", "text": "ok"}]}"#).unwrap();
        assert!(!result.is_error);
    }

    #[test]
    fn result_without_content_is_rejected() {
        assert!(serde_json::from_str::<ToolResult>(r#"{"isError": false}"#).is_err());
    }
}
