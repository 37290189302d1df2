//! Error types for MCP operations.

use thiserror::Error;

/// Errors from tool-server communication.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("HTTP {status} from MCP server: {body}")]
    Http { status: u16, body: String },

    #[error("Network error talking to MCP server: {0}")]
    Network(String),

    #[error("MCP request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("MCP error {code}: {message}")]
    Protocol {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("Unexpected MCP response: {0}")]
    Decoding(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot {operation} while client is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Tool '{name}' not found")]
    ToolNotFound { name: String },
}

/// Coarse classification of an [`McpError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpErrorKind {
    Transport,
    Protocol,
    Decoding,
    InvalidState,
    ToolNotFound,
}

impl McpError {
    pub fn kind(&self) -> McpErrorKind {
        match self {
            Self::Http { .. } | Self::Network(_) | Self::Timeout { .. } => McpErrorKind::Transport,
            Self::Protocol { .. } => McpErrorKind::Protocol,
            Self::Decoding(_) | Self::Json(_) => McpErrorKind::Decoding,
            Self::InvalidState { .. } => McpErrorKind::InvalidState,
            Self::ToolNotFound { .. } => McpErrorKind::ToolNotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_variants() {
        assert_eq!(
            McpError::Http {
                status: 502,
                body: String::new()
            }
            .kind(),
            McpErrorKind::Transport
        );
        assert_eq!(
            McpError::Network("refused".into()).kind(),
            McpErrorKind::Transport
        );
        assert_eq!(
            McpError::Decoding("no tools".into()).kind(),
            McpErrorKind::Decoding
        );
        assert_eq!(
            McpError::ToolNotFound { name: "x".into() }.kind(),
            McpErrorKind::ToolNotFound
        );
    }

    #[test]
    fn tool_not_found_display() {
        let err = McpError::ToolNotFound {
            name: "weather".into(),
        };
        assert_eq!(err.to_string(), "Tool 'weather' not found");
    }
}
