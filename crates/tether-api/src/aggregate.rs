//! Folds a stream of events into one assistant message.

use crate::types::{ContentDelta, StopReason, StreamEvent};
use tether_types::{ApiError, ContentBlock, Message};

/// A content block still receiving deltas.
#[derive(Debug)]
enum PartialBlock {
    Text(String),
    ToolUse {
        id: String,
        name: String,
        json: String,
    },
}

impl PartialBlock {
    fn finish(self) -> Option<ContentBlock> {
        match self {
            PartialBlock::Text(text) if text.is_empty() => None,
            PartialBlock::Text(text) => Some(ContentBlock::Text { text }),
            PartialBlock::ToolUse { id, name, json } => Some(ContentBlock::ToolUse {
                input: parse_tool_input(&name, &json),
                id,
                name,
            }),
        }
    }
}

/// Tool input arrives as partial JSON; an absent or broken payload becomes `{}`.
fn parse_tool_input(name: &str, json: &str) -> serde_json::Value {
    if json.trim().is_empty() {
        return serde_json::json!({});
    }
    serde_json::from_str(json).unwrap_or_else(|e| {
        tracing::warn!("Discarding malformed input for tool '{name}': {e}");
        serde_json::json!({})
    })
}

/// Accumulates streamed content blocks by index.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    open: Vec<(usize, PartialBlock)>,
    content: Vec<ContentBlock>,
    stop_reason: Option<StopReason>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event. A streamed `error` event ends the message.
    pub fn apply(&mut self, event: StreamEvent) -> Result<(), ApiError> {
        match event {
            StreamEvent::MessageStart { message } => {
                tracing::debug!(id = %message.id, model = %message.model, "message started");
            }
            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } => {
                let partial = match content_block {
                    ContentBlock::Text { text } => PartialBlock::Text(text),
                    ContentBlock::ToolUse { id, name, .. } => PartialBlock::ToolUse {
                        id,
                        name,
                        json: String::new(),
                    },
                    ContentBlock::ToolResult { .. } => {
                        return Err(ApiError::StreamParse(
                            "unexpected tool_result block in assistant output".into(),
                        ));
                    }
                };
                self.open.push((index, partial));
            }
            StreamEvent::ContentBlockDelta { index, delta } => {
                let Some(partial) = self.block_mut(index) else {
                    return Err(ApiError::StreamParse(format!(
                        "delta for unknown content block {index}"
                    )));
                };
                match (partial, delta) {
                    (PartialBlock::Text(text), ContentDelta::TextDelta { text: more }) => {
                        text.push_str(&more);
                    }
                    (
                        PartialBlock::ToolUse { json, .. },
                        ContentDelta::InputJsonDelta { partial_json },
                    ) => json.push_str(&partial_json),
                    (_, ContentDelta::Unsupported) => {}
                    (_, delta) => {
                        return Err(ApiError::StreamParse(format!(
                            "delta {delta:?} does not match content block {index}"
                        )));
                    }
                }
            }
            StreamEvent::ContentBlockStop { index } => {
                if let Some(pos) = self.open.iter().position(|(i, _)| *i == index) {
                    let (_, partial) = self.open.remove(pos);
                    self.content.extend(partial.finish());
                }
            }
            StreamEvent::MessageDelta { delta } => {
                if delta.stop_reason.is_some() {
                    self.stop_reason = delta.stop_reason;
                }
            }
            StreamEvent::Error { error } => {
                return Err(ApiError::Server {
                    status: 0,
                    message: format!("{}: {}", error.error_type, error.message),
                });
            }
            StreamEvent::MessageStop | StreamEvent::Ping => {}
        }
        Ok(())
    }

    fn block_mut(&mut self, index: usize) -> Option<&mut PartialBlock> {
        self.open
            .iter_mut()
            .find(|(i, _)| *i == index)
            .map(|(_, block)| block)
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Close any blocks left open and produce the assistant message.
    pub fn finish(mut self) -> Result<Message, ApiError> {
        let mut open = std::mem::take(&mut self.open);
        open.sort_by_key(|(i, _)| *i);
        self.content
            .extend(open.into_iter().filter_map(|(_, partial)| partial.finish()));

        if self.content.is_empty() {
            return Err(ApiError::EmptyResponse);
        }
        Ok(Message::assistant(self.content))
    }
}
