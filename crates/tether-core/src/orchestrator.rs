//! The model/tool loop.

use std::sync::Arc;

use tether_mcp::{McpError, ToolCall, ToolRegistry};
use tether_types::{
    ContentBlock, Conversation, Message, ModelBackend, Role, TetherError, preview,
};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Default cap on model calls within one exchange.
pub const DEFAULT_MAX_TURNS: usize = 25;

/// Longest tool output forwarded in [`AgentEvent::ToolEnd`].
const EVENT_PREVIEW_BYTES: usize = 200;

/// Stand-in for a tool result without text. The model API rejects empty
/// text blocks.
const NO_OUTPUT: &str = "(no output)";

/// Events emitted while an exchange runs.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// A tool is about to be called. `input` is the JSON the model supplied.
    ToolStart { name: String, input: String },
    /// A tool call finished (or failed softly).
    ToolEnd {
        name: String,
        output: String,
        is_error: bool,
    },
    /// The model produced its final answer.
    Done,
    /// The exchange was cancelled.
    Cancelled,
}

/// Result of one tool dispatch, ready to become a `tool_result` block.
struct ToolOutcome {
    text: String,
    is_error: bool,
}

impl ToolOutcome {
    fn error(text: String) -> Self {
        Self {
            text,
            is_error: true,
        }
    }
}

/// An owned copy of a tool-use request, detached from the assistant message.
struct PendingUse {
    id: String,
    name: String,
    input: serde_json::Value,
}

/// Drives exchanges between a model backend and the tools in a registry.
///
/// The registry is shared and read-only, so one registry can serve several
/// orchestrators running concurrently.
pub struct Orchestrator {
    backend: Arc<dyn ModelBackend>,
    registry: Arc<ToolRegistry>,
    instruction: Option<String>,
    max_turns: usize,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn ModelBackend>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            backend,
            registry,
            instruction: None,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Set the system instruction sent with every exchange.
    pub fn set_instruction(&mut self, instruction: impl Into<String>) {
        self.instruction = Some(instruction.into());
    }

    /// Set the maximum number of model calls per exchange.
    pub fn set_max_turns(&mut self, max_turns: usize) {
        self.max_turns = max_turns;
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Answer one user message, calling tools as the model requests them.
    pub async fn invoke(
        &self,
        user_text: &str,
        cancel: CancellationToken,
    ) -> Result<String, TetherError> {
        self.invoke_with_events(user_text, cancel, |_| {}).await
    }

    /// Like [`Orchestrator::invoke`], reporting progress through `on_event`.
    pub async fn invoke_with_events<F>(
        &self,
        user_text: &str,
        cancel: CancellationToken,
        on_event: F,
    ) -> Result<String, TetherError>
    where
        F: FnMut(AgentEvent),
    {
        let span = tracing::info_span!("exchange", id = %uuid::Uuid::new_v4());
        let mut conversation = Conversation::seeded(self.instruction.clone(), user_text);
        self.run(&mut conversation, cancel, on_event)
            .instrument(span)
            .await
    }

    /// Run the loop over an existing conversation until the model answers
    /// without requesting tools.
    ///
    /// On cancellation the conversation keeps every message appended so far.
    pub async fn run<F>(
        &self,
        conversation: &mut Conversation,
        cancel: CancellationToken,
        mut on_event: F,
    ) -> Result<String, TetherError>
    where
        F: FnMut(AgentEvent),
    {
        let catalogue = self.registry.catalogue();

        for turn in 1..=self.max_turns {
            tracing::debug!(
                turn,
                messages = conversation.len(),
                backend = self.backend.name(),
                "submitting conversation"
            );

            let reply = tokio::select! {
                _ = cancel.cancelled() => {
                    on_event(AgentEvent::Cancelled);
                    return Err(TetherError::Cancelled);
                }
                reply = self.backend.converse(conversation, &catalogue) => reply?,
            };

            let pending: Vec<PendingUse> = reply
                .tool_uses()
                .into_iter()
                .map(|u| PendingUse {
                    id: u.id.to_string(),
                    name: u.name.to_string(),
                    input: u.input.clone(),
                })
                .collect();
            let answer = reply.text();
            conversation.push(reply);

            if pending.is_empty() {
                on_event(AgentEvent::Done);
                return Ok(answer);
            }

            let mut results = Vec::with_capacity(pending.len());
            for call in &pending {
                on_event(AgentEvent::ToolStart {
                    name: call.name.clone(),
                    input: call.input.to_string(),
                });

                let outcome = tokio::select! {
                    _ = cancel.cancelled() => {
                        on_event(AgentEvent::Cancelled);
                        return Err(TetherError::Cancelled);
                    }
                    outcome = self.dispatch(&call.name, &call.input) => outcome,
                };

                on_event(AgentEvent::ToolEnd {
                    name: call.name.clone(),
                    output: preview(&outcome.text, EVENT_PREVIEW_BYTES),
                    is_error: outcome.is_error,
                });
                results.push(ContentBlock::tool_result(
                    call.id.clone(),
                    outcome.text,
                    outcome.is_error,
                ));
            }

            conversation.push(Message {
                role: Role::User,
                content: results,
            });
        }

        tracing::warn!("Exchange stopped after {} model turns", self.max_turns);
        Err(TetherError::TurnLimit {
            max_turns: self.max_turns,
        })
    }

    /// Call one tool. Failures are reported to the model, never raised.
    async fn dispatch(&self, name: &str, input: &serde_json::Value) -> ToolOutcome {
        let Some(client) = self.registry.find_client_for_tool(name) else {
            tracing::warn!("Model requested unknown tool '{name}'");
            let missing = McpError::ToolNotFound {
                name: name.to_string(),
            };
            return ToolOutcome::error(missing.to_string());
        };

        match client.call_tool(&ToolCall::new(name, input)).await {
            Ok(result) => {
                if result.is_error {
                    tracing::debug!("Tool '{name}' reported an error");
                }
                let mut text = result.joined_text();
                if text.is_empty() {
                    text = NO_OUTPUT.to_string();
                }
                ToolOutcome {
                    text,
                    is_error: result.is_error,
                }
            }
            Err(e) => {
                tracing::warn!("Tool '{name}' failed at {}: {e}", client.endpoint());
                ToolOutcome::error(format!("Error executing tool: {e}"))
            }
        }
    }
}
