//! Model backend trait.

use crate::{ApiError, Conversation, Message, ToolDefinition};
use std::future::Future;
use std::pin::Pin;

/// A backend that produces the next assistant turn of a conversation.
///
/// Implementations own authentication, model selection and streaming; if the
/// backend streams, the adapter aggregates the chunks and returns a single
/// assistant message. Dyn-compatible so the orchestrator can hold an
/// `Arc<dyn ModelBackend>`.
pub trait ModelBackend: Send + Sync {
    /// Submit the conversation and tool catalogue, returning the next assistant message.
    fn converse<'a>(
        &'a self,
        conversation: &'a Conversation,
        tools: &'a [ToolDefinition],
    ) -> Pin<Box<dyn Future<Output = Result<Message, ApiError>> + Send + 'a>>;

    /// Backend name for logging (e.g., "anthropic").
    fn name(&self) -> &str;
}
