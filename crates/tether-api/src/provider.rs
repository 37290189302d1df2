//! Anthropic implementation of [`ModelBackend`].

use crate::aggregate::MessageBuilder;
use crate::client::ApiClient;
use crate::retry::RetryConfig;
use crate::types::CreateMessageRequest;
use futures_util::StreamExt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tether_types::{ApiError, Conversation, Message, ModelBackend, ToolDefinition};

/// Default request timeout for model calls.
pub const DEFAULT_TIMEOUT_MS: u64 = 300_000;

/// Model backend over the streaming Anthropic Messages API.
///
/// Each `converse` call streams one response and folds it into a single
/// assistant message. Retry logic stays in [`ApiClient`].
#[derive(Clone)]
pub struct AnthropicBackend {
    client: ApiClient,
    model: String,
    max_tokens: u32,
}

impl AnthropicBackend {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
    ) -> Result<Self, ApiError> {
        Self::with_timeout(
            api_key,
            base_url,
            model,
            max_tokens,
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
        )
    }

    pub fn with_timeout(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: ApiClient::new(api_key, base_url, timeout)?,
            model: model.into(),
            max_tokens,
        })
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.client = self.client.with_retry_config(config);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn stream_turn(
        &self,
        conversation: &Conversation,
        tools: &[ToolDefinition],
    ) -> Result<Message, ApiError> {
        let request = CreateMessageRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: conversation.messages(),
            system: conversation.system(),
            tools,
            stream: true,
        };

        let mut stream = self.client.create_message_stream(&request).await?;
        let mut builder = MessageBuilder::new();
        while let Some(event) = stream.next().await {
            builder.apply(event?)?;
        }

        tracing::debug!(stop_reason = ?builder.stop_reason(), "model turn complete");
        builder.finish()
    }
}

impl ModelBackend for AnthropicBackend {
    fn converse<'a>(
        &'a self,
        conversation: &'a Conversation,
        tools: &'a [ToolDefinition],
    ) -> Pin<Box<dyn Future<Output = Result<Message, ApiError>> + Send + 'a>> {
        Box::pin(self.stream_turn(conversation, tools))
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_name_and_model() {
        let backend = AnthropicBackend::new(
            "test-key",
            "https://api.example.com",
            "claude-sonnet-4-5-20250929",
            1024,
        )
        .unwrap();
        assert_eq!(backend.name(), "anthropic");
        assert_eq!(backend.model(), "claude-sonnet-4-5-20250929");
    }

    #[test]
    fn backend_is_usable_as_trait_object() {
        let backend = AnthropicBackend::new("k", "https://api.example.com", "m", 16)
            .unwrap()
            .with_retry_config(RetryConfig::disabled());
        let shared: std::sync::Arc<dyn ModelBackend> = std::sync::Arc::new(backend);
        assert_eq!(shared.name(), "anthropic");
    }
}
