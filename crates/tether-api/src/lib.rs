//! Anthropic Messages API backend with SSE streaming for Tether.

mod aggregate;
mod client;
mod provider;
mod retry;
mod sse;
mod stream;
pub mod types;

pub use aggregate::MessageBuilder;
pub use client::ApiClient;
pub use provider::AnthropicBackend;
pub use retry::RetryConfig;
pub use stream::MessageStream;
