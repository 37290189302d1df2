//! HTTP transports for MCP server communication.
//!
//! Each transport POSTs one envelope and returns one envelope. The two
//! strategies differ only in which response body shapes they accept.

use crate::config::{McpServerConfig, TransportKind};
use crate::error::McpError;
use crate::frame::{self, BodyShape};
use crate::jsonrpc::Envelope;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tether_types::truncate_string;

/// Value of the `Accept` header sent with every request.
pub const ACCEPT_VALUE: &str = "application/json, text/event-stream";

/// Longest error body kept in [`McpError::Http`].
const MAX_ERROR_BODY_BYTES: usize = 4096;

/// Delivers a single envelope to a tool server and returns its reply.
///
/// Implementations never retry and never cache. Dyn-compatible so clients can
/// hold an `Arc<dyn Transport>` chosen at construction time.
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        envelope: &'a Envelope,
    ) -> Pin<Box<dyn Future<Output = Result<Envelope, McpError>> + Send + 'a>>;

    /// Endpoint description for logging.
    fn endpoint(&self) -> &str;
}

/// Build the transport described by a server config.
pub fn build_transport(config: &McpServerConfig) -> Result<Arc<dyn Transport>, McpError> {
    let transport: Arc<dyn Transport> = match config.transport {
        TransportKind::Json => Arc::new(HttpTransport::new(&config.url, config.timeout_ms)?),
        TransportKind::Sse => Arc::new(SseTransport::new(&config.url, config.timeout_ms)?),
    };
    Ok(transport)
}

/// Shared POST machinery: one bounded HTTP exchange, body returned as text.
#[derive(Clone)]
struct HttpPoster {
    http: reqwest::Client,
    url: String,
    timeout_ms: u64,
}

impl HttpPoster {
    fn new(url: &str, timeout_ms: u64) -> Result<Self, McpError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| McpError::Network(e.to_string()))?;
        Ok(Self {
            http,
            url: url.to_string(),
            timeout_ms,
        })
    }

    async fn post(&self, envelope: &Envelope) -> Result<String, McpError> {
        let body = serde_json::to_string(envelope)?;
        tracing::debug!(
            url = %self.url,
            method = envelope.method.as_deref().unwrap_or(""),
            id = ?envelope.id,
            "POST MCP envelope"
        );

        let response = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, ACCEPT_VALUE)
            .body(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(e))?;
        tracing::debug!(status = status.as_u16(), bytes = text.len(), "MCP response");

        if !status.is_success() {
            let mut body = text;
            truncate_string(&mut body, MAX_ERROR_BODY_BYTES);
            return Err(McpError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(text)
    }

    fn classify(&self, err: reqwest::Error) -> McpError {
        if err.is_timeout() {
            McpError::Timeout {
                url: self.url.clone(),
                timeout_ms: self.timeout_ms,
            }
        } else {
            McpError::Network(err.to_string())
        }
    }
}

/// Buffered POST expecting a plain JSON body (or nothing).
#[derive(Clone)]
pub struct HttpTransport {
    poster: HttpPoster,
}

impl HttpTransport {
    pub fn new(url: &str, timeout_ms: u64) -> Result<Self, McpError> {
        Ok(Self {
            poster: HttpPoster::new(url, timeout_ms)?,
        })
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        envelope: &'a Envelope,
    ) -> Pin<Box<dyn Future<Output = Result<Envelope, McpError>> + Send + 'a>> {
        Box::pin(async move {
            let body = self.poster.post(envelope).await?;
            match BodyShape::classify(&body) {
                BodyShape::Empty => Ok(Envelope::null_result(envelope.id)),
                BodyShape::Json => frame::decode_json(&body),
                BodyShape::EventStream => Err(McpError::Decoding(
                    "expected a JSON body but the server sent an event stream".to_string(),
                )),
            }
        })
    }

    fn endpoint(&self) -> &str {
        &self.poster.url
    }
}

/// POST whose reply may be SSE-framed (streamable HTTP).
#[derive(Clone)]
pub struct SseTransport {
    poster: HttpPoster,
}

impl SseTransport {
    pub fn new(url: &str, timeout_ms: u64) -> Result<Self, McpError> {
        Ok(Self {
            poster: HttpPoster::new(url, timeout_ms)?,
        })
    }
}

impl Transport for SseTransport {
    fn send<'a>(
        &'a self,
        envelope: &'a Envelope,
    ) -> Pin<Box<dyn Future<Output = Result<Envelope, McpError>> + Send + 'a>> {
        Box::pin(async move {
            let body = self.poster.post(envelope).await?;
            match BodyShape::classify(&body) {
                BodyShape::Empty => Ok(Envelope::null_result(envelope.id)),
                BodyShape::Json => frame::decode_json(&body),
                BodyShape::EventStream => frame::decode_event_stream(&body, envelope.id),
            }
        })
    }

    fn endpoint(&self) -> &str {
        &self.poster.url
    }
}
