//! Async stream that converts SSE events into typed [`StreamEvent`]s.

use crate::sse::{SseEvent, SseParser};
use crate::types::{ApiErrorResponse, ContentDelta, MessageDelta, MessageStart, StreamEvent};
use futures_core::Stream;
use pin_project_lite::pin_project;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use tether_types::{ApiError, ContentBlock};

type ByteStream = Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>;

pin_project! {
    /// An async stream of typed events from the Messages API.
    pub struct MessageStream {
        #[pin]
        inner: ByteStream,
        parser: SseParser,
        pending: VecDeque<SseEvent>,
    }
}

impl MessageStream {
    /// Create a new MessageStream from a reqwest byte stream.
    pub fn new(
        byte_stream: impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            parser: SseParser::new(),
            pending: VecDeque::new(),
        }
    }
}

impl Stream for MessageStream {
    type Item = Result<StreamEvent, ApiError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            while let Some(sse_event) = this.pending.pop_front() {
                match parse_stream_event(sse_event.event_type.as_deref(), &sse_event.data) {
                    Ok(Some(event)) => return Poll::Ready(Some(Ok(event))),
                    Ok(None) => continue,
                    Err(e) => return Poll::Ready(Some(Err(e))),
                }
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    let text = String::from_utf8_lossy(&bytes);
                    this.pending.extend(this.parser.feed(&text));
                }
                Poll::Ready(Some(Err(e))) => {
                    let err = if e.is_timeout() {
                        ApiError::Timeout
                    } else {
                        ApiError::Network(e.to_string())
                    };
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Parse an SSE event into a typed StreamEvent. Untyped and unknown events
/// yield `None`.
fn parse_stream_event(event_type: Option<&str>, data: &str) -> Result<Option<StreamEvent>, ApiError> {
    let Some(event_type) = event_type else {
        return Ok(None);
    };

    let parse_err = |e: serde_json::Error| ApiError::StreamParse(format!("{event_type}: {e}"));

    let event = match event_type {
        "message_start" => {
            #[derive(serde::Deserialize)]
            struct Wrapper {
                message: MessageStart,
            }
            let w: Wrapper = serde_json::from_str(data).map_err(parse_err)?;
            StreamEvent::MessageStart { message: w.message }
        }
        "content_block_start" => {
            #[derive(serde::Deserialize)]
            struct Wrapper {
                index: usize,
                content_block: ContentBlock,
            }
            let w: Wrapper = serde_json::from_str(data).map_err(parse_err)?;
            StreamEvent::ContentBlockStart {
                index: w.index,
                content_block: w.content_block,
            }
        }
        "content_block_delta" => {
            #[derive(serde::Deserialize)]
            struct Wrapper {
                index: usize,
                delta: ContentDelta,
            }
            let w: Wrapper = serde_json::from_str(data).map_err(parse_err)?;
            StreamEvent::ContentBlockDelta {
                index: w.index,
                delta: w.delta,
            }
        }
        "content_block_stop" => {
            #[derive(serde::Deserialize)]
            struct Wrapper {
                index: usize,
            }
            let w: Wrapper = serde_json::from_str(data).map_err(parse_err)?;
            StreamEvent::ContentBlockStop { index: w.index }
        }
        "message_delta" => {
            #[derive(serde::Deserialize)]
            struct Wrapper {
                delta: MessageDelta,
            }
            let w: Wrapper = serde_json::from_str(data).map_err(parse_err)?;
            StreamEvent::MessageDelta { delta: w.delta }
        }
        "message_stop" => StreamEvent::MessageStop,
        "ping" => StreamEvent::Ping,
        "error" => {
            #[derive(serde::Deserialize)]
            struct Wrapper {
                error: ApiErrorResponse,
            }
            let w: Wrapper = serde_json::from_str(data).map_err(parse_err)?;
            StreamEvent::Error { error: w.error }
        }
        _ => {
            tracing::debug!("Unknown SSE event type: {event_type}");
            return Ok(None);
        }
    };
    Ok(Some(event))
}
