//! Response body framing.
//!
//! A tool server answers a POST either with nothing, with a bare JSON
//! envelope, or with a Server-Sent Events stream whose first `data:` line
//! carries the envelope. The body is classified once by its leading bytes and
//! handed to the decoder for that shape.

use crate::error::McpError;
use crate::jsonrpc::Envelope;

/// SSE field names that may open an event-stream body.
const SSE_FIELD_PREFIXES: [&str; 5] = ["event:", "data:", "id:", "retry:", ":"];

/// The structural shape of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    Empty,
    Json,
    EventStream,
}

impl BodyShape {
    /// Classify a body by its first non-whitespace bytes.
    pub fn classify(body: &str) -> Self {
        let head = body.trim_start();
        if head.is_empty() {
            BodyShape::Empty
        } else if SSE_FIELD_PREFIXES.iter().any(|p| head.starts_with(p)) {
            BodyShape::EventStream
        } else {
            BodyShape::Json
        }
    }
}

/// Decode a bare JSON envelope.
pub fn decode_json(body: &str) -> Result<Envelope, McpError> {
    serde_json::from_str(body.trim())
        .map_err(|e| McpError::Decoding(format!("invalid JSON-RPC envelope: {e}")))
}

/// Extract the payload of the first `data:` line, trimmed.
pub fn first_data_line(body: &str) -> Option<&str> {
    body.lines()
        .find_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
}

/// Decode an event-stream body.
///
/// A stream without any `data:` line is a success with a null result, which
/// is how servers acknowledge notifications over SSE.
pub fn decode_event_stream(body: &str, request_id: Option<u64>) -> Result<Envelope, McpError> {
    match first_data_line(body) {
        Some(data) if !data.is_empty() => decode_json(data),
        _ => {
            tracing::debug!("event stream carried no data line");
            Ok(Envelope::null_result(request_id))
        }
    }
}

/// Encode an envelope as a single SSE `message` event.
pub fn encode_event(envelope: &Envelope) -> Result<String, McpError> {
    let json = serde_json::to_string(envelope)?;
    Ok(format!("event: message\ndata: {json}\n\n"))
}
