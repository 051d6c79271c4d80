//! Event codec
//!
//! Frame payloads are JSON text. A payload that fails to parse is logged and
//! dropped; it never ends the stream.

use crate::sse::SseFrame;
use crate::store::{status_text, HistoryEvent, ReadyState, StreamEvent};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct ContentPayload {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct AiMessagePayload {
    #[serde(default)]
    content: String,
    #[serde(default)]
    trace_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ToolCallPayload {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Deserialize)]
struct ToolResultPayload {
    tool_name: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ReadyStatePayload {
    #[serde(rename = "readyState")]
    ready_state: u64,
}

/// Parse a frame payload. `None` means "ignore this frame".
pub fn decode(raw: &str) -> Option<Value> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "Error parsing event data");
            None
        }
    }
}

/// Text for a visible error entry: the payload's `content`, or a fixed
/// fallback when there is none
pub fn extract_error_text(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return status_text::RECEIVE_ERROR.to_string();
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => value
            .get("content")
            .and_then(Value::as_str)
            .filter(|content| !content.is_empty())
            .map_or_else(|| status_text::RECEIVE_ERROR.to_string(), str::to_string),
        Err(e) => {
            tracing::warn!(error = %e, "Error parsing error data");
            status_text::RECEIVE_ERROR.to_string()
        }
    }
}

fn payload<T: DeserializeOwned>(frame: &SseFrame) -> Option<T> {
    let value = decode(&frame.data)?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(event = %frame.event, error = %e, "Malformed event payload");
            None
        }
    }
}

/// Decode a frame from a live turn connection
pub fn decode_stream_event(frame: &SseFrame) -> Option<StreamEvent> {
    match frame.event.as_str() {
        "open" => Some(StreamEvent::Open),
        "ai_message" => payload::<AiMessagePayload>(frame).map(|p| StreamEvent::AiMessage {
            content: p.content,
            trace_id: p.trace_id,
        }),
        "token" => payload::<ContentPayload>(frame).map(|p| StreamEvent::Token { content: p.content }),
        "tool_call" => payload::<ToolCallPayload>(frame).map(|p| StreamEvent::ToolCall {
            name: p.name,
            args: p.args,
        }),
        "tool_result" => payload::<ToolResultPayload>(frame).map(|p| StreamEvent::ToolResult {
            tool_name: p.tool_name,
            content: p.content,
        }),
        "ui" => decode(&frame.data).map(|payload| StreamEvent::Ui { payload }),
        "error" => Some(StreamEvent::Error {
            content: extract_error_text(Some(&frame.data)),
        }),
        "abort" => Some(StreamEvent::Abort),
        "readystatechange" => payload::<ReadyStatePayload>(frame)
            .and_then(|p| ReadyState::from_code(p.ready_state))
            .map(|ready_state| StreamEvent::ReadyStateChange { ready_state }),
        "stream_end" => Some(StreamEvent::StreamEnd),
        other => {
            tracing::debug!(event = %other, "Ignoring unknown stream event");
            None
        }
    }
}

/// A frame of the history stream, classified
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryFrame {
    Event(HistoryEvent),
    End,
    Failed(String),
    Ignored,
}

/// Decode a frame from the history stream
pub fn decode_history_frame(frame: &SseFrame) -> HistoryFrame {
    let event = match frame.event.as_str() {
        "human_message" => payload::<ContentPayload>(frame)
            .map(|p| HistoryEvent::HumanMessage { content: p.content }),
        "ai_message" => payload::<AiMessagePayload>(frame).map(|p| HistoryEvent::AiMessage {
            content: p.content,
            trace_id: p.trace_id,
        }),
        "tool_call" => payload::<ToolCallPayload>(frame).map(|p| HistoryEvent::ToolCall {
            name: p.name,
            args: p.args,
        }),
        "tool_result" => payload::<ToolResultPayload>(frame).map(|p| HistoryEvent::ToolResult {
            tool_name: p.tool_name,
            content: p.content,
        }),
        "ui" => decode(&frame.data).map(|payload| HistoryEvent::Ui { payload }),
        "stream_end" => return HistoryFrame::End,
        "error" => return HistoryFrame::Failed(extract_error_text(Some(&frame.data))),
        other => {
            tracing::debug!(event = %other, "Ignoring history frame");
            None
        }
    };
    event.map_or(HistoryFrame::Ignored, HistoryFrame::Event)
}
