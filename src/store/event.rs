//! Inbound events, after decoding

use serde_json::Value;

/// Transport readiness as reported by the stream (0 / 1 / 2 on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Connecting,
    Open,
    Closed,
}

impl ReadyState {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(ReadyState::Connecting),
            1 => Some(ReadyState::Open),
            2 => Some(ReadyState::Closed),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ReadyState::Connecting => 0,
            ReadyState::Open => 1,
            ReadyState::Closed => 2,
        }
    }
}

/// Events delivered on a live turn connection
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Open,
    /// Replaces the assistant buffer
    AiMessage {
        content: String,
        trace_id: Option<String>,
    },
    /// Appends to the assistant buffer
    Token {
        content: String,
    },
    ToolCall {
        name: String,
        args: Value,
    },
    ToolResult {
        tool_name: String,
        content: String,
    },
    Ui {
        payload: Value,
    },
    Error {
        content: String,
    },
    Abort,
    ReadyStateChange {
        ready_state: ReadyState,
    },
    StreamEnd,
}

impl StreamEvent {
    /// Wire name of the event
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Open => "open",
            StreamEvent::AiMessage { .. } => "ai_message",
            StreamEvent::Token { .. } => "token",
            StreamEvent::ToolCall { .. } => "tool_call",
            StreamEvent::ToolResult { .. } => "tool_result",
            StreamEvent::Ui { .. } => "ui",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Abort => "abort",
            StreamEvent::ReadyStateChange { .. } => "readystatechange",
            StreamEvent::StreamEnd => "stream_end",
        }
    }
}

/// Events replayed by the history stream
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEvent {
    HumanMessage {
        content: String,
    },
    AiMessage {
        content: String,
        trace_id: Option<String>,
    },
    ToolCall {
        name: String,
        args: Value,
    },
    ToolResult {
        tool_name: String,
        content: String,
    },
    Ui {
        payload: Value,
    },
}
