//! Permanent log entries

use super::reasoning::ReasoningProcess;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Presentation hints attached to log entries
pub mod class_names {
    pub const USER_MESSAGE: &str = "user-message";
    pub const ASSISTANT_MESSAGE: &str = "assistant-message";
    pub const TOOL_CALL: &str = "tool-call";
    pub const LOADING: &str = "loading";
    pub const ERROR: &str = "error";
    pub const UI_MESSAGE: &str = "ui-message";
}

/// Who produced a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
    System,
}

/// What kind of entry this is, independent of who sent it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Message,
    ToolCall,
    ToolResult,
    Error,
    Loading,
    Ui,
}

/// Message body: plain text, or a structured payload for UI directives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Structured(Value),
}

impl MessageContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            MessageContent::Structured(_) => None,
        }
    }

    /// Text for plain rendering; structured payloads render as compact JSON
    pub fn to_display(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Structured(value) => value.to_string(),
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

/// An entry in the conversation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub content: MessageContent,
    pub sender: Sender,
    pub message_type: MessageType,
    pub class_name: String,
    /// Only set on finalized assistant replies that reported one
    pub trace_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_snapshot: Option<ReasoningProcess>,
}

/// A log entry before the store assigns its id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub content: MessageContent,
    pub sender: Sender,
    pub message_type: MessageType,
    pub class_name: String,
    pub trace_id: Option<String>,
    pub reasoning_snapshot: Option<ReasoningProcess>,
}

impl NewMessage {
    pub fn new(content: impl Into<MessageContent>, sender: Sender, message_type: MessageType) -> Self {
        Self {
            content: content.into(),
            sender,
            message_type,
            class_name: String::new(),
            trace_id: None,
            reasoning_snapshot: None,
        }
    }

    pub fn with_class(mut self, class_name: &str) -> Self {
        self.class_name = class_name.to_string();
        self
    }

    pub fn with_trace_id(mut self, trace_id: Option<String>) -> Self {
        self.trace_id = trace_id;
        self
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text.into(), Sender::User, MessageType::Message).with_class(class_names::USER_MESSAGE)
    }

    /// A finalized assistant reply
    pub fn assistant_reply(text: impl Into<String>, trace_id: Option<String>) -> Self {
        Self::new(text.into(), Sender::Assistant, MessageType::Message)
            .with_class(class_names::ASSISTANT_MESSAGE)
            .with_trace_id(trace_id)
    }

    pub fn error(text: impl Into<String>, sender: Sender) -> Self {
        Self::new(text.into(), sender, MessageType::Error).with_class(class_names::ERROR)
    }

    pub fn ui(payload: Value) -> Self {
        Self::new(MessageContent::Structured(payload), Sender::Assistant, MessageType::Ui)
            .with_class(class_names::UI_MESSAGE)
    }

    /// Dedicated entry carrying a completed reasoning cycle
    pub fn reasoning(snapshot: ReasoningProcess) -> Self {
        let mut draft = Self::new(snapshot.headline(), Sender::Assistant, MessageType::Loading)
            .with_class(class_names::LOADING);
        draft.reasoning_snapshot = Some(snapshot);
        draft
    }

    pub(crate) fn into_message(self, id: String, timestamp: DateTime<Utc>) -> Message {
        Message {
            id,
            content: self.content,
            sender: self.sender,
            message_type: self.message_type,
            class_name: self.class_name,
            trace_id: self.trace_id,
            timestamp,
            reasoning_snapshot: self.reasoning_snapshot,
        }
    }
}
