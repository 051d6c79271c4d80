//! Conversation store state

use super::event::ReadyState;
use super::ids::{IdGenerator, SequentialIds};
use super::message::{Message, NewMessage, Sender};
use super::reasoning::{ReasoningProcess, ReasoningStep};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed status and placeholder texts
pub mod status_text {
    pub const READY: &str = "Ready";
    pub const CONNECTING: &str = "Connecting...";
    pub const CONNECTED: &str = "Connected";
    pub const DISCONNECTED: &str = "Connection closed";
    pub const CONNECTION_ERROR: &str = "Connection error";
    pub const RECEIVE_ERROR: &str = "Error receiving response";
    pub const CREATE_ERROR: &str = "Error creating connection";
    pub const THINKING: &str = "Thinking...";
    pub const RESPONDING: &str = "Responding...";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    Connecting,
    Connected,
    Disconnected,
}

/// Projection of the live transport's readiness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub phase: ConnectionPhase,
    pub message: String,
}

impl ConnectionStatus {
    fn new(phase: ConnectionPhase, message: &str) -> Self {
        Self {
            phase,
            message: message.to_string(),
        }
    }

    pub fn ready() -> Self {
        Self::new(ConnectionPhase::Disconnected, status_text::READY)
    }

    pub fn connected() -> Self {
        Self::new(ConnectionPhase::Connected, status_text::CONNECTED)
    }

    pub fn closed() -> Self {
        Self::new(ConnectionPhase::Disconnected, status_text::DISCONNECTED)
    }

    pub fn errored() -> Self {
        Self::new(ConnectionPhase::Disconnected, status_text::CONNECTION_ERROR)
    }

    pub fn for_ready_state(ready_state: ReadyState) -> Self {
        match ready_state {
            ReadyState::Connecting => Self::new(ConnectionPhase::Connecting, status_text::CONNECTING),
            ReadyState::Open => Self::connected(),
            ReadyState::Closed => Self::closed(),
        }
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::ready()
    }
}

/// Reply text being assembled for the turn in progress
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantBuffer {
    text: String,
    trace_id: Option<String>,
}

impl AssistantBuffer {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn replace(&mut self, text: String, trace_id: Option<String>) {
        self.text = text;
        self.trace_id = trace_id;
    }

    fn append(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn clear(&mut self) {
        self.text.clear();
        self.trace_id = None;
    }

    fn take(&mut self) -> (String, Option<String>) {
        (std::mem::take(&mut self.text), self.trace_id.take())
    }
}

/// Single source of truth for one conversation view
#[derive(Debug)]
pub struct ConversationStore {
    messages: Vec<Message>,
    input: String,
    is_loading: bool,
    is_sending: bool,
    connection_status: ConnectionStatus,
    assistant: AssistantBuffer,
    reasoning: ReasoningProcess,
    ids: Box<dyn IdGenerator>,
}

impl ConversationStore {
    pub fn new(ids: Box<dyn IdGenerator>) -> Self {
        Self {
            messages: Vec::new(),
            input: String::new(),
            is_loading: false,
            is_sending: false,
            connection_status: ConnectionStatus::ready(),
            assistant: AssistantBuffer::default(),
            reasoning: ReasoningProcess::default(),
            ids,
        }
    }

    pub fn with_sequential_ids() -> Self {
        Self::new(Box::new(SequentialIds::new()))
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_sending(&self) -> bool {
        self.is_sending
    }

    pub fn connection_status(&self) -> &ConnectionStatus {
        &self.connection_status
    }

    pub fn assistant(&self) -> &AssistantBuffer {
        &self.assistant
    }

    pub fn assistant_text(&self) -> &str {
        self.assistant.text()
    }

    pub fn reasoning(&self) -> &ReasoningProcess {
        &self.reasoning
    }

    /// Trace id of the most recent reply that has one
    pub fn last_trace_id(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| m.trace_id.as_deref())
    }

    // ------------------------------------------------------------------
    // User actions
    // ------------------------------------------------------------------

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    pub fn add_user_message(&mut self, text: &str, now: DateTime<Utc>) -> &Message {
        self.append(NewMessage::user(text), now)
    }

    pub fn toggle_reasoning_expanded(&mut self) -> bool {
        self.reasoning.toggle_expanded()
    }

    /// Flip expansion on a materialized reasoning entry
    pub fn toggle_snapshot_expanded(&mut self, message_id: &str) -> bool {
        self.messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .and_then(|m| m.reasoning_snapshot.as_mut())
            .is_some_and(ReasoningProcess::toggle_expanded)
    }

    /// Back to an empty, idle conversation. The id generator is kept.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.input.clear();
        self.is_loading = false;
        self.is_sending = false;
        self.connection_status = ConnectionStatus::ready();
        self.assistant.clear();
        self.reasoning = ReasoningProcess::default();
    }

    // ------------------------------------------------------------------
    // Turn lifecycle
    // ------------------------------------------------------------------

    /// Flags up, buffer cleared, reasoning restarted
    pub fn begin_turn(&mut self, now: DateTime<Utc>) {
        self.is_sending = true;
        self.is_loading = true;
        self.assistant.clear();
        self.reasoning = ReasoningProcess::begin(now);
    }

    pub(crate) fn mark_connected(&mut self) {
        self.connection_status = ConnectionStatus::connected();
    }

    pub(crate) fn replace_assistant_text(&mut self, text: String, trace_id: Option<String>) {
        self.assistant.replace(text, trace_id);
    }

    pub(crate) fn append_assistant_text(&mut self, text: &str, now: DateTime<Utc>) {
        self.reasoning.enter_responding(now);
        self.assistant.append(text);
    }

    pub(crate) fn record_reasoning(&mut self, step: ReasoningStep, now: DateTime<Utc>) -> bool {
        self.reasoning.record(step, now)
    }

    pub(crate) fn append_ui(&mut self, payload: Value, now: DateTime<Utc>) {
        self.append(NewMessage::ui(payload), now);
    }

    /// Connection-level failure: surfaced as a visible entry, partial reply
    /// discarded, flags back to idle
    pub fn fail_turn(&mut self, text: &str, now: DateTime<Utc>) {
        self.connection_status = ConnectionStatus::errored();
        self.assistant.clear();
        self.reasoning.complete(now);
        self.append(NewMessage::error(text, Sender::System), now);
        self.is_loading = false;
        self.is_sending = false;
    }

    pub(crate) fn abort_turn(&mut self) {
        self.connection_status = ConnectionStatus::closed();
        self.is_sending = false;
        self.is_loading = false;
        self.reasoning.halt();
    }

    pub(crate) fn apply_ready_state(&mut self, ready_state: ReadyState) {
        self.connection_status = ConnectionStatus::for_ready_state(ready_state);
        if ready_state == ReadyState::Closed {
            self.is_sending = false;
        }
    }

    /// Move the buffer into the log and freeze reasoning. Safe to repeat:
    /// an empty buffer appends nothing and a completed cycle is not
    /// materialized twice.
    pub fn finalize_turn(&mut self, now: DateTime<Utc>) -> Option<&Message> {
        let (text, trace_id) = self.assistant.take();

        if self.reasoning.complete(now) && self.reasoning.should_materialize() {
            let snapshot = self.reasoning.clone();
            self.append(NewMessage::reasoning(snapshot), now);
        }

        self.is_sending = false;
        self.is_loading = false;
        self.connection_status = ConnectionStatus::ready();

        if text.is_empty() {
            None
        } else {
            Some(self.append(NewMessage::assistant_reply(text, trace_id), now))
        }
    }

    /// The body ended without `stream_end`. Whatever arrived is kept as
    /// the reply and the store goes idle; the status shows the closed
    /// connection rather than "Ready".
    pub fn close_unterminated_turn(&mut self, now: DateTime<Utc>) -> bool {
        let appended = self.finalize_turn(now).is_some();
        self.connection_status = ConnectionStatus::closed();
        appended
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn begin_history_load(&mut self) {
        self.is_loading = true;
    }

    /// Replace the whole log in one step
    pub fn hydrate(&mut self, drafts: Vec<NewMessage>, now: DateTime<Utc>) {
        let messages = drafts
            .into_iter()
            .map(|draft| draft.into_message(self.ids.next_id(), now))
            .collect();
        self.messages = messages;
        self.is_loading = false;
    }

    pub fn history_failed(&mut self, text: &str, now: DateTime<Utc>) {
        self.append(NewMessage::error(text, Sender::System), now);
        self.is_loading = false;
    }

    fn append(&mut self, draft: NewMessage, now: DateTime<Utc>) -> &Message {
        let message = draft.into_message(self.ids.next_id(), now);
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::with_sequential_ids()
    }
}
