//! Pure state transition function
//!
//! One exhaustive match maps every inbound stream event to a store update.
//! The only inputs are the current store, the event, and the clock reading,
//! so the same inputs always yield the same state and effects.

use super::{ConversationStore, Effect, ReasoningStep, StreamEvent};
use chrono::{DateTime, Utc};

/// Result of a state transition
#[derive(Debug, Default)]
pub struct TransitionResult {
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn closes_connection(&self) -> bool {
        self.effects.iter().any(Effect::closes_connection)
    }
}

/// Apply one live-turn event to the store
pub fn transition(store: &mut ConversationStore, event: StreamEvent, now: DateTime<Utc>) -> TransitionResult {
    match event {
        StreamEvent::Open => {
            store.mark_connected();
            TransitionResult::new()
        }

        // Replace, never append: the first full or partial payload of a reply
        StreamEvent::AiMessage { content, trace_id } => {
            store.replace_assistant_text(content, trace_id);
            TransitionResult::new()
        }

        StreamEvent::Token { content } => {
            store.append_assistant_text(&content, now);
            TransitionResult::new()
        }

        StreamEvent::ToolCall { name, args } => {
            store.record_reasoning(ReasoningStep::ToolCall { name, args }, now);
            TransitionResult::new()
        }

        StreamEvent::ToolResult { tool_name, content } => {
            store.record_reasoning(ReasoningStep::ToolResult { tool_name, content }, now);
            TransitionResult::new()
        }

        StreamEvent::Ui { payload } => {
            store.append_ui(payload, now);
            TransitionResult::new()
        }

        StreamEvent::Error { content } => {
            store.fail_turn(&content, now);
            TransitionResult::new()
                .with_effect(Effect::error_surfaced(content))
                .with_effect(Effect::CloseConnection)
        }

        StreamEvent::Abort => {
            store.abort_turn();
            TransitionResult::new()
        }

        StreamEvent::ReadyStateChange { ready_state } => {
            store.apply_ready_state(ready_state);
            TransitionResult::new()
        }

        StreamEvent::StreamEnd => {
            let finalized = store
                .finalize_turn(now)
                .map(|m| Effect::reply_finalized(m.id.clone(), m.trace_id.clone()));
            let result = match finalized {
                Some(effect) => TransitionResult::new().with_effect(effect),
                None => TransitionResult::new(),
            };
            result.with_effect(Effect::CloseConnection)
        }
    }
}
