//! Property-based tests for the conversation store
//!
//! These tests verify key invariants hold across arbitrary event sequences.

use super::*;
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Test Helpers
// ============================================================================

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn assistant_replies(store: &ConversationStore) -> usize {
    store
        .messages()
        .iter()
        .filter(|m| m.sender == Sender::Assistant && m.message_type == MessageType::Message)
        .count()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,12}"
}

fn arb_ready_state() -> impl Strategy<Value = ReadyState> {
    prop_oneof![
        Just(ReadyState::Connecting),
        Just(ReadyState::Open),
        Just(ReadyState::Closed),
    ]
}

/// Any event that can arrive mid-turn, excluding the terminal ones
fn arb_mid_turn_event() -> impl Strategy<Value = StreamEvent> {
    prop_oneof![
        Just(StreamEvent::Open),
        (arb_text(), proptest::option::of("[a-f0-9]{8}"))
            .prop_map(|(content, trace_id)| StreamEvent::AiMessage { content, trace_id }),
        arb_text().prop_map(|content| StreamEvent::Token { content }),
        "[a-z]{3,8}".prop_map(|name| StreamEvent::ToolCall { name, args: json!({}) }),
        ("[a-z]{3,8}", arb_text())
            .prop_map(|(tool_name, content)| StreamEvent::ToolResult { tool_name, content }),
        arb_ready_state().prop_map(|ready_state| StreamEvent::ReadyStateChange { ready_state }),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_finalization_is_idempotent(
        events in proptest::collection::vec(arb_mid_turn_event(), 0..20),
        repeats in 2usize..5,
    ) {
        let mut store = ConversationStore::default();
        store.begin_turn(t0());
        for event in events {
            transition(&mut store, event, t0());
        }

        let replies_before = assistant_replies(&store);
        for _ in 0..repeats {
            transition(&mut store, StreamEvent::StreamEnd, t0());
        }

        prop_assert!(assistant_replies(&store) <= replies_before + 1);
        prop_assert!(!store.is_sending());
        prop_assert!(!store.is_loading());
        prop_assert!(store.assistant().is_empty());
    }

    #[test]
    fn prop_reply_is_replace_then_appends(
        first in arb_text(),
        tokens in proptest::collection::vec(arb_text(), 0..10),
    ) {
        let mut store = ConversationStore::default();
        store.begin_turn(t0());
        transition(&mut store, StreamEvent::AiMessage { content: first.clone(), trace_id: None }, t0());
        for token in &tokens {
            transition(&mut store, StreamEvent::Token { content: token.clone() }, t0());
        }
        transition(&mut store, StreamEvent::StreamEnd, t0());

        let expected: String = std::iter::once(first).chain(tokens).collect();
        let reply = store.messages().iter().find(|m| m.message_type == MessageType::Message);
        if expected.is_empty() {
            prop_assert!(reply.is_none());
        } else {
            prop_assert_eq!(reply.map(|m| m.content.clone()), Some(MessageContent::Text(expected)));
        }
    }

    #[test]
    fn prop_trace_id_survives_tokens(
        trace_id in "[a-f0-9]{8}",
        tokens in proptest::collection::vec("[a-z]{1,5}", 0..15),
    ) {
        let mut store = ConversationStore::default();
        store.begin_turn(t0());
        transition(&mut store, StreamEvent::AiMessage { content: "x".into(), trace_id: Some(trace_id.clone()) }, t0());
        for content in tokens {
            transition(&mut store, StreamEvent::Token { content }, t0());
        }
        transition(&mut store, StreamEvent::StreamEnd, t0());

        let reply = store.messages().last().unwrap();
        prop_assert_eq!(reply.trace_id.as_deref(), Some(trace_id.as_str()));
    }

    #[test]
    fn prop_duration_is_rounded_elapsed_seconds(elapsed_ms in 0i64..600_000) {
        let mut store = ConversationStore::default();
        store.begin_turn(t0());
        let end = t0() + Duration::milliseconds(elapsed_ms);

        transition(&mut store, StreamEvent::StreamEnd, end);

        let reasoning = store.reasoning();
        prop_assert_eq!(reasoning.phase, ReasoningPhase::Completed);
        prop_assert_eq!(reasoning.end_time, Some(end));
        let expected = u64::try_from((elapsed_ms + 500) / 1000).unwrap();
        prop_assert_eq!(reasoning.duration_seconds, expected);
    }

    #[test]
    fn prop_timeline_frozen_after_completion(
        before in proptest::collection::vec(arb_mid_turn_event(), 0..10),
        after in proptest::collection::vec(arb_mid_turn_event(), 0..10),
    ) {
        let mut store = ConversationStore::default();
        store.begin_turn(t0());
        for event in before {
            transition(&mut store, event, t0());
        }
        transition(&mut store, StreamEvent::StreamEnd, t0());
        let frozen = store.reasoning().clone();

        for event in after {
            transition(&mut store, event, t0() + Duration::seconds(30));
        }

        prop_assert_eq!(&store.reasoning().timeline, &frozen.timeline);
        prop_assert_eq!(store.reasoning().duration_seconds, frozen.duration_seconds);
    }

    #[test]
    fn prop_error_never_finalizes_partial_reply(
        events in proptest::collection::vec(arb_mid_turn_event(), 0..15),
        message in "[a-z ]{1,20}",
    ) {
        let mut store = ConversationStore::default();
        store.begin_turn(t0());
        for event in events {
            transition(&mut store, event, t0());
        }

        transition(&mut store, StreamEvent::Error { content: message }, t0());
        transition(&mut store, StreamEvent::StreamEnd, t0());

        prop_assert_eq!(assistant_replies(&store), 0);
        let errors = store.messages().iter().filter(|m| m.message_type == MessageType::Error).count();
        prop_assert_eq!(errors, 1);
        prop_assert!(!store.is_sending());
        prop_assert!(!store.is_loading());
    }
}
