//! History loader
//!
//! Historical events are buffered without touching the live store, then
//! replayed into the log in one replace when the stream terminates.

use crate::codec::{self, HistoryFrame};
use crate::credentials::CredentialStore;
use crate::session::{open_failure_text, Link};
use crate::store::{class_names, status_text, HistoryEvent, MessageContent, MessageType, NewMessage, Sender};
use crate::transport::{ThreadRoute, Transport, TransportError};
use chrono::Utc;
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;

/// Ordered buffer of replayed events
#[derive(Debug, Default)]
pub struct HistoryLoader {
    events: Vec<HistoryEvent>,
}

impl HistoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: HistoryEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Log entries in arrival order
    pub fn into_messages(self) -> Vec<NewMessage> {
        self.events.into_iter().map(replay_message).collect()
    }
}

/// Map one historical event to a log entry
pub fn replay_message(event: HistoryEvent) -> NewMessage {
    match event {
        HistoryEvent::HumanMessage { content } => NewMessage::user(content),
        HistoryEvent::AiMessage { content, trace_id } => NewMessage::assistant_reply(content, trace_id),
        HistoryEvent::ToolCall { name, args } => NewMessage::new(
            format!("Tool call: {name}({args})"),
            Sender::Assistant,
            MessageType::ToolCall,
        )
        .with_class(class_names::TOOL_CALL),
        HistoryEvent::ToolResult { tool_name, content } => NewMessage::new(
            format!("{tool_name}: {content}"),
            Sender::Assistant,
            MessageType::ToolResult,
        )
        .with_class(class_names::TOOL_CALL),
        HistoryEvent::Ui { payload } => {
            let content = match payload.get("content").and_then(Value::as_str) {
                Some(text) => MessageContent::Text(text.to_string()),
                None => MessageContent::Structured(payload),
            };
            NewMessage::new(content, Sender::System, MessageType::Message).with_class(class_names::UI_MESSAGE)
        }
    }
}

/// Drain the history stream of `route` and hydrate the store
pub(crate) async fn run<T: Transport + ?Sized>(
    transport: Arc<T>,
    credentials: Arc<dyn CredentialStore>,
    route: ThreadRoute,
    link: Link,
) {
    let opened = match credentials.bearer_token() {
        Ok(token) => transport.open_history(&route, &token).await,
        Err(e) => Err(TransportError::credential(e.to_string())),
    };
    let mut frames = match opened {
        Ok(frames) => frames,
        Err(e) => {
            tracing::error!(generation = link.generation(), kind = ?e.kind, error = %e, "Failed to open history stream");
            let text = open_failure_text(&e);
            link.apply(|store| store.history_failed(&text, Utc::now()));
            return;
        }
    };

    let mut loader = HistoryLoader::new();
    while let Some(item) = frames.next().await {
        let frame = match item {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(generation = link.generation(), error = %e, "History stream read failed");
                link.apply(|store| store.history_failed(status_text::RECEIVE_ERROR, Utc::now()));
                return;
            }
        };
        match codec::decode_history_frame(&frame) {
            HistoryFrame::Event(event) => loader.push(event),
            HistoryFrame::End => break,
            HistoryFrame::Failed(text) => {
                tracing::error!(generation = link.generation(), error = %text, "History stream reported error");
                link.apply(|store| store.history_failed(&text, Utc::now()));
                return;
            }
            HistoryFrame::Ignored => {}
        }
    }
    drop(frames);

    let count = loader.len();
    let drafts = loader.into_messages();
    if link.apply(|store| store.hydrate(drafts, Utc::now())) {
        tracing::info!(generation = link.generation(), messages = count, "History loaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;
    use crate::session::SessionClient;
    use crate::sse::SseFrame;
    use crate::store::{ConversationStore, StoreHandle};
    use crate::transport::testing::MockTransport;
    use serde_json::json;

    fn client(mock: &Arc<MockTransport>) -> SessionClient<MockTransport> {
        SessionClient::new(
            Arc::clone(mock),
            Arc::new(MemoryCredentialStore::with_token("secret")),
            ThreadRoute::new("103", "7"),
            StoreHandle::default(),
        )
    }

    #[test]
    fn test_replay_mapping() {
        let tool_call = replay_message(HistoryEvent::ToolCall {
            name: "weather".into(),
            args: json!({"city": "Kyiv"}),
        });
        assert_eq!(tool_call.sender, Sender::Assistant);
        assert_eq!(tool_call.message_type, MessageType::ToolCall);
        assert_eq!(tool_call.content, MessageContent::Text(r#"Tool call: weather({"city":"Kyiv"})"#.into()));

        let tool_result = replay_message(HistoryEvent::ToolResult {
            tool_name: "weather".into(),
            content: "sunny".into(),
        });
        assert_eq!(tool_result.message_type, MessageType::ToolResult);
        assert_eq!(tool_result.content, MessageContent::Text("weather: sunny".into()));

        let ai = replay_message(HistoryEvent::AiMessage {
            content: "hello".into(),
            trace_id: Some("t1".into()),
        });
        assert_eq!(ai.trace_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_ui_replay_uses_best_effort_content() {
        let with_text = replay_message(HistoryEvent::Ui {
            payload: json!({"type": "ui", "content": "card shown"}),
        });
        let without_text = replay_message(HistoryEvent::Ui {
            payload: json!({"component": "card"}),
        });

        assert_eq!(with_text.sender, Sender::System);
        assert_eq!(with_text.message_type, MessageType::Message);
        assert_eq!(with_text.content, MessageContent::Text("card shown".into()));
        assert_eq!(without_text.content, MessageContent::Structured(json!({"component": "card"})));
    }

    #[tokio::test]
    async fn test_history_replaces_log_in_order() {
        let mock = Arc::new(MockTransport::new());
        mock.queue_history_frames(vec![
            SseFrame::new("human_message", r#"{"content":"hi"}"#),
            SseFrame::new("ai_message", r#"{"content":"hello","trace_id":"t1"}"#),
            SseFrame::new("token", r#"{"content":"ignored"}"#),
            SseFrame::new("stream_end", "{}"),
        ]);
        let mut client = client(&mock);
        client.store().update(|store| {
            store.add_user_message("stale entry", Utc::now());
        });

        client.load_history();
        assert!(client.store().read(ConversationStore::is_loading));
        client.wait().await;

        client.store().read(|store| {
            let log: Vec<_> = store.messages().iter().map(|m| (m.sender, m.content.clone())).collect();
            assert_eq!(
                log,
                vec![
                    (Sender::User, MessageContent::Text("hi".into())),
                    (Sender::Assistant, MessageContent::Text("hello".into())),
                ]
            );
            assert_eq!(store.messages()[1].trace_id.as_deref(), Some("t1"));
            assert!(!store.is_loading());
        });
        assert_eq!(mock.live_streams(), 0);
    }

    #[tokio::test]
    async fn test_history_is_buffered_until_end() {
        let mock = Arc::new(MockTransport::new());
        let tx = mock.queue_history_channel();
        let mut client = client(&mock);

        client.load_history();
        tx.send(Ok(SseFrame::new("human_message", r#"{"content":"hi"}"#))).unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(client.store().read(|s| s.messages().is_empty()));

        drop(tx);
        client.wait().await;
        assert_eq!(client.store().read(|s| s.messages().len()), 1);
    }

    #[tokio::test]
    async fn test_history_failure_appends_error() {
        let mock = Arc::new(MockTransport::new());
        mock.queue_history_error(TransportError::status(404, r#"{"content":"thread not found"}"#));
        let mut client = client(&mock);

        client.load_history();
        client.wait().await;

        client.store().read(|store| {
            let last = store.messages().last().unwrap();
            assert_eq!(last.sender, Sender::System);
            assert_eq!(last.message_type, MessageType::Error);
            assert_eq!(last.content, MessageContent::Text("thread not found".into()));
            assert!(!store.is_loading());
        });
    }

    #[tokio::test]
    async fn test_history_error_frame_stops_replay() {
        let mock = Arc::new(MockTransport::new());
        mock.queue_history_frames(vec![
            SseFrame::new("human_message", r#"{"content":"hi"}"#),
            SseFrame::new("error", r#"{"content":"db offline"}"#),
        ]);
        let mut client = client(&mock);

        client.load_history();
        client.wait().await;

        client.store().read(|store| {
            assert_eq!(store.messages().len(), 1);
            assert_eq!(store.messages()[0].content, MessageContent::Text("db offline".into()));
        });
    }
}
