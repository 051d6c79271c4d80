//! Streaming session client
//!
//! Owns the single connection of a conversation view. Every connection gets
//! a fresh generation number; events carrying a retired generation are
//! dropped, checked under the same lock that applies them.

use crate::codec;
use crate::credentials::CredentialStore;
use crate::error::SessionError;
use crate::history;
use crate::store::{
    status_text, transition, ConversationStore, Effect, ReadyState, StoreHandle, StreamEvent,
};
use crate::transport::{
    Feedback, FeedbackRequest, FrameStream, ThreadRoute, Transport, TransportError, TransportErrorKind,
    TurnRequest,
};
use chrono::Utc;
use futures::StreamExt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Generation value meaning "no connection is live"
const RETIRED: u64 = 0;

/// A connection task bound to one generation of the store
#[derive(Clone)]
pub(crate) struct Link {
    store: StoreHandle,
    live: Arc<AtomicU64>,
    generation: u64,
}

impl Link {
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    fn is_current(&self) -> bool {
        self.live.load(Ordering::SeqCst) == self.generation
    }

    /// Fold one event into the store. `None` when the connection has been
    /// superseded or closed.
    pub(crate) fn dispatch(&self, event: StreamEvent) -> Option<Vec<Effect>> {
        let kind = event.kind();
        let mut effects = None;
        self.store.update_if(|store| {
            if !self.is_current() {
                return false;
            }
            effects = Some(transition(store, event, Utc::now()).effects);
            true
        });

        match &effects {
            Some(effects) => {
                for effect in effects {
                    match effect {
                        Effect::ReplyFinalized { message_id, trace_id } => {
                            tracing::info!(generation = self.generation, message_id = %message_id, trace_id = ?trace_id, "Reply finalized");
                        }
                        Effect::ErrorSurfaced { message } => {
                            tracing::error!(generation = self.generation, error = %message, "Stream reported error");
                        }
                        Effect::CloseConnection => {}
                    }
                }
            }
            None => tracing::debug!(generation = self.generation, event = kind, "Dropping event from retired connection"),
        }
        effects
    }

    /// Apply a direct store update, guarded like `dispatch`
    pub(crate) fn apply(&self, f: impl FnOnce(&mut ConversationStore)) -> bool {
        self.store.update_if(|store| {
            if !self.is_current() {
                return false;
            }
            f(store);
            true
        })
    }
}

struct Connection {
    generation: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Client side of one conversation thread
///
/// Connection tasks are spawned on the ambient tokio runtime, so the methods
/// that open connections must be called from within one.
pub struct SessionClient<T: Transport + 'static> {
    transport: Arc<T>,
    credentials: Arc<dyn CredentialStore>,
    route: ThreadRoute,
    store: StoreHandle,
    live: Arc<AtomicU64>,
    next_generation: u64,
    connection: Option<Connection>,
}

impl<T: Transport + 'static> SessionClient<T> {
    pub fn new(
        transport: Arc<T>,
        credentials: Arc<dyn CredentialStore>,
        route: ThreadRoute,
        store: StoreHandle,
    ) -> Self {
        Self {
            transport,
            credentials,
            route,
            store,
            live: Arc::new(AtomicU64::new(RETIRED)),
            next_generation: RETIRED,
            connection: None,
        }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn route(&self) -> &ThreadRoute {
        &self.route
    }

    /// Whether a connection task is still running
    pub fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(|c| !c.task.is_finished())
    }

    /// Start a turn. Any open connection is closed first; failures to
    /// connect end up in the log, not in the return value.
    pub fn send_message(&mut self, text: &str) -> Result<(), SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        self.teardown();
        let link = self.activate();
        self.store.update(|store| store.begin_turn(Utc::now()));
        tracing::info!(generation = link.generation(), chars = text.chars().count(), "Sending message");

        let work = run_turn(
            Arc::clone(&self.transport),
            Arc::clone(&self.credentials),
            self.route.clone(),
            TurnRequest {
                message: text.to_string(),
            },
            link.clone(),
        );
        self.spawn(&link, work);
        Ok(())
    }

    /// Send the input draft as a user message
    pub fn submit_input(&mut self) -> Result<(), SessionError> {
        let (sending, draft) = self
            .store
            .read(|store| (store.is_sending(), store.input().trim().to_string()));
        if sending {
            return Err(SessionError::Busy);
        }
        if draft.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        self.store.update(|store| {
            store.add_user_message(&draft, Utc::now());
            store.clear_input();
        });
        self.send_message(&draft)
    }

    pub fn set_input(&self, text: impl Into<String>) {
        let text = text.into();
        self.store.update(|store| store.set_input(text));
    }

    /// Replace the log with the thread's stored history
    pub fn load_history(&mut self) {
        self.teardown();
        let link = self.activate();
        self.store.update(ConversationStore::begin_history_load);
        tracing::info!(generation = link.generation(), thread = %self.route.thread_id, "Loading history");

        let work = history::run(
            Arc::clone(&self.transport),
            Arc::clone(&self.credentials),
            self.route.clone(),
            link.clone(),
        );
        self.spawn(&link, work);
    }

    /// Drop the active connection. Store flags are left as they are.
    pub fn close_connection(&mut self) {
        self.teardown();
    }

    /// Wait for the active connection task to finish
    pub async fn wait(&mut self) {
        let Some(connection) = self.connection.as_mut() else {
            return;
        };
        if let Err(e) = (&mut connection.task).await {
            if e.is_panic() {
                tracing::error!(generation = connection.generation, error = %e, "Connection task panicked");
            }
        }
        self.connection = None;
    }

    /// Rate a reply. Failures are logged only.
    pub async fn submit_feedback(&self, trace_id: &str, feedback: Feedback) {
        let token = match self.credentials.bearer_token() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(trace_id, error = %e, "Skipping feedback without credentials");
                return;
            }
        };

        let request = FeedbackRequest::new(trace_id, feedback);
        match self.transport.submit_feedback(&self.route, &token, &request).await {
            Ok(()) => tracing::info!(trace_id, score = request.feedback, "Feedback submitted"),
            Err(e) => tracing::warn!(trace_id, error = %e, "Failed to submit feedback"),
        }
    }

    fn activate(&mut self) -> Link {
        self.next_generation += 1;
        self.live.store(self.next_generation, Ordering::SeqCst);
        Link {
            store: self.store.clone(),
            live: Arc::clone(&self.live),
            generation: self.next_generation,
        }
    }

    fn spawn(&mut self, link: &Link, work: impl Future<Output = ()> + Send + 'static) {
        let generation = link.generation();
        let cancel = CancellationToken::new();
        let cancelled = cancel.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                () = cancelled.cancelled() => {
                    tracing::debug!(generation, "Connection cancelled");
                }
                () = work => {}
            }
        });
        self.connection = Some(Connection {
            generation,
            cancel,
            task,
        });
    }

    fn teardown(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        // Retire under the store lock so no in-flight event lands afterwards
        let live = &self.live;
        self.store.update_if(|_| {
            live.store(RETIRED, Ordering::SeqCst);
            false
        });
        // The old stream is dropped when the aborted task is next polled, so
        // it may briefly outlive this call. Its generation is already
        // retired, so nothing it reads reaches the store.
        connection.cancel.cancel();
        connection.task.abort();
        tracing::debug!(generation = connection.generation, "Closed connection");
    }
}

impl<T: Transport + 'static> Drop for SessionClient<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Failure before any frame arrived. A missing token means no request was
/// made at all.
pub(crate) fn open_failure_text(error: &TransportError) -> String {
    match error.kind {
        TransportErrorKind::Status => codec::extract_error_text(Some(&error.message)),
        TransportErrorKind::Connect | TransportErrorKind::Read | TransportErrorKind::Credential => {
            status_text::CREATE_ERROR.to_string()
        }
    }
}

async fn run_turn<T: Transport + ?Sized>(
    transport: Arc<T>,
    credentials: Arc<dyn CredentialStore>,
    route: ThreadRoute,
    request: TurnRequest,
    link: Link,
) {
    link.dispatch(StreamEvent::ReadyStateChange {
        ready_state: ReadyState::Connecting,
    });

    let opened = match credentials.bearer_token() {
        Ok(token) => transport.open_turn(&route, &token, &request).await,
        Err(e) => Err(TransportError::credential(e.to_string())),
    };
    let frames = match opened {
        Ok(frames) => frames,
        Err(e) => {
            tracing::error!(generation = link.generation(), kind = ?e.kind, status = ?e.status, error = %e, "Failed to open turn stream");
            link.dispatch(StreamEvent::Error {
                content: open_failure_text(&e),
            });
            return;
        }
    };

    tracing::info!(generation = link.generation(), "Turn stream open");
    link.dispatch(StreamEvent::Open);
    pump(&link, frames).await;
}

/// Read frames in arrival order until the stream closes or a transition
/// asks for the connection to be closed
async fn pump(link: &Link, mut frames: FrameStream) {
    while let Some(item) = frames.next().await {
        match item {
            Ok(frame) => {
                let Some(event) = codec::decode_stream_event(&frame) else {
                    continue;
                };
                match link.dispatch(event) {
                    None => return,
                    Some(effects) if effects.iter().any(Effect::closes_connection) => {
                        tracing::debug!(generation = link.generation(), "Turn stream closed");
                        return;
                    }
                    Some(_) => {}
                }
            }
            Err(e) => {
                tracing::error!(generation = link.generation(), error = %e, "Turn stream read failed");
                link.dispatch(StreamEvent::Error {
                    content: status_text::RECEIVE_ERROR.to_string(),
                });
                return;
            }
        }
    }

    tracing::info!(generation = link.generation(), "Turn stream ended without stream_end");
    link.dispatch(StreamEvent::ReadyStateChange {
        ready_state: ReadyState::Closed,
    });
    link.apply(|store| {
        store.close_unterminated_turn(Utc::now());
    });
}
