//! Mock transport for testing
//!
//! Each open call pops the next scripted connection. Frames for a scripted
//! connection can be queued up front or pushed later through a channel.

use super::{FeedbackRequest, FrameStream, ThreadRoute, Transport, TransportError, TurnRequest};
use crate::sse::SseFrame;
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

type Scripted = Result<UnboundedReceiverStream<Result<SseFrame, TransportError>>, TransportError>;

/// Sender side of a scripted connection
pub type FrameSender = mpsc::UnboundedSender<Result<SseFrame, TransportError>>;

/// One request seen by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedRequest {
    Turn {
        route: ThreadRoute,
        token: String,
        message: String,
    },
    History {
        route: ThreadRoute,
        token: String,
    },
    Feedback {
        route: ThreadRoute,
        token: String,
        body: FeedbackRequest,
    },
}

/// Drops with the stream that owns it
struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scripted transport that records every request
#[derive(Default)]
pub struct MockTransport {
    turns: Mutex<VecDeque<Scripted>>,
    history: Mutex<VecDeque<Scripted>>,
    feedback: Mutex<VecDeque<Result<(), TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    live: Arc<AtomicUsize>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn channel(frames: Vec<SseFrame>) -> (FrameSender, Scripted) {
        let (tx, rx) = mpsc::unbounded_channel();
        for frame in frames {
            let _ = tx.send(Ok(frame));
        }
        (tx, Ok(UnboundedReceiverStream::new(rx)))
    }

    /// Queue a turn whose stream yields `frames` and then ends
    pub fn queue_turn_frames(&self, frames: Vec<SseFrame>) {
        let (_, scripted) = Self::channel(frames);
        self.turns.lock().unwrap().push_back(scripted);
    }

    /// Queue a turn that stays open until the returned sender is dropped
    pub fn queue_turn_channel(&self) -> FrameSender {
        let (tx, scripted) = Self::channel(Vec::new());
        self.turns.lock().unwrap().push_back(scripted);
        tx
    }

    pub fn queue_turn_error(&self, error: TransportError) {
        self.turns.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_history_frames(&self, frames: Vec<SseFrame>) {
        let (_, scripted) = Self::channel(frames);
        self.history.lock().unwrap().push_back(scripted);
    }

    pub fn queue_history_channel(&self) -> FrameSender {
        let (tx, scripted) = Self::channel(Vec::new());
        self.history.lock().unwrap().push_back(scripted);
        tx
    }

    pub fn queue_history_error(&self, error: TransportError) {
        self.history.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_feedback_result(&self, result: Result<(), TransportError>) {
        self.feedback.lock().unwrap().push_back(result);
    }

    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Streams handed out and not yet dropped
    pub fn live_streams(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn open(&self, scripted: Option<Scripted>) -> Result<FrameStream, TransportError> {
        let stream = scripted.unwrap_or_else(|| Err(TransportError::connect("No mock stream queued")))?;
        let guard = LiveGuard::new(&self.live);
        Ok(stream
            .map(move |item| {
                let _live = &guard;
                item
            })
            .boxed())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open_turn(
        &self,
        route: &ThreadRoute,
        token: &str,
        request: &TurnRequest,
    ) -> Result<FrameStream, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest::Turn {
            route: route.clone(),
            token: token.to_string(),
            message: request.message.clone(),
        });
        let scripted = self.turns.lock().unwrap().pop_front();
        self.open(scripted)
    }

    async fn open_history(&self, route: &ThreadRoute, token: &str) -> Result<FrameStream, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest::History {
            route: route.clone(),
            token: token.to_string(),
        });
        let scripted = self.history.lock().unwrap().pop_front();
        self.open(scripted)
    }

    async fn submit_feedback(
        &self,
        route: &ThreadRoute,
        token: &str,
        request: &FeedbackRequest,
    ) -> Result<(), TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest::Feedback {
            route: route.clone(),
            token: token.to_string(),
            body: request.clone(),
        });
        self.feedback.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}
