//! Transport abstraction
//!
//! The session client talks to the backend only through [`Transport`], so
//! tests can drive it with a scripted in-memory stream.

mod error;
mod http;

#[cfg(test)]
pub mod testing;

pub use error::{TransportError, TransportErrorKind};
pub use http::HttpTransport;

use crate::sse::SseFrame;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;
use std::sync::Arc;

/// Frames of one open connection, in arrival order
pub type FrameStream = BoxStream<'static, Result<SseFrame, TransportError>>;

/// Which conversation thread the requests address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRoute {
    pub user_id: String,
    pub thread_id: String,
}

impl ThreadRoute {
    pub fn new(user_id: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            thread_id: thread_id.into(),
        }
    }

    /// `/chat/{user}/thread/{thread}`: history stream
    pub fn thread_path(&self) -> String {
        format!("/chat/{}/thread/{}", self.user_id, self.thread_id)
    }

    pub fn stream_path(&self) -> String {
        format!("{}/stream", self.thread_path())
    }

    pub fn feedback_path(&self) -> String {
        format!("{}/feedback", self.thread_path())
    }
}

/// Body of a turn submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnRequest {
    pub message: String,
}

/// User rating of one reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Negative,
    Positive,
}

impl Feedback {
    pub fn score(self) -> u8 {
        match self {
            Feedback::Negative => 0,
            Feedback::Positive => 1,
        }
    }
}

/// Body of a feedback submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackRequest {
    pub feedback: u8,
    pub trace_id: String,
}

impl FeedbackRequest {
    pub fn new(trace_id: impl Into<String>, feedback: Feedback) -> Self {
        Self {
            feedback: feedback.score(),
            trace_id: trace_id.into(),
        }
    }
}

/// Backend calls used by a conversation session
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a user message and open its reply stream
    async fn open_turn(
        &self,
        route: &ThreadRoute,
        token: &str,
        request: &TurnRequest,
    ) -> Result<FrameStream, TransportError>;

    /// Open the terminating stream of historical events
    async fn open_history(&self, route: &ThreadRoute, token: &str) -> Result<FrameStream, TransportError>;

    /// Attach a rating to a reply
    async fn submit_feedback(
        &self,
        route: &ThreadRoute,
        token: &str,
        request: &FeedbackRequest,
    ) -> Result<(), TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn open_turn(
        &self,
        route: &ThreadRoute,
        token: &str,
        request: &TurnRequest,
    ) -> Result<FrameStream, TransportError> {
        (**self).open_turn(route, token, request).await
    }

    async fn open_history(&self, route: &ThreadRoute, token: &str) -> Result<FrameStream, TransportError> {
        (**self).open_history(route, token).await
    }

    async fn submit_feedback(
        &self,
        route: &ThreadRoute,
        token: &str,
        request: &FeedbackRequest,
    ) -> Result<(), TransportError> {
        (**self).submit_feedback(route, token, request).await
    }
}
