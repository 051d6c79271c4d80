//! reqwest-backed transport

use super::{FeedbackRequest, FrameStream, ThreadRoute, Transport, TransportError, TurnRequest};
use crate::sse;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

/// HTTP client for the chat backend
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a client. Only connection setup is bounded by `connect_timeout`;
    /// reply streams may stay open indefinitely.
    pub fn new(base_url: impl Into<String>, connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::connect(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(request: RequestBuilder) -> Result<Response, TransportError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::connect(format!("Request timeout: {e}"))
            } else {
                TransportError::connect(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        // The body is surfaced as-is; the caller extracts display text from it
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "Backend rejected request");
        Err(TransportError::status(status.as_u16(), body))
    }

    fn event_stream(request: RequestBuilder) -> RequestBuilder {
        request
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
    }

    fn frames(response: Response) -> FrameStream {
        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::read(format!("Stream read failed: {e}"))));
        sse::frames(Box::pin(bytes)).boxed()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open_turn(
        &self,
        route: &ThreadRoute,
        token: &str,
        request: &TurnRequest,
    ) -> Result<FrameStream, TransportError> {
        let url = self.url(&route.stream_path());
        tracing::debug!(%url, "Opening turn stream");
        let builder = self.client.post(&url).bearer_auth(token).json(request);
        let response = Self::send(Self::event_stream(builder)).await?;
        Ok(Self::frames(response))
    }

    async fn open_history(&self, route: &ThreadRoute, token: &str) -> Result<FrameStream, TransportError> {
        let url = self.url(&route.thread_path());
        tracing::debug!(%url, "Opening history stream");
        let builder = self.client.get(&url).bearer_auth(token);
        let response = Self::send(Self::event_stream(builder)).await?;
        Ok(Self::frames(response))
    }

    async fn submit_feedback(
        &self,
        route: &ThreadRoute,
        token: &str,
        request: &FeedbackRequest,
    ) -> Result<(), TransportError> {
        let url = self.url(&route.feedback_path());
        let builder = self.client.post(&url).bearer_auth(token).json(request);
        Self::send(builder).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let transport = HttpTransport::new("http://localhost:8000/api/v1/", Duration::from_secs(5)).unwrap();

        assert_eq!(transport.base_url(), "http://localhost:8000/api/v1");
        assert_eq!(
            transport.url(&ThreadRoute::new("1", "2").stream_path()),
            "http://localhost:8000/api/v1/chat/1/thread/2/stream"
        );
    }
}
