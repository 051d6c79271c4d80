//! Transport error types

use thiserror::Error;

/// Transport error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    /// HTTP status, for `Status` errors
    pub status: Option<u16>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    /// Non-success response; `body` is kept verbatim as the message
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::new(TransportErrorKind::Status, body)
        }
    }

    pub fn read(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Read, message)
    }

    pub fn credential(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Credential, message)
    }
}

/// Where a request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Could not reach the backend or build the request
    Connect,
    /// The backend answered with a non-success status
    Status,
    /// The stream broke after it was opened
    Read,
    /// No bearer token available
    Credential,
}
