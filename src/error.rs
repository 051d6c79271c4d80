//! Crate-level error types

use thiserror::Error;

/// Rejected user action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("a reply is still streaming")]
    Busy,
}

/// Invalid client configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must not be empty")]
    Empty { name: &'static str },
    #[error("{name} is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{name} must start with http:// or https://: {value}")]
    InvalidUrl { name: &'static str, value: String },
    #[error("cannot locate credentials file: set CHATLINE_CREDENTIALS or HOME")]
    NoCredentialsPath,
}
