//! Client configuration
//!
//! Read from `CHATLINE_*` environment variables with local-development
//! defaults.

use crate::error::ConfigError;
use crate::transport::ThreadRoute;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_USER_ID: &str = "1";
pub const DEFAULT_THREAD_ID: &str = "1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub route: ThreadRoute,
    pub credentials_path: PathBuf,
    pub connect_timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let base_url = var("CHATLINE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl {
                name: "CHATLINE_BASE_URL",
                value: base_url,
            });
        }

        let user_id = var("CHATLINE_USER_ID").unwrap_or_else(|| DEFAULT_USER_ID.to_string());
        let thread_id = var("CHATLINE_THREAD_ID").unwrap_or_else(|| DEFAULT_THREAD_ID.to_string());

        let credentials_path = match var("CHATLINE_CREDENTIALS") {
            Some(path) => PathBuf::from(path),
            None => var("HOME")
                .map(|home| PathBuf::from(home).join(".chatline").join("credentials.json"))
                .ok_or(ConfigError::NoCredentialsPath)?,
        };

        let timeout_secs = match var("CHATLINE_REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::Empty {
                        name: "CHATLINE_REQUEST_TIMEOUT_SECS",
                    })
                }
                Ok(secs) => secs,
                Err(_) => {
                    return Err(ConfigError::InvalidNumber {
                        name: "CHATLINE_REQUEST_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url,
            route: ThreadRoute::new(user_id, thread_id),
            credentials_path,
            connect_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
