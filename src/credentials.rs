//! Credential storage
//!
//! The bearer token lives in a key-value store. It is read fresh for every
//! connection, so a token written mid-session takes effect on the next turn.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

/// Key under which the bearer token is stored
pub const AUTH_TOKEN_KEY: &str = "authToken";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no credential stored under {0}")]
    Missing(String),
    #[error("credential store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("credential store is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Key-value credential lookup
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// The stored bearer token. Never substituted with a placeholder.
    fn bearer_token(&self) -> Result<String, CredentialError> {
        self.get(AUTH_TOKEN_KEY)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| CredentialError::Missing(AUTH_TOKEN_KEY.to_string()))
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(AUTH_TOKEN_KEY, token);
        store
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.into(), value.into());
        }
    }

    pub fn remove(&self, key: &str) {
        if let Ok(mut values) = self.values.write() {
            values.remove(key);
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }
}

/// JSON object on disk, e.g. `{"authToken": "..."}`
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>, CredentialError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(Map::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read-modify-write of a single key
    pub fn set(&self, key: &str, value: &str) -> Result<(), CredentialError> {
        let mut values = self.load()?;
        values.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&values)?;
        std::fs::write(&self.path, raw)?;
        tracing::info!(path = %self.path.display(), key, "Stored credential");
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(values) => values.get(key).and_then(Value::as_str).map(str::to_string),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read credentials");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_bearer_token() {
        let store = MemoryCredentialStore::new();
        assert!(matches!(store.bearer_token(), Err(CredentialError::Missing(_))));

        store.set(AUTH_TOKEN_KEY, "secret");
        assert_eq!(store.bearer_token().unwrap(), "secret");

        store.set(AUTH_TOKEN_KEY, "");
        assert!(store.bearer_token().is_err());
    }

    #[test]
    fn test_file_store_round_trip_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"theme":"dark"}"#).unwrap();
        let store = FileCredentialStore::new(&path);

        store.set(AUTH_TOKEN_KEY, "abc").unwrap();

        assert_eq!(store.bearer_token().unwrap(), "abc");
        assert_eq!(store.get("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn test_file_store_missing_file_has_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("absent.json"));

        assert_eq!(store.get(AUTH_TOKEN_KEY), None);
        assert!(matches!(store.bearer_token(), Err(CredentialError::Missing(_))));
    }

    #[test]
    fn test_file_store_malformed_file_reads_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();
        let store = FileCredentialStore::new(&path);

        assert_eq!(store.get(AUTH_TOKEN_KEY), None);
        assert!(matches!(store.set(AUTH_TOKEN_KEY, "x"), Err(CredentialError::Malformed(_))));
    }
}
