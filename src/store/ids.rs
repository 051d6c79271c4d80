//! Message id generation

use std::fmt;

/// Source of log entry ids, injected into the store
pub trait IdGenerator: Send + Sync + fmt::Debug {
    fn next_id(&mut self) -> String;
}

/// Monotonic `msg-1`, `msg-2`, ... ids
#[derive(Debug, Default)]
pub struct SequentialIds {
    issued: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        self.issued += 1;
        format!("msg-{}", self.issued)
    }
}

/// Random v4 UUIDs
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
