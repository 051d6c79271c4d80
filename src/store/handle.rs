//! Shared, observable access to a conversation store

use super::state::ConversationStore;
use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable handle owned by the conversation view. Every mutation notifies
/// subscribers; readers borrow the current state without copying it.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    tx: Arc<watch::Sender<ConversationStore>>,
}

impl StoreHandle {
    pub fn new(store: ConversationStore) -> Self {
        let (tx, _rx) = watch::channel(store);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationStore> {
        self.tx.subscribe()
    }

    pub fn read<R>(&self, f: impl FnOnce(&ConversationStore) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn update(&self, f: impl FnOnce(&mut ConversationStore)) {
        self.tx.send_modify(f);
    }

    /// Mutate only when `f` returns true; subscribers are notified only then
    pub fn update_if(&self, f: impl FnOnce(&mut ConversationStore) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }
}

impl Default for StoreHandle {
    fn default() -> Self {
        Self::new(ConversationStore::default())
    }
}
