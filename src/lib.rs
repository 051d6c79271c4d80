//! Chatline - streaming chat session client
//!
//! Drives one conversation thread against a server-push chat backend:
//! sends turns, folds the streamed reply fragments into an observable
//! conversation store, replays thread history and posts reply feedback.

#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::return_self_not_must_use
)]

pub mod codec;
pub mod config;
pub mod credentials;
pub mod error;
pub mod history;
pub mod session;
pub mod sse;
pub mod store;
pub mod transport;

pub use config::ClientConfig;
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore, AUTH_TOKEN_KEY};
pub use error::{ConfigError, SessionError};
pub use session::SessionClient;
pub use store::{ConversationStore, StoreHandle};
pub use transport::{Feedback, HttpTransport, ThreadRoute, Transport, TransportError};
