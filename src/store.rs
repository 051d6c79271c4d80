//! Conversation store
//!
//! The canonical session state and the pure transition function that folds
//! decoded stream events into it. Nothing in here knows about the transport.

mod effect;
pub mod event;
mod handle;
mod ids;
mod message;
mod reasoning;
mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{HistoryEvent, ReadyState, StreamEvent};
pub use handle::StoreHandle;
pub use ids::{IdGenerator, SequentialIds, UuidIds};
pub use message::{class_names, Message, MessageContent, MessageType, NewMessage, Sender};
pub use reasoning::{ReasoningEvent, ReasoningEventKind, ReasoningPhase, ReasoningProcess, ReasoningStep};
pub use state::{status_text, AssistantBuffer, ConnectionPhase, ConnectionStatus, ConversationStore};
pub use transition::{transition, TransitionResult};
