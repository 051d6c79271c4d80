//! Effects produced by state transitions

/// Follow-up work for the connection that delivered an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Stop reading and drop the connection
    CloseConnection,

    /// A reply was moved from the buffer into the log
    ReplyFinalized {
        message_id: String,
        trace_id: Option<String>,
    },

    /// A visible error entry was appended
    ErrorSurfaced { message: String },
}

impl Effect {
    pub fn reply_finalized(message_id: impl Into<String>, trace_id: Option<String>) -> Self {
        Effect::ReplyFinalized {
            message_id: message_id.into(),
            trace_id,
        }
    }

    pub fn error_surfaced(message: impl Into<String>) -> Self {
        Effect::ErrorSurfaced {
            message: message.into(),
        }
    }

    pub fn closes_connection(&self) -> bool {
        matches!(self, Effect::CloseConnection)
    }
}
