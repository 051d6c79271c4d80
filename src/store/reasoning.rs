//! Reasoning tracker
//!
//! Models the thinking -> responding -> completed lifecycle of one assistant
//! turn together with its timestamped timeline. Once `Completed`, the timeline
//! and duration are frozen.

use super::state::status_text;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningPhase {
    #[default]
    Thinking,
    Responding,
    Completed,
}

impl ReasoningPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasoningPhase::Thinking => "thinking",
            ReasoningPhase::Responding => "responding",
            ReasoningPhase::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningEventKind {
    ToolCall,
    ToolResult,
    StateChange,
}

/// What happened at one point of the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum ReasoningStep {
    ToolCall { name: String, args: Value },
    ToolResult { tool_name: String, content: String },
    StateChange(ReasoningPhase),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub step: ReasoningStep,
}

impl ReasoningEvent {
    pub fn kind(&self) -> ReasoningEventKind {
        match self.step {
            ReasoningStep::ToolCall { .. } => ReasoningEventKind::ToolCall,
            ReasoningStep::ToolResult { .. } => ReasoningEventKind::ToolResult,
            ReasoningStep::StateChange(_) => ReasoningEventKind::StateChange,
        }
    }

    /// One line of the expanded timeline
    pub fn describe(&self) -> String {
        match &self.step {
            ReasoningStep::ToolCall { name, args } => format!("Tool call: {name}({args})"),
            ReasoningStep::ToolResult { tool_name, content } => {
                format!("Tool result: {tool_name} - {content}")
            }
            ReasoningStep::StateChange(phase) => format!("State: {}", phase.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningProcess {
    pub is_active: bool,
    pub phase: ReasoningPhase,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: u64,
    pub timeline: Vec<ReasoningEvent>,
    pub is_expanded: bool,
}

impl ReasoningProcess {
    /// Fresh cycle for a new turn
    pub fn begin(now: DateTime<Utc>) -> Self {
        Self {
            is_active: true,
            phase: ReasoningPhase::Thinking,
            start_time: Some(now),
            ..Self::default()
        }
    }

    pub fn is_completed(&self) -> bool {
        self.phase == ReasoningPhase::Completed
    }

    /// Append to the timeline. Ignored once completed.
    pub fn record(&mut self, step: ReasoningStep, now: DateTime<Utc>) -> bool {
        if self.is_completed() {
            return false;
        }
        self.timeline.push(ReasoningEvent { timestamp: now, step });
        true
    }

    /// First reply text arrived. Marks the switch on the timeline only when
    /// tool activity came before it.
    pub fn enter_responding(&mut self, now: DateTime<Utc>) {
        if self.phase != ReasoningPhase::Thinking {
            return;
        }
        if !self.timeline.is_empty() {
            self.record(ReasoningStep::StateChange(ReasoningPhase::Responding), now);
        }
        self.phase = ReasoningPhase::Responding;
    }

    /// Freeze the cycle. Returns false if it was already completed, in which
    /// case nothing is recomputed.
    pub fn complete(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_completed() {
            return false;
        }
        let start = *self.start_time.get_or_insert(now);
        self.end_time = Some(now);
        self.duration_seconds = rounded_seconds(start, now);
        self.phase = ReasoningPhase::Completed;
        self.is_active = false;
        true
    }

    pub fn halt(&mut self) {
        self.is_active = false;
    }

    /// Whether a completed cycle is worth showing as its own log entry
    pub fn should_materialize(&self) -> bool {
        !self.timeline.is_empty() || self.duration_seconds > 0
    }

    /// Expansion only applies to a completed cycle with something to show
    pub fn toggle_expanded(&mut self) -> bool {
        if !self.is_completed() || self.timeline.is_empty() {
            return false;
        }
        self.is_expanded = !self.is_expanded;
        true
    }

    pub fn headline(&self) -> String {
        match self.phase {
            ReasoningPhase::Thinking => status_text::THINKING.to_string(),
            ReasoningPhase::Responding => status_text::RESPONDING.to_string(),
            ReasoningPhase::Completed => format!("Thought for {} seconds", self.duration_seconds),
        }
    }
}

/// `round((end - start) / 1000)` on milliseconds, clamped at zero
fn rounded_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    let millis = (end - start).num_milliseconds().max(0);
    u64::try_from((millis + 500) / 1000).unwrap_or(0)
}
