//! Event types for the Patter telemetry bus.
//!
//! `TurnEvent` is the unified event type broadcast during turn execution.
//! All variants are Clone + Send + Sync for use with tokio broadcast channels.
//! Publishing is fire-and-forget; no component ever blocks on a subscriber.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::search::ExhaustedCause;

/// Events emitted while processing a conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// A turn has started for a conversation.
    TurnStarted {
        turn_id: Uuid,
        conversation_id: Uuid,
        domain: String,
    },

    /// A reasoning iteration has started.
    IterationStarted { turn_id: Uuid, iteration: u32 },

    /// A reasoning iteration has completed.
    IterationCompleted {
        turn_id: Uuid,
        iteration: u32,
        tool_calls_requested: usize,
        duration_ms: u64,
    },

    /// A transient model failure triggered a retry.
    ModelRetried {
        turn_id: Uuid,
        attempt: u32,
        error: String,
    },

    /// A tool call finished successfully.
    ToolCompleted {
        turn_id: Uuid,
        call_id: String,
        tool: String,
        duration_ms: u64,
    },

    /// A tool call failed or timed out.
    ToolFailed {
        turn_id: Uuid,
        call_id: String,
        tool: String,
        error: String,
        duration_ms: u64,
    },

    /// A commerce provider was resolved for a domain.
    ProviderResolved {
        domain: String,
        platform: String,
        from_cache: bool,
    },

    /// No commerce provider could be resolved for a domain.
    ProviderResolutionFailed { domain: String, detectors_tried: u32 },

    /// Every search stage came up empty for a query.
    SearchExhausted {
        domain: String,
        query: String,
        cause: ExhaustedCause,
    },

    /// The turn has been finalized.
    TurnFinalized {
        turn_id: Uuid,
        iterations_used: u32,
        /// The iteration cap was reached before the model finished.
        capped: bool,
        /// The turn budget expired and the loop was aborted early.
        aborted: bool,
        duration_ms: u64,
    },
}

impl TurnEvent {
    /// Returns the turn_id from variants that carry one, or None for
    /// domain-scoped resolution and search events.
    pub fn turn_id(&self) -> Option<Uuid> {
        match self {
            TurnEvent::TurnStarted { turn_id, .. }
            | TurnEvent::IterationStarted { turn_id, .. }
            | TurnEvent::IterationCompleted { turn_id, .. }
            | TurnEvent::ModelRetried { turn_id, .. }
            | TurnEvent::ToolCompleted { turn_id, .. }
            | TurnEvent::ToolFailed { turn_id, .. }
            | TurnEvent::TurnFinalized { turn_id, .. } => Some(*turn_id),

            TurnEvent::ProviderResolved { .. }
            | TurnEvent::ProviderResolutionFailed { .. }
            | TurnEvent::SearchExhausted { .. } => None,
        }
    }
}
