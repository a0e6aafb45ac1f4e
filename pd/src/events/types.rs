//! Event types for coordinator activity streaming
//!
//! These events represent all observable activity in the coordinator:
//! - Pillar health transitions
//! - Cross-pillar message delivery and drops
//! - Feedback cycle lifecycle (start, skip, complete, fail)
//! - Consolidated status snapshots from the coordination cycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coordination::SystemStatus;
use crate::domain::{CycleStatus, MessageKind, PillarStatus};

/// Core event enum - the vocabulary of coordinator activity
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CoordEvent {
    // === Health ===
    /// A pillar's status differs from the previous check
    PillarStatusChanged {
        pillar: String,
        from: PillarStatus,
        to: PillarStatus,
    },

    // === Message exchange ===
    /// A message was appended to the exchange buffer
    MessageSent {
        message_id: String,
        source: String,
        target: String,
        kind: MessageKind,
    },
    /// A message was dropped because its target was not online
    MessageDropped {
        source: String,
        target: String,
        kind: MessageKind,
        reason: String,
    },

    /// A system activity was recorded
    ActivityRecorded { pillar: String, description: String },

    // === Feedback cycles ===
    CycleStarted { sequence: u64 },
    /// A tick arrived while a cycle was still active
    CycleSkipped { active_sequence: Option<u64> },
    CycleCompleted {
        sequence: u64,
        feedback_score: u8,
        duration_ms: i64,
    },
    CycleFailed { sequence: u64, error: String },

    // === Coordination ===
    /// Consolidated status emitted at the end of each coordination tick
    StatusSnapshot(SystemStatus),
}

impl CoordEvent {
    /// Get the event type name for logging/filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PillarStatusChanged { .. } => "PillarStatusChanged",
            Self::MessageSent { .. } => "MessageSent",
            Self::MessageDropped { .. } => "MessageDropped",
            Self::ActivityRecorded { .. } => "ActivityRecorded",
            Self::CycleStarted { .. } => "CycleStarted",
            Self::CycleSkipped { .. } => "CycleSkipped",
            Self::CycleCompleted { .. } => "CycleCompleted",
            Self::CycleFailed { .. } => "CycleFailed",
            Self::StatusSnapshot(_) => "StatusSnapshot",
        }
    }

    /// Terminal cycle status carried by this event, if any
    pub fn cycle_outcome(&self) -> Option<CycleStatus> {
        match self {
            Self::CycleCompleted { .. } => Some(CycleStatus::Completed),
            Self::CycleFailed { .. } => Some(CycleStatus::Failed),
            _ => None,
        }
    }
}

/// Log entry wrapper with the time the event was observed
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub timestamp: DateTime<Utc>,
    pub event: CoordEvent,
}

impl EventLogEntry {
    pub fn new(event: CoordEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}
