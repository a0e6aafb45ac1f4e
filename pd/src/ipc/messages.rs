//! IPC message types for daemon communication
//!
//! Simple JSON-over-newline protocol. Each message is a single line of JSON followed by `\n`.

use serde::{Deserialize, Serialize};

use crate::coordination::SystemStatus;
use crate::domain::{CrossPillarMessage, FeedbackCycle, RepositoryActivity, SystemActivity};
use crate::feedback::AggregateMetrics;

/// Messages from CLI to Daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum DaemonMessage {
    /// Ping to check if daemon is alive
    Ping,

    /// System status, cycle metrics and the active cycle
    Status,

    /// The most recent finished feedback cycles
    Cycles { limit: usize },

    RepositoryActivity { limit: usize },

    Discussions { limit: usize },

    Activities { limit: usize },

    /// Request daemon to stop gracefully
    Shutdown,
}

/// Responses from Daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DaemonResponse {
    /// Acknowledgment
    Ok,

    /// Pong response to ping
    Pong { version: String },

    Status {
        status: SystemStatus,
        metrics: AggregateMetrics,
        current_cycle: Option<FeedbackCycle>,
    },

    Cycles { cycles: Vec<FeedbackCycle> },

    RepositoryActivity { entries: Vec<RepositoryActivity> },

    Discussions { messages: Vec<CrossPillarMessage> },

    Activities { activities: Vec<SystemActivity> },

    /// Error response
    Error { message: String },
}
