//! Feedback cycle records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::generate_id;

/// Lifecycle of a feedback cycle
///
/// `Active` is the only mutable state; `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    #[default]
    Active,
    Completed,
    Failed,
}

impl CycleStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl std::fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One run of the feedback pipeline (detect, materialize, convert, score)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackCycle {
    pub id: String,

    /// Monotonic, 1-based
    pub sequence_number: u64,

    pub started_at: DateTime<Utc>,

    pub ended_at: Option<DateTime<Utc>>,

    /// URLs of repositories created by this cycle, in creation order
    pub repositories_created: Vec<String>,

    pub commits_generated: u32,

    pub opportunities_detected: u32,

    /// Opportunities converted into services during this cycle
    pub services_created: u32,

    /// Bounded heuristic in [0, 100]
    pub feedback_score: u8,

    pub status: CycleStatus,

    /// Failure reason when `status == Failed`
    pub error: Option<String>,
}

impl FeedbackCycle {
    /// Start a new active cycle
    pub fn start(sequence_number: u64) -> Self {
        Self {
            id: generate_id("cycle", &sequence_number.to_string()),
            sequence_number,
            started_at: Utc::now(),
            ended_at: None,
            repositories_created: Vec::new(),
            commits_generated: 0,
            opportunities_detected: 0,
            services_created: 0,
            feedback_score: 0,
            status: CycleStatus::Active,
            error: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CycleStatus::Active
    }

    /// Transition to `Completed`. No-op once terminal.
    pub fn complete(&mut self) {
        if self.is_active() {
            self.status = CycleStatus::Completed;
            self.ended_at = Some(Utc::now());
        }
    }

    /// Transition to `Failed`. No-op once terminal.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.is_active() {
            self.status = CycleStatus::Failed;
            self.ended_at = Some(Utc::now());
            self.error = Some(reason.into());
        }
    }

    /// Wall-clock duration in milliseconds (up to now while active)
    pub fn duration_ms(&self) -> i64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_is_active() {
        let cycle = FeedbackCycle::start(1);
        assert_eq!(cycle.sequence_number, 1);
        assert!(cycle.is_active());
        assert!(cycle.ended_at.is_none());
        assert!(cycle.id.contains("-cycle-1"));
    }

    #[test]
    fn test_complete_sets_end() {
        let mut cycle = FeedbackCycle::start(2);
        cycle.complete();
        assert_eq!(cycle.status, CycleStatus::Completed);
        assert!(cycle.ended_at.is_some());
        assert!(cycle.duration_ms() >= 0);
    }

    #[test]
    fn test_terminal_state_is_immutable() {
        let mut cycle = FeedbackCycle::start(3);
        cycle.fail("storage unreachable");
        let ended = cycle.ended_at;

        cycle.complete();
        assert_eq!(cycle.status, CycleStatus::Failed);
        assert_eq!(cycle.ended_at, ended);
        assert_eq!(cycle.error.as_deref(), Some("storage unreachable"));

        cycle.fail("again");
        assert_eq!(cycle.error.as_deref(), Some("storage unreachable"));
    }

    #[test]
    fn test_status_terminal() {
        assert!(!CycleStatus::Active.is_terminal());
        assert!(CycleStatus::Completed.is_terminal());
        assert!(CycleStatus::Failed.is_terminal());
        assert_eq!(CycleStatus::Completed.to_string(), "completed");
    }
}
