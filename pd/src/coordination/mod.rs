//! Coordination cycle and the consolidated system status

mod config;
mod cycle;
mod status;

pub use config::CoordinationConfig;
pub use cycle::{ACTIVITY_LIMIT, CoordinationCycle, DISCUSSION_LIMIT, kind_for};
pub use status::{SystemStatus, health_score};
