//! Pillar health monitoring

mod config;
mod monitor;
pub mod probe;

pub use config::HealthConfig;
pub use monitor::{HealthMonitor, HealthReport};
pub use probe::{HealthProbe, HttpProbe, ProbeOutcome};
