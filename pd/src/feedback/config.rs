//! Feedback scheduler configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::strategy::CatalogStrategy;

/// Feedback cycle scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Seconds between cycle ticks
    #[serde(rename = "interval-secs", default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Run the scheduler in the daemon
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Fewest opportunities detected per cycle
    #[serde(rename = "min-detect", default = "default_min_detect")]
    pub min_detect: usize,

    /// Most opportunities detected per cycle
    #[serde(rename = "max-detect", default = "default_max_detect")]
    pub max_detect: usize,

    /// Fewest synthetic commits per cycle
    #[serde(rename = "min-commits", default = "default_min_commits")]
    pub min_commits: u32,

    /// Most synthetic commits per cycle
    #[serde(rename = "max-commits", default = "default_max_commits")]
    pub max_commits: u32,
}

fn default_interval_secs() -> u64 {
    debug!("default_interval_secs: called");
    120
}

fn default_enabled() -> bool {
    true
}

fn default_min_detect() -> usize {
    2
}

fn default_max_detect() -> usize {
    3
}

fn default_min_commits() -> u32 {
    3
}

fn default_max_commits() -> u32 {
    7
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        debug!("FeedbackConfig::default: called");
        Self {
            interval_secs: default_interval_secs(),
            enabled: default_enabled(),
            min_detect: default_min_detect(),
            max_detect: default_max_detect(),
            min_commits: default_min_commits(),
            max_commits: default_max_commits(),
        }
    }
}

impl FeedbackConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Catalog strategy using the configured ranges
    pub fn strategy(&self) -> CatalogStrategy {
        CatalogStrategy::new(self.min_detect..=self.max_detect, self.min_commits..=self.max_commits)
    }
}
