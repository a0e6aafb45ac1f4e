//! Coordination cycle configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Coordination cycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinationConfig {
    /// Seconds between coordination ticks
    #[serde(rename = "interval-secs", default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Run the coordination cycle in the daemon
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_interval_secs() -> u64 {
    debug!("default_interval_secs: called");
    30
}

fn default_enabled() -> bool {
    true
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            enabled: default_enabled(),
        }
    }
}

impl CoordinationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoordinationConfig::default();
        assert_eq!(config.interval(), Duration::from_secs(30));
        assert!(config.enabled);
    }

    #[test]
    fn test_deserialize_kebab_case() {
        let config: CoordinationConfig = serde_yaml::from_str("interval-secs: 5\nenabled: false\n").unwrap();
        assert_eq!(config.interval_secs, 5);
        assert!(!config.enabled);
    }
}
