//! Health monitor configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Health probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Per-request timeout in milliseconds
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    debug!("default_timeout_ms: called");
    5_000
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl HealthConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout() {
        let config = HealthConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_deserialize_empty() {
        let config: HealthConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.timeout_ms, 5_000);
    }
}
