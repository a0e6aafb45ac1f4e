//! Health probes

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::domain::{Pillar, PillarStatus};

/// Result of probing one pillar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 2xx
    Healthy,
    /// Any other HTTP status
    Unhealthy(u16),
    /// Timeout or connection failure
    Unreachable(String),
}

impl ProbeOutcome {
    pub fn status(&self) -> PillarStatus {
        match self {
            ProbeOutcome::Healthy => PillarStatus::Online,
            ProbeOutcome::Unhealthy(_) => PillarStatus::Degraded,
            ProbeOutcome::Unreachable(_) => PillarStatus::Offline,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ProbeOutcome::Healthy => "ok".to_string(),
            ProbeOutcome::Unhealthy(code) => format!("HTTP {}", code),
            ProbeOutcome::Unreachable(reason) => reason.clone(),
        }
    }
}

/// Something that can tell whether a pillar is healthy
///
/// Implementations must return within a bounded time and must not fail;
/// every problem is expressed as a [`ProbeOutcome`].
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, pillar: &Pillar) -> ProbeOutcome;
}

/// Probes `GET <url><health-path>` over HTTP
pub struct HttpProbe {
    http: Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        debug!(?timeout, "HttpProbe::new: called");
        let http = Client::builder().timeout(timeout).connect_timeout(timeout).build()?;
        Ok(Self { http, timeout })
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn probe(&self, pillar: &Pillar) -> ProbeOutcome {
        let url = pillar.health_url();
        debug!(pillar = %pillar.name, %url, "HttpProbe::probe: called");

        // Hard upper bound on top of the client timeout
        let result = tokio::time::timeout(self.timeout, self.http.get(&url).send()).await;
        match result {
            Err(_) => ProbeOutcome::Unreachable(format!("timed out after {:?}", self.timeout)),
            Ok(Err(e)) if e.is_timeout() => ProbeOutcome::Unreachable(format!("timed out after {:?}", self.timeout)),
            Ok(Err(e)) => ProbeOutcome::Unreachable(e.to_string()),
            Ok(Ok(response)) if response.status().is_success() => ProbeOutcome::Healthy,
            Ok(Ok(response)) => ProbeOutcome::Unhealthy(response.status().as_u16()),
        }
    }
}

#[cfg(test)]
pub mod mock {
    //! Scripted probe for tests

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Returns a fixed outcome per pillar name; unknown pillars are unreachable
    #[derive(Default)]
    pub struct ScriptedProbe {
        outcomes: Mutex<HashMap<String, ProbeOutcome>>,
        delay: Duration,
    }

    impl ScriptedProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set(&self, pillar: &str, outcome: ProbeOutcome) {
            self.outcomes.lock().unwrap().insert(pillar.to_string(), outcome);
        }

        pub fn all_healthy(names: &[&str]) -> Self {
            let probe = Self::new();
            for name in names {
                probe.set(name, ProbeOutcome::Healthy);
            }
            probe
        }

        /// Answer every probe only after `delay`
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl HealthProbe for ScriptedProbe {
        async fn probe(&self, pillar: &Pillar) -> ProbeOutcome {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.outcomes
                .lock()
                .unwrap()
                .get(&pillar.name)
                .cloned()
                .unwrap_or_else(|| ProbeOutcome::Unreachable("unscripted".to_string()))
        }
    }
}
