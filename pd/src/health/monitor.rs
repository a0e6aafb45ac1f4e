//! Health Monitor - refreshes pillar status from their health endpoints

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::probe::{HealthProbe, ProbeOutcome};
use crate::domain::PillarStatus;
use crate::events::{CoordEvent, EventBus};
use crate::registry::PillarRegistry;

/// Outcome of checking one pillar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub pillar: String,
    pub previous: PillarStatus,
    pub status: PillarStatus,
    pub detail: String,
}

impl HealthReport {
    pub fn changed(&self) -> bool {
        self.previous != self.status
    }
}

/// Polls every registered pillar and writes the result into the registry
pub struct HealthMonitor {
    registry: Arc<PillarRegistry>,
    probe: Arc<dyn HealthProbe>,
    events: Arc<EventBus>,
}

impl HealthMonitor {
    pub fn new(registry: Arc<PillarRegistry>, probe: Arc<dyn HealthProbe>, events: Arc<EventBus>) -> Self {
        Self {
            registry,
            probe,
            events,
        }
    }

    pub fn registry(&self) -> &Arc<PillarRegistry> {
        &self.registry
    }

    /// Check every pillar concurrently
    ///
    /// Never fails. Each pillar ends up `online`, `degraded` or `offline`
    /// depending only on this check, whatever its previous state was.
    pub async fn check_all(&self) -> Vec<HealthReport> {
        let pillars = self.registry.list();
        debug!(count = pillars.len(), "HealthMonitor::check_all: called");

        let outcomes = join_all(pillars.iter().map(|pillar| self.probe.probe(pillar))).await;

        let mut reports = Vec::with_capacity(pillars.len());
        for (pillar, outcome) in pillars.iter().zip(outcomes) {
            reports.push(self.record(&pillar.name, &outcome));
        }

        let online = reports.iter().filter(|r| r.status.is_online()).count();
        debug!(online, total = reports.len(), "HealthMonitor::check_all: done");
        reports
    }

    /// Check a single pillar by name
    pub async fn check_one(&self, name: &str) -> Option<HealthReport> {
        let pillar = self.registry.get(name)?;
        let outcome = self.probe.probe(&pillar).await;
        Some(self.record(name, &outcome))
    }

    fn record(&self, name: &str, outcome: &ProbeOutcome) -> HealthReport {
        let status = outcome.status();
        let previous = self
            .registry
            .record_check(name, status, Utc::now())
            .unwrap_or(PillarStatus::Offline);

        let report = HealthReport {
            pillar: name.to_string(),
            previous,
            status,
            detail: outcome.detail(),
        };

        if report.changed() {
            match status {
                PillarStatus::Online => info!(pillar = %name, from = %previous, "Pillar online"),
                _ => warn!(pillar = %name, from = %previous, to = %status, detail = %report.detail, "Pillar not online"),
            }
            self.events.emit(CoordEvent::PillarStatusChanged {
                pillar: name.to_string(),
                from: previous,
                to: status,
            });
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Pillar;
    use crate::health::probe::mock::ScriptedProbe;

    fn setup(probe: Arc<ScriptedProbe>) -> (HealthMonitor, Arc<PillarRegistry>, Arc<EventBus>) {
        let registry = Arc::new(PillarRegistry::new(vec![
            Pillar::new("hub", "http://hub.local", "/api/health"),
            Pillar::new("ecosystem", "http://eco.local", "/api/health"),
            Pillar::new("dao", "http://dao.local", "/api/health"),
        ]));
        let events = Arc::new(EventBus::new(64));
        let monitor = HealthMonitor::new(registry.clone(), probe, events.clone());
        (monitor, registry, events)
    }

    #[tokio::test]
    async fn test_check_all_sets_each_status() {
        let probe = Arc::new(ScriptedProbe::new());
        probe.set("hub", ProbeOutcome::Healthy);
        probe.set("ecosystem", ProbeOutcome::Unhealthy(500));
        probe.set("dao", ProbeOutcome::Unreachable("timed out".to_string()));
        let (monitor, registry, _) = setup(probe);

        let reports = monitor.check_all().await;
        assert_eq!(reports.len(), 3);
        assert_eq!(registry.status_of("hub"), Some(PillarStatus::Online));
        assert_eq!(registry.status_of("ecosystem"), Some(PillarStatus::Degraded));
        assert_eq!(registry.status_of("dao"), Some(PillarStatus::Offline));
        assert!(registry.list().iter().all(|p| p.last_checked_at.is_some()));
    }

    #[tokio::test]
    async fn test_status_ignores_prior_state() {
        let probe = Arc::new(ScriptedProbe::all_healthy(&["hub", "ecosystem", "dao"]));
        let (monitor, registry, _) = setup(probe.clone());
        monitor.check_all().await;

        for (outcome, expected) in [
            (ProbeOutcome::Unhealthy(500), PillarStatus::Degraded),
            (ProbeOutcome::Unreachable("refused".to_string()), PillarStatus::Offline),
            (ProbeOutcome::Healthy, PillarStatus::Online),
            (ProbeOutcome::Healthy, PillarStatus::Online),
        ] {
            probe.set("hub", outcome);
            monitor.check_all().await;
            assert_eq!(registry.status_of("hub"), Some(expected));
        }
    }

    #[tokio::test]
    async fn test_emits_only_on_change() {
        let probe = Arc::new(ScriptedProbe::all_healthy(&["hub", "ecosystem", "dao"]));
        let (monitor, _, events) = setup(probe);
        let mut rx = events.subscribe();

        monitor.check_all().await;
        monitor.check_all().await;

        let mut changes = 0;
        while let Ok(event) = rx.try_recv() {
            if let CoordEvent::PillarStatusChanged { from, to, .. } = event {
                assert_eq!(from, PillarStatus::Offline);
                assert_eq!(to, PillarStatus::Online);
                changes += 1;
            }
        }
        assert_eq!(changes, 3);
    }

    #[tokio::test]
    async fn test_check_one() {
        let probe = Arc::new(ScriptedProbe::all_healthy(&["dao"]));
        let (monitor, _, _) = setup(probe);
        let report = monitor.check_one("dao").await.unwrap();
        assert!(report.changed());
        assert_eq!(report.status, PillarStatus::Online);
        assert!(monitor.check_one("mining").await.is_none());
    }
}
