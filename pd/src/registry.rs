//! Pillar Registry - the fixed set of pillars known to the coordinator
//!
//! Pillars are registered once from configuration. Afterwards only the health
//! fields change, and only through [`PillarRegistry::record_check`].

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{Pillar, PillarStatus};

/// Shared, ordered list of pillars
#[derive(Debug, Default)]
pub struct PillarRegistry {
    pillars: RwLock<Vec<Pillar>>,
}

impl PillarRegistry {
    /// Create a registry from pillar definitions, keeping their order.
    /// A later definition with a duplicate name is ignored.
    pub fn new(pillars: impl IntoIterator<Item = Pillar>) -> Self {
        let mut unique: Vec<Pillar> = Vec::new();
        for pillar in pillars {
            if unique.iter().any(|p| p.name == pillar.name) {
                debug!(pillar = %pillar.name, "PillarRegistry::new: skipping duplicate");
                continue;
            }
            unique.push(pillar);
        }
        debug!(count = unique.len(), "PillarRegistry::new: registered pillars");
        Self {
            pillars: RwLock::new(unique),
        }
    }

    /// Snapshot of all pillars in registration order
    pub fn list(&self) -> Vec<Pillar> {
        self.pillars.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Snapshot of a single pillar
    pub fn get(&self, name: &str) -> Option<Pillar> {
        self.pillars
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|p| p.name == name)
            .cloned()
    }

    /// Current status of a pillar, `None` if unknown
    pub fn status_of(&self, name: &str) -> Option<PillarStatus> {
        self.pillars
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.status)
    }

    pub fn len(&self) -> usize {
        self.pillars.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of pillars currently online
    pub fn online_count(&self) -> usize {
        self.pillars
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|p| p.status.is_online())
            .count()
    }

    /// Store the outcome of a health check, returning the previous status
    pub(crate) fn record_check(&self, name: &str, status: PillarStatus, at: DateTime<Utc>) -> Option<PillarStatus> {
        let mut pillars = self.pillars.write().unwrap_or_else(|e| e.into_inner());
        let pillar = pillars.iter_mut().find(|p| p.name == name)?;
        let previous = pillar.status;
        pillar.status = status;
        pillar.last_checked_at = Some(at);
        Some(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PillarRegistry {
        PillarRegistry::new(vec![
            Pillar::new("hub", "http://hub.local", "/api/health"),
            Pillar::new("ecosystem", "http://eco.local", "/api/health"),
            Pillar::new("dao", "http://dao.local", "/api/health"),
        ])
    }

    #[test]
    fn test_list_keeps_order() {
        let names: Vec<String> = registry().list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["hub", "ecosystem", "dao"]);
    }

    #[test]
    fn test_get_unknown() {
        let registry = registry();
        assert!(registry.get("hub").is_some());
        assert!(registry.get("mining").is_none());
        assert!(registry.status_of("mining").is_none());
    }

    #[test]
    fn test_duplicates_ignored() {
        let registry = PillarRegistry::new(vec![
            Pillar::new("hub", "http://a", "/h"),
            Pillar::new("hub", "http://b", "/h"),
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("hub").unwrap().endpoint_url, "http://a");
    }

    #[test]
    fn test_record_check_returns_previous() {
        let registry = registry();
        let now = Utc::now();
        assert_eq!(
            registry.record_check("hub", PillarStatus::Online, now),
            Some(PillarStatus::Offline)
        );
        assert_eq!(
            registry.record_check("hub", PillarStatus::Degraded, now),
            Some(PillarStatus::Online)
        );
        assert_eq!(registry.get("hub").unwrap().last_checked_at, Some(now));
        assert_eq!(registry.record_check("mining", PillarStatus::Online, now), None);
    }

    #[test]
    fn test_online_count() {
        let registry = registry();
        assert_eq!(registry.online_count(), 0);
        registry.record_check("dao", PillarStatus::Online, Utc::now());
        assert_eq!(registry.online_count(), 1);
        assert!(!registry.is_empty());
    }
}
