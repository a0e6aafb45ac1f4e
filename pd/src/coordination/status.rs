//! Consolidated system status

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Pillar, PillarStatus};

/// Snapshot of pillar health and exchange activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub pillar_statuses: BTreeMap<String, PillarStatus>,
    /// Retained messages of kind `discussion`
    pub active_discussion_count: usize,
    /// Retained system activity records
    pub activity_count: usize,
    /// Percentage of pillars online, rounded
    pub health_score: u8,
    pub generated_at: DateTime<Utc>,
}

impl SystemStatus {
    pub fn from_pillars(pillars: &[Pillar], active_discussion_count: usize, activity_count: usize) -> Self {
        let online = pillars.iter().filter(|p| p.status.is_online()).count();
        Self {
            pillar_statuses: pillars.iter().map(|p| (p.name.clone(), p.status)).collect(),
            active_discussion_count,
            activity_count,
            health_score: health_score(online, pillars.len()),
            generated_at: Utc::now(),
        }
    }

    pub fn online_count(&self) -> usize {
        self.pillar_statuses.values().filter(|s| s.is_online()).count()
    }
}

/// `round(100 * online / total)`, 0 with no pillars
pub fn health_score(online: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let score = (100.0 * online.min(total) as f64 / total as f64).round();
    score as u8
}
