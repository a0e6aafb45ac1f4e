//! Random selection from fixed catalogs

use std::ops::RangeInclusive;

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::debug;

use super::{ActivityPicker, ActivityTemplate, CandidateOpportunity, OpportunityDetector};
use crate::domain::Impact;

/// Opportunities a feedback cycle can detect: (title, description, value, confidence)
pub const CANDIDATE_CATALOG: &[(&str, &str, f64, f64)] = &[
    (
        "AI Support Bot",
        "Answer community questions across pillars",
        12_000.0,
        92.0,
    ),
    (
        "Governance Dashboard",
        "Live view of proposals, quorum and turnout",
        8_500.0,
        85.0,
    ),
    (
        "Mining Pool Monitor",
        "Track hashrate and payouts per pool",
        9_000.0,
        88.0,
    ),
    (
        "Treasury Automation",
        "Scheduled treasury rebalancing and reports",
        15_000.0,
        78.0,
    ),
    (
        "Public API Gateway",
        "Single entry point for pillar data",
        11_000.0,
        95.0,
    ),
    (
        "Node Operator CLI",
        "Provision and inspect nodes from the terminal",
        6_000.0,
        80.0,
    ),
];

/// Activities the coordination cycle can report: (description, impact)
pub const ACTIVITY_CATALOG: &[(&str, Impact)] = &[
    ("System optimization pass completed", Impact::Medium),
    ("Learning cycle completed", Impact::Low),
    ("Security scan completed with no findings", Impact::High),
    ("Cross-pillar sync completed", Impact::Medium),
    ("Proposal queue reviewed", Impact::High),
    ("Cache warmed for peak traffic", Impact::Low),
];

const LINE_COUNT: RangeInclusive<u32> = 100..=500;

/// Strategy backed by the thread-local RNG
#[derive(Debug, Clone)]
pub struct CatalogStrategy {
    detect: RangeInclusive<usize>,
    commits: RangeInclusive<u32>,
}

impl Default for CatalogStrategy {
    fn default() -> Self {
        Self::new(2..=3, 3..=7)
    }
}

impl CatalogStrategy {
    /// Ranges are inclusive; an inverted range collapses to its start
    pub fn new(detect: RangeInclusive<usize>, commits: RangeInclusive<u32>) -> Self {
        let detect = *detect.start()..=(*detect.end()).max(*detect.start());
        let commits = *commits.start()..=(*commits.end()).max(*commits.start());
        Self { detect, commits }
    }
}

impl OpportunityDetector for CatalogStrategy {
    fn detect(&self) -> Vec<CandidateOpportunity> {
        let mut rng = rand::rng();
        let count = rng.random_range(self.detect.clone()).min(CANDIDATE_CATALOG.len());
        let picked: Vec<CandidateOpportunity> = CANDIDATE_CATALOG
            .choose_multiple(&mut rng, count)
            .map(|(title, description, value, confidence)| {
                CandidateOpportunity::new(title, description, *value, *confidence)
            })
            .collect();
        debug!(count = picked.len(), "CatalogStrategy::detect: picked candidates");
        picked
    }

    fn line_count(&self, _candidate: &CandidateOpportunity) -> u32 {
        rand::rng().random_range(LINE_COUNT)
    }

    fn commit_count(&self) -> u32 {
        rand::rng().random_range(self.commits.clone())
    }

    fn pick_commit_target(&self, repos: &[String]) -> Option<String> {
        repos.choose(&mut rand::rng()).cloned()
    }
}

impl ActivityPicker for CatalogStrategy {
    fn pick_activity(&self, pillars: &[String]) -> Option<ActivityTemplate> {
        let mut rng = rand::rng();
        let pillar = pillars.choose(&mut rng)?;
        let (description, impact) = ACTIVITY_CATALOG.choose(&mut rng)?;
        Some(ActivityTemplate::new(pillar, description, *impact))
    }
}
