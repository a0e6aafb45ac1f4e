//! Deterministic strategy

use super::{ActivityPicker, ActivityTemplate, CandidateOpportunity, OpportunityDetector};
use crate::domain::Impact;

/// Always makes the same choices
///
/// Detects the configured candidates, records `commits` commits against the
/// most recent repository, and attributes the activity to the first pillar.
#[derive(Debug, Clone)]
pub struct FixedStrategy {
    pub candidates: Vec<CandidateOpportunity>,
    pub line_count: u32,
    pub commits: u32,
    pub activity: String,
    pub impact: Impact,
}

impl Default for FixedStrategy {
    fn default() -> Self {
        Self {
            candidates: vec![
                CandidateOpportunity::new("AI Support Bot", "Answer community questions", 12_000.0, 92.0),
                CandidateOpportunity::new("Node Operator CLI", "Provision nodes", 6_000.0, 80.0),
            ],
            line_count: 250,
            commits: 3,
            activity: "Cross-pillar sync completed".to_string(),
            impact: Impact::Medium,
        }
    }
}

impl FixedStrategy {
    pub fn with_candidates(mut self, candidates: Vec<CandidateOpportunity>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_commits(mut self, commits: u32) -> Self {
        self.commits = commits;
        self
    }
}

impl OpportunityDetector for FixedStrategy {
    fn detect(&self) -> Vec<CandidateOpportunity> {
        self.candidates.clone()
    }

    fn line_count(&self, _candidate: &CandidateOpportunity) -> u32 {
        self.line_count
    }

    fn commit_count(&self) -> u32 {
        self.commits
    }

    fn pick_commit_target(&self, repos: &[String]) -> Option<String> {
        repos.last().cloned()
    }
}

impl ActivityPicker for FixedStrategy {
    fn pick_activity(&self, pillars: &[String]) -> Option<ActivityTemplate> {
        let pillar = pillars.first()?;
        Some(ActivityTemplate::new(pillar, &self.activity, self.impact))
    }
}
