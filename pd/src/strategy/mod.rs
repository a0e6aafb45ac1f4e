//! Selection strategies for feedback and coordination cycles
//!
//! Which opportunities a cycle "detects", how many synthetic commits it
//! records and which activity the coordination cycle reports are all
//! decisions behind these traits. [`CatalogStrategy`] picks randomly from
//! fixed catalogs; [`FixedStrategy`] always makes the same choices.

use serde::{Deserialize, Serialize};

use crate::domain::{Impact, slugify};

mod catalog;
mod fixed;

pub use catalog::{ACTIVITY_CATALOG, CANDIDATE_CATALOG, CatalogStrategy};
pub use fixed::FixedStrategy;

/// Language a generated repository is scaffolded in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechStack {
    Python,
    TypeScript,
    Rust,
}

impl TechStack {
    /// Infer a stack from keywords in a title
    pub fn infer(title: &str) -> Self {
        let words: Vec<String> = title
            .to_lowercase()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        let has = |keys: &[&str]| words.iter().any(|w| keys.contains(&w.as_str()));

        if has(&["ai", "ml"]) {
            TechStack::Python
        } else if has(&["web", "dashboard", "api"]) {
            TechStack::TypeScript
        } else if has(&["mining", "protocol", "cli"]) {
            TechStack::Rust
        } else {
            TechStack::Python
        }
    }

    /// Files scaffolded for this stack
    pub fn files(&self) -> Vec<String> {
        let files: &[&str] = match self {
            TechStack::Python => &["requirements.txt", "main.py", "src/__init__.py", "README.md"],
            TechStack::TypeScript => &["package.json", "tsconfig.json", "src/index.ts", "README.md"],
            TechStack::Rust => &["Cargo.toml", "src/main.rs", "src/lib.rs", "README.md"],
        };
        files.iter().map(|f| f.to_string()).collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TechStack::Python => "python",
            TechStack::TypeScript => "typescript",
            TechStack::Rust => "rust",
        }
    }
}

impl std::fmt::Display for TechStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An opportunity found during the Detect phase of a feedback cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateOpportunity {
    pub title: String,
    pub description: String,
    pub estimated_value: f64,
    pub confidence: f64,
}

impl CandidateOpportunity {
    pub fn new(title: &str, description: &str, estimated_value: f64, confidence: f64) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            estimated_value,
            confidence,
        }
    }

    /// Repository name derived from the title
    pub fn repo_name(&self) -> String {
        slugify(&self.title)
    }

    pub fn tech_stack(&self) -> TechStack {
        TechStack::infer(&self.title)
    }

    /// Repository topics
    pub fn tags(&self) -> Vec<String> {
        vec![self.tech_stack().to_string(), "pillard".to_string()]
    }
}

/// A system activity the coordination cycle may report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityTemplate {
    pub pillar: String,
    pub description: String,
    pub impact: Impact,
}

impl ActivityTemplate {
    pub fn new(pillar: &str, description: &str, impact: Impact) -> Self {
        Self {
            pillar: pillar.to_string(),
            description: description.to_string(),
            impact,
        }
    }
}

/// Decisions made by the feedback cycle
pub trait OpportunityDetector: Send + Sync {
    /// Opportunities detected this cycle
    fn detect(&self) -> Vec<CandidateOpportunity>;

    /// Synthetic line count for a materialized repository
    fn line_count(&self, candidate: &CandidateOpportunity) -> u32;

    /// Number of synthetic commits to record
    fn commit_count(&self) -> u32;

    /// Repository a synthetic commit is recorded against
    fn pick_commit_target(&self, repos: &[String]) -> Option<String>;
}

/// Decisions made by the coordination cycle
pub trait ActivityPicker: Send + Sync {
    /// Activity to record this tick, attributed to one of `pillars`
    fn pick_activity(&self, pillars: &[String]) -> Option<ActivityTemplate>;
}
