//! Activity log records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository creation or synthetic commit recorded by a feedback cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryActivity {
    pub repo_name: String,
    pub commit_identifier: String,
    pub files_added: Vec<String>,
    pub line_count: u32,
    pub recorded_at: DateTime<Utc>,
}

impl RepositoryActivity {
    pub fn new(
        repo_name: impl Into<String>,
        commit_identifier: impl Into<String>,
        files_added: Vec<String>,
        line_count: u32,
    ) -> Self {
        Self {
            repo_name: repo_name.into(),
            commit_identifier: commit_identifier.into(),
            files_added,
            line_count,
            recorded_at: Utc::now(),
        }
    }
}

/// Impact rating of a system activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Something a pillar did, as reported by the coordination cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemActivity {
    pub pillar: String,
    pub description: String,
    pub recorded_at: DateTime<Utc>,
    pub impact: Impact,
    pub payload: serde_json::Value,
}

impl SystemActivity {
    pub fn new(pillar: impl Into<String>, description: impl Into<String>, impact: Impact) -> Self {
        Self {
            pillar: pillar.into(),
            description: description.into(),
            recorded_at: Utc::now(),
            impact,
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_activity_builder() {
        let activity = SystemActivity::new("dao", "Proposal tallied", Impact::High).with_payload(json!({"votes": 12}));
        assert_eq!(activity.pillar, "dao");
        assert_eq!(activity.impact, Impact::High);
        assert_eq!(activity.payload["votes"], 12);
    }

    #[test]
    fn test_impact_serde() {
        let json = serde_json::to_string(&Impact::Medium).unwrap();
        assert_eq!(json, r#""medium""#);
        assert_eq!(Impact::Low.to_string(), "low");
    }
}
