//! Opportunities, the services they turn into, and metric records
//!
//! These records are owned by the storage collaborator. The coordinator only
//! reads opportunities and flips their status; services and metrics are
//! created once and never updated here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::generate_id;

/// Conversion state of an opportunity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityStatus {
    #[default]
    Detected,
    Converted,
}

impl std::fmt::Display for OpportunityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Detected => write!(f, "detected"),
            Self::Converted => write!(f, "converted"),
        }
    }
}

/// A candidate work item awaiting conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: String,
    pub title: String,
    pub description: String,
    pub estimated_value: f64,
    /// Percentage, 0-100
    pub confidence: f64,
    pub status: OpportunityStatus,
}

impl Opportunity {
    pub fn new(title: impl Into<String>, description: impl Into<String>, estimated_value: f64, confidence: f64) -> Self {
        let title = title.into();
        Self {
            id: generate_id("opp", &title),
            title,
            description: description.into(),
            estimated_value,
            confidence,
            status: OpportunityStatus::Detected,
        }
    }

    pub fn is_detected(&self) -> bool {
        self.status == OpportunityStatus::Detected
    }

    /// Apply a partial update
    pub fn apply(&mut self, patch: &OpportunityPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

/// Partial update for an opportunity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpportunityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OpportunityStatus>,
}

impl OpportunityPatch {
    pub fn status(status: OpportunityStatus) -> Self {
        Self { status: Some(status) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    #[default]
    Active,
}

/// An actionable record derived from a converted opportunity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub status: ServiceStatus,
    pub opportunity_id: String,
    pub template: String,
    /// Deterministic score in [0, 100]
    pub automation_level: u8,
    pub created_at: DateTime<Utc>,
}

/// A metric written to storage (e.g. one per finished feedback cycle)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub id: String,
    pub kind: String,
    pub value: f64,
    pub metadata: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl MetricRecord {
    pub fn new(kind: impl Into<String>, value: f64, metadata: serde_json::Value) -> Self {
        let kind = kind.into();
        Self {
            id: generate_id("metric", &kind),
            kind,
            value,
            metadata,
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_opportunity_is_detected() {
        let opp = Opportunity::new("AI Support Bot", "Answer tickets", 12_000.0, 95.0);
        assert!(opp.is_detected());
        assert!(opp.id.contains("-opp-ai-support-bot"));
    }

    #[test]
    fn test_apply_patch() {
        let mut opp = Opportunity::new("x", "y", 1.0, 1.0);
        opp.apply(&OpportunityPatch::default());
        assert!(opp.is_detected());

        opp.apply(&OpportunityPatch::status(OpportunityStatus::Converted));
        assert_eq!(opp.status, OpportunityStatus::Converted);
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let json = serde_json::to_string(&OpportunityPatch::default()).unwrap();
        assert_eq!(json, "{}");
        let json = serde_json::to_string(&OpportunityPatch::status(OpportunityStatus::Converted)).unwrap();
        assert_eq!(json, r#"{"status":"converted"}"#);
    }

    #[test]
    fn test_metric_record() {
        let metric = MetricRecord::new("feedback_cycle", 75.0, serde_json::json!({"sequence": 1}));
        assert_eq!(metric.kind, "feedback_cycle");
        assert_eq!(metric.metadata["sequence"], 1);
    }
}
