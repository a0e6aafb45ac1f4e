//! Cross-pillar messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::generate_id;

/// Message vocabulary shared by all pillars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Discussion,
    SystemActivity,
    MiningData,
    DaoProposal,
    EcosystemUpdate,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discussion => "discussion",
            Self::SystemActivity => "system_activity",
            Self::MiningData => "mining_data",
            Self::DaoProposal => "dao_proposal",
            Self::EcosystemUpdate => "ecosystem_update",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed message from one pillar to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossPillarMessage {
    pub id: String,
    pub source_pillar: String,
    pub target_pillar: String,
    pub kind: MessageKind,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl CrossPillarMessage {
    /// Build a message with a fresh id and the current timestamp
    pub fn new(
        source_pillar: impl Into<String>,
        target_pillar: impl Into<String>,
        kind: MessageKind,
        payload: serde_json::Value,
    ) -> Self {
        let source_pillar = source_pillar.into();
        let target_pillar = target_pillar.into();
        Self {
            id: generate_id("msg", &format!("{}-{}", source_pillar, target_pillar)),
            source_pillar,
            target_pillar,
            kind,
            payload,
            created_at: Utc::now(),
        }
    }

    /// Webhook body understood by the pillars' `/webhook/receive` endpoint
    pub fn webhook_body(&self) -> serde_json::Value {
        serde_json::json!({
            "source_system": self.source_pillar,
            "event_type": self.kind.as_str(),
            "data": self.payload,
            "timestamp": self.created_at.to_rfc3339(),
            "event_id": self.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_message() {
        let msg = CrossPillarMessage::new("hub", "dao", MessageKind::DaoProposal, json!({"title": "x"}));
        assert_eq!(msg.source_pillar, "hub");
        assert_eq!(msg.target_pillar, "dao");
        assert!(msg.id.contains("-msg-hub-dao"));
    }

    #[test]
    fn test_kind_serde_matches_as_str() {
        for kind in [
            MessageKind::Discussion,
            MessageKind::SystemActivity,
            MessageKind::MiningData,
            MessageKind::DaoProposal,
            MessageKind::EcosystemUpdate,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_webhook_body_fields() {
        let msg = CrossPillarMessage::new("ecosystem", "hub", MessageKind::MiningData, json!({"hashrate": 42}));
        let body = msg.webhook_body();
        assert_eq!(body["source_system"], "ecosystem");
        assert_eq!(body["event_type"], "mining_data");
        assert_eq!(body["data"]["hashrate"], 42);
        assert_eq!(body["event_id"], msg.id.as_str());
        assert!(body["timestamp"].is_string());
    }
}
