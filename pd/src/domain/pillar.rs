//! Pillar records
//!
//! A pillar is an independently deployed external system the coordinator
//! monitors and exchanges messages with. Records are created at startup from
//! configuration and only their health fields change afterwards.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last known health of a pillar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PillarStatus {
    /// Health endpoint answered with 2xx
    Online,
    /// Health endpoint answered with any other status
    Degraded,
    /// No answer within the timeout, or connection failure.
    /// Also the state before the first check.
    #[default]
    Offline,
}

impl PillarStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl std::fmt::Display for PillarStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Degraded => write!(f, "degraded"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// An external system registered with the coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pillar {
    /// Unique pillar name (e.g. "hub")
    pub name: String,

    /// Base URL, without trailing slash
    pub endpoint_url: String,

    /// Path of the health endpoint, relative to the base URL
    pub health_path: String,

    /// Optional path that accepts cross-pillar messages
    pub webhook_path: Option<String>,

    /// Current status
    pub status: PillarStatus,

    /// When the health monitor last looked at this pillar
    pub last_checked_at: Option<DateTime<Utc>>,

    /// Capability tags declared in configuration
    pub declared_capabilities: BTreeSet<String>,
}

impl Pillar {
    /// Create a pillar that has not been checked yet
    pub fn new(name: impl Into<String>, endpoint_url: impl Into<String>, health_path: impl Into<String>) -> Self {
        let endpoint_url: String = endpoint_url.into();
        Self {
            name: name.into(),
            endpoint_url: endpoint_url.trim_end_matches('/').to_string(),
            health_path: health_path.into(),
            webhook_path: None,
            status: PillarStatus::Offline,
            last_checked_at: None,
            declared_capabilities: BTreeSet::new(),
        }
    }

    /// Add capability tags
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared_capabilities
            .extend(capabilities.into_iter().map(Into::into));
        self
    }

    /// Set the webhook path
    pub fn with_webhook(mut self, path: impl Into<String>) -> Self {
        self.webhook_path = Some(path.into());
        self
    }

    /// Full URL of the health endpoint
    pub fn health_url(&self) -> String {
        join_url(&self.endpoint_url, &self.health_path)
    }

    /// Full URL of the webhook endpoint, if one is configured
    pub fn webhook_url(&self) -> Option<String> {
        self.webhook_path
            .as_deref()
            .map(|path| join_url(&self.endpoint_url, path))
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.declared_capabilities.contains(capability)
    }
}

fn join_url(base: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}
