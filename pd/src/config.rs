//! Pillard configuration types and loading

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::coordination::CoordinationConfig;
use crate::domain::Pillar;
use crate::feedback::FeedbackConfig;
use crate::health::HealthConfig;
use crate::retention::{ACTIVITY_RETENTION, MESSAGE_RETENTION, REPOSITORY_ACTIVITY_RETENTION};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pillars to monitor, in ring order
    pub pillars: Vec<PillarConfig>,

    /// Health probe settings
    pub health: HealthConfig,

    /// Feedback cycle scheduler
    pub feedback: FeedbackConfig,

    /// Coordination cycle
    pub coordination: CoordinationConfig,

    /// Repository host collaborator
    pub repository: RepositoryConfig,

    /// Storage collaborator
    pub storage: StorageConfig,

    /// Retention caps for in-memory logs
    pub retention: RetentionConfig,

    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pillars: default_pillars(),
            health: HealthConfig::default(),
            feedback: FeedbackConfig::default(),
            coordination: CoordinationConfig::default(),
            repository: RepositoryConfig::default(),
            storage: StorageConfig::default(),
            retention: RetentionConfig::default(),
            log_level: None,
        }
    }
}

fn default_pillars() -> Vec<PillarConfig> {
    vec![
        PillarConfig::new("hub", "http://localhost:5000", ["discussion", "chat"]),
        PillarConfig::new("ecosystem", "http://localhost:5001", ["mining", "services"]),
        PillarConfig::new("dao", "http://localhost:5002", ["governance", "voting"]),
    ]
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if self.pillars.is_empty() {
            return Err(eyre::eyre!("At least one pillar must be configured"));
        }

        let mut seen = HashSet::new();
        for pillar in &self.pillars {
            if pillar.name.trim().is_empty() {
                return Err(eyre::eyre!("Pillar name must not be empty"));
            }
            if !seen.insert(pillar.name.as_str()) {
                return Err(eyre::eyre!("Duplicate pillar name: {}", pillar.name));
            }
            let url = reqwest::Url::parse(&pillar.url)
                .map_err(|e| eyre::eyre!("Pillar {} has an invalid url {}: {}", pillar.name, pillar.url, e))?;
            if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                return Err(eyre::eyre!(
                    "Pillar {} url must be http(s)://host, got {}",
                    pillar.name,
                    pillar.url
                ));
            }
        }

        if self.feedback.interval_secs == 0 {
            return Err(eyre::eyre!("feedback.interval-secs must be greater than zero"));
        }
        if self.coordination.interval_secs == 0 {
            return Err(eyre::eyre!("coordination.interval-secs must be greater than zero"));
        }
        if self.health.timeout_ms == 0 {
            return Err(eyre::eyre!("health.timeout-ms must be greater than zero"));
        }
        if self.feedback.min_detect > self.feedback.max_detect {
            return Err(eyre::eyre!("feedback.min-detect must not exceed feedback.max-detect"));
        }
        if self.feedback.min_commits > self.feedback.max_commits {
            return Err(eyre::eyre!("feedback.min-commits must not exceed feedback.max-commits"));
        }
        if self.storage.backend == StorageBackend::File && self.storage.dir.is_none() && dirs::data_local_dir().is_none()
        {
            return Err(eyre::eyre!("storage.dir is required for the file backend"));
        }
        Ok(())
    }

    /// Pillar records built from the configured definitions
    pub fn build_pillars(&self) -> Vec<Pillar> {
        self.pillars.iter().map(PillarConfig::to_pillar).collect()
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .pillard.yml
        let local_config = PathBuf::from(".pillard.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/pillard/pillard.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("pillard").join("pillard.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// One pillar definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarConfig {
    pub name: String,

    /// Base URL
    pub url: String,

    /// Health endpoint path
    #[serde(rename = "health-path", default = "default_health_path")]
    pub health_path: String,

    /// Path that accepts cross-pillar messages
    #[serde(rename = "webhook-path", default, skip_serializing_if = "Option::is_none")]
    pub webhook_path: Option<String>,

    #[serde(default)]
    pub capabilities: Vec<String>,
}

fn default_health_path() -> String {
    "/api/health".to_string()
}

impl PillarConfig {
    pub fn new<I, S>(name: &str, url: &str, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            health_path: default_health_path(),
            webhook_path: None,
            capabilities: capabilities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn to_pillar(&self) -> Pillar {
        let pillar = Pillar::new(&self.name, &self.url, &self.health_path).with_capabilities(self.capabilities.clone());
        match &self.webhook_path {
            Some(path) => pillar.with_webhook(path),
            None => pillar,
        }
    }
}

/// Which repository host to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryProvider {
    Github,
    Disabled,
}

/// Repository host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub provider: RepositoryProvider,

    /// Account that owns created repositories
    pub owner: Option<String>,

    /// Environment variable containing the API token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            provider: RepositoryProvider::Github,
            owner: None,
            token_env: "GITHUB_TOKEN".to_string(),
            base_url: "https://api.github.com".to_string(),
            timeout_ms: 15_000,
        }
    }
}

impl RepositoryConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

/// Which store backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    File,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Directory for the file backend
    pub dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            dir: None,
        }
    }
}

impl StorageConfig {
    /// Directory used by the file backend
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("pillard")
                .join("store")
        })
    }
}

/// Retention caps. Values above the built-in maxima are clamped down.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub messages: usize,

    pub activities: usize,

    #[serde(rename = "repository-activity")]
    pub repository_activity: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            messages: MESSAGE_RETENTION,
            activities: ACTIVITY_RETENTION,
            repository_activity: REPOSITORY_ACTIVITY_RETENTION,
        }
    }
}

impl RetentionConfig {
    pub fn messages(&self) -> usize {
        self.messages.clamp(1, MESSAGE_RETENTION)
    }

    pub fn activities(&self) -> usize {
        self.activities.clamp(1, ACTIVITY_RETENTION)
    }

    pub fn repository_activity(&self) -> usize {
        self.repository_activity.clamp(1, REPOSITORY_ACTIVITY_RETENTION)
    }
}
