//! Repository host collaborator
//!
//! Creating repositories and uploading files are side effects of a feedback
//! cycle. Every failure here is logged by the caller and never fails the cycle.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::{RepositoryConfig, RepositoryProvider};

mod error;
mod github;

pub use error::RepoError;
pub use github::GitHubHost;

pub type RepoResult<T> = std::result::Result<T, RepoError>;

/// Source-control host that can create repositories and upload files
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Host name for logs
    fn name(&self) -> &str;

    /// Create a repository, returning its URL
    async fn create_repository(&self, name: &str, description: &str, tags: &[String]) -> RepoResult<String>;

    /// Create or replace a file in a repository
    async fn upload_file(&self, repo: &str, path: &str, content: &str) -> RepoResult<()>;
}

/// Host used when no provider is configured; every call fails
#[derive(Debug, Default)]
pub struct DisabledHost {
    reason: String,
}

impl DisabledHost {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl RepositoryHost for DisabledHost {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn create_repository(&self, name: &str, _description: &str, _tags: &[String]) -> RepoResult<String> {
        debug!(%name, "DisabledHost::create_repository: called");
        Err(RepoError::Unavailable(self.reason.clone()))
    }

    async fn upload_file(&self, repo: &str, path: &str, _content: &str) -> RepoResult<()> {
        debug!(%repo, %path, "DisabledHost::upload_file: called");
        Err(RepoError::Unavailable(self.reason.clone()))
    }
}

/// Build the configured repository host
///
/// Falls back to [`DisabledHost`] when the provider is disabled, the token
/// variable is unset, or no owner is configured.
pub fn from_config(config: &RepositoryConfig) -> Arc<dyn RepositoryHost> {
    if config.provider == RepositoryProvider::Disabled {
        return Arc::new(DisabledHost::new("repository provider disabled"));
    }

    let Ok(token) = std::env::var(&config.token_env) else {
        info!(token_env = %config.token_env, "Repository token not set, repository creation disabled");
        return Arc::new(DisabledHost::new(format!("{} not set", config.token_env)));
    };
    let Some(owner) = config.owner.clone() else {
        info!("Repository owner not configured, repository creation disabled");
        return Arc::new(DisabledHost::new("repository.owner not set"));
    };

    match GitHubHost::new(&config.base_url, owner, token, config.timeout()) {
        Ok(host) => Arc::new(host),
        Err(e) => Arc::new(DisabledHost::new(e.to_string())),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_host_always_fails() {
        let host = DisabledHost::new("off");
        let err = host.create_repository("x", "y", &[]).await.unwrap_err();
        assert!(matches!(err, RepoError::Unavailable(ref r) if r == "off"));
        assert!(host.upload_file("x", "README.md", "hi").await.is_err());
    }

    #[test]
    fn test_from_config_disabled_provider() {
        let config = RepositoryConfig {
            provider: RepositoryProvider::Disabled,
            ..Default::default()
        };
        assert_eq!(from_config(&config).name(), "disabled");
    }

    #[test]
    fn test_from_config_missing_token() {
        let config = RepositoryConfig {
            token_env: "PILLARD_TEST_TOKEN_THAT_IS_NEVER_SET".to_string(),
            owner: Some("acme".to_string()),
            ..Default::default()
        };
        assert_eq!(from_config(&config).name(), "disabled");
    }
}
