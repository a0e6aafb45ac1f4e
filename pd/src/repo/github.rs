//! GitHub repository host

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{RepoError, RepoResult, RepositoryHost};

const USER_AGENT: &str = concat!("pillard/", env!("CARGO_PKG_VERSION"));

/// GitHub REST API client
pub struct GitHubHost {
    base_url: String,
    owner: String,
    token: String,
    http: Client,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct CreatedRepository {
    html_url: Option<String>,
}

impl GitHubHost {
    pub fn new(base_url: &str, owner: impl Into<String>, token: impl Into<String>, timeout: Duration) -> RepoResult<Self> {
        debug!(%base_url, ?timeout, "GitHubHost::new: called");
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(RepoError::Network)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            owner: owner.into(),
            token: token.into(),
            http,
            timeout,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
    }

    async fn send(&self, request: RequestBuilder) -> RepoResult<Response> {
        let response = self.authorized(request).send().await.map_err(|e| {
            if e.is_timeout() {
                RepoError::Timeout(self.timeout)
            } else {
                RepoError::Network(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            debug!(%status, "GitHubHost: API error");
            return Err(RepoError::Api { status, message });
        }
        Ok(response)
    }

    async fn set_topics(&self, name: &str, tags: &[String]) -> RepoResult<()> {
        let url = format!("{}/repos/{}/{}/topics", self.base_url, self.owner, name);
        let topics: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
        self.send(self.http.put(url).json(&json!({ "names": topics }))).await?;
        Ok(())
    }
}

#[async_trait]
impl RepositoryHost for GitHubHost {
    fn name(&self) -> &str {
        "github"
    }

    async fn create_repository(&self, name: &str, description: &str, tags: &[String]) -> RepoResult<String> {
        debug!(%name, "GitHubHost::create_repository: called");
        let url = format!("{}/user/repos", self.base_url);
        let body = json!({
            "name": name,
            "description": description,
            "private": false,
            "auto_init": true,
        });

        let response = self.send(self.http.post(url).json(&body)).await?;
        let created: CreatedRepository = response.json().await.map_err(RepoError::Network)?;
        let repo_url = created
            .html_url
            .unwrap_or_else(|| format!("https://github.com/{}/{}", self.owner, name));

        if !tags.is_empty()
            && let Err(e) = self.set_topics(name, tags).await
        {
            warn!(repo = %name, error = %e, "Failed to set repository topics");
        }

        debug!(%repo_url, "GitHubHost::create_repository: created");
        Ok(repo_url)
    }

    async fn upload_file(&self, repo: &str, path: &str, content: &str) -> RepoResult<()> {
        debug!(%repo, %path, "GitHubHost::upload_file: called");
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url,
            self.owner,
            repo,
            path.trim_start_matches('/')
        );
        let body = json!({
            "message": format!("Add {}", path),
            "content": STANDARD.encode(content),
        });
        self.send(self.http.put(url).json(&body)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn host(server: &mockito::ServerGuard) -> GitHubHost {
        GitHubHost::new(&server.url(), "acme", "secret", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_create_repository_returns_html_url() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/user/repos")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::PartialJson(json!({"name": "ai-support-bot", "auto_init": true})))
            .with_status(201)
            .with_body(r#"{"html_url": "https://github.com/acme/ai-support-bot"}"#)
            .create_async()
            .await;
        let topics = server
            .mock("PUT", "/repos/acme/ai-support-bot/topics")
            .match_body(Matcher::Json(json!({"names": ["python", "ai"]})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let url = host(&server)
            .create_repository("ai-support-bot", "Bot", &["Python".to_string(), "ai".to_string()])
            .await
            .unwrap();

        assert_eq!(url, "https://github.com/acme/ai-support-bot");
        create.assert_async().await;
        topics.assert_async().await;
    }

    #[tokio::test]
    async fn test_topics_failure_is_ignored() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/user/repos")
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;
        server
            .mock("PUT", "/repos/acme/cli-tool/topics")
            .with_status(500)
            .create_async()
            .await;

        let url = host(&server)
            .create_repository("cli-tool", "Tool", &["rust".to_string()])
            .await
            .unwrap();
        assert_eq!(url, "https://github.com/acme/cli-tool");
    }

    #[tokio::test]
    async fn test_create_repository_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/user/repos")
            .with_status(422)
            .with_body("name already exists on this account")
            .create_async()
            .await;

        let err = host(&server).create_repository("dup", "x", &[]).await.unwrap_err();
        match err {
            RepoError::Api { status, message } => {
                assert_eq!(status, 422);
                assert!(message.contains("already exists"));
            }
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_file_base64() {
        let mut server = mockito::Server::new_async().await;
        let upload = server
            .mock("PUT", "/repos/acme/cli-tool/contents/src/main.rs")
            .match_body(Matcher::PartialJson(json!({"content": STANDARD.encode("fn main() {}")})))
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;

        host(&server)
            .upload_file("cli-tool", "src/main.rs", "fn main() {}")
            .await
            .unwrap();
        upload.assert_async().await;
    }
}
