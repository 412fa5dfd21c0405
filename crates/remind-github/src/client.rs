//! Reqwest-backed GitHub client.
//!
//! One `reqwest::Client` is built at startup with the default header set
//! and a request timeout; a hung call fails the cycle instead of wedging
//! the cycle lock past its expiry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use remind_core::config::GithubConfig;
use remind_core::{Comment, Notification, RateLimitStatus, Reaction, ReactionRecord};

use crate::error::GithubError;
use crate::ReminderApi;

/// Accept header opting in to the reactions preview media type.
const ACCEPT_REACTIONS: &str = "application/vnd.github.squirrel-girl-preview";

/// Production GitHub API client.
#[derive(Debug)]
pub struct GithubClient {
    http: reqwest::Client,
    username: String,
    token: String,
    api_base: String,
}

impl GithubClient {
    /// Build a client from the GitHub config section.
    pub fn new(config: &GithubConfig, timeout: Duration) -> Result<Self, GithubError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(ACCEPT_REACTIONS),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&config.user_agent)
                .map_err(|e| GithubError::Config(format!("invalid user_agent: {e}")))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            username: config.handle.clone(),
            token: config.token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.token))
    }

    /// Map a non-2xx response to a status error, keeping the body for the
    /// cycle log.
    async fn check(url: &str, response: reqwest::Response) -> Result<reqwest::Response, GithubError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(url, status, body = %body, "GitHub request failed");
        Err(GithubError::Status {
            status,
            url: url.to_string(),
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GithubError> {
        let response = self.request(reqwest::Method::GET, url).send().await?;
        Self::check(url, response)
            .await?
            .json::<T>()
            .await
            .map_err(|e| GithubError::Decode(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct RateLimitEnvelope {
    rate: RateLimitStatus,
}

#[async_trait]
impl ReminderApi for GithubClient {
    async fn notifications(&self) -> Result<Vec<Notification>, GithubError> {
        self.get_json(&format!("{}/notifications", self.api_base)).await
    }

    async fn thread_comments(&self, subject_url: &str) -> Result<Vec<Comment>, GithubError> {
        self.get_json(&format!("{subject_url}/comments")).await
    }

    async fn comment_reactions(
        &self,
        comment_url: &str,
    ) -> Result<Vec<ReactionRecord>, GithubError> {
        self.get_json(&format!("{comment_url}/reactions")).await
    }

    async fn add_reaction(
        &self,
        comment_url: &str,
        reaction: Reaction,
    ) -> Result<(), GithubError> {
        let url = format!("{comment_url}/reactions");
        let response = self
            .request(reqwest::Method::POST, &url)
            .json(&serde_json::json!({ "content": reaction.content() }))
            .send()
            .await?;
        Self::check(&url, response).await?;
        Ok(())
    }

    async fn post_reply(&self, issue_url: &str, body: &str) -> Result<(), GithubError> {
        let url = format!("{issue_url}/comments");
        let response = self
            .request(reqwest::Method::POST, &url)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;
        Self::check(&url, response).await?;
        Ok(())
    }

    async fn mark_read(&self, thread_url: &str) -> Result<(), GithubError> {
        let response = self.request(reqwest::Method::PATCH, thread_url).send().await?;
        Self::check(thread_url, response).await?;
        Ok(())
    }

    async fn rate_limit(&self) -> Result<RateLimitStatus, GithubError> {
        let envelope: RateLimitEnvelope = self
            .get_json(&format!("{}/rate_limit", self.api_base))
            .await?;
        Ok(envelope.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GithubConfig {
        GithubConfig {
            handle: "RemindMe".to_string(),
            token: "ghp_test".to_string(),
            user_agent: "remindme-bot/0.1".to_string(),
            api_base: "https://api.github.com/".to_string(),
        }
    }

    #[test]
    fn test_client_construction_trims_base_slash() {
        let client = GithubClient::new(&config(), Duration::from_secs(10)).unwrap();
        assert_eq!(client.api_base, "https://api.github.com");
    }

    #[test]
    fn test_client_rejects_invalid_user_agent() {
        let mut cfg = config();
        cfg.user_agent = "bad\nagent".to_string();
        let err = GithubClient::new(&cfg, Duration::from_secs(10)).unwrap_err();
        assert!(matches!(err, GithubError::Config(_)));
    }

    #[tokio::test]
    #[ignore] // Requires real credentials
    async fn test_rate_limit_live() {
        let mut cfg = config();
        cfg.handle = std::env::var("REMINDME_HANDLE").expect("REMINDME_HANDLE not set");
        cfg.token = std::env::var("REMINDME_TOKEN").expect("REMINDME_TOKEN not set");
        let client = GithubClient::new(&cfg, Duration::from_secs(10)).unwrap();
        let status = client.rate_limit().await.unwrap();
        assert!(status.limit > 0);
    }
}
