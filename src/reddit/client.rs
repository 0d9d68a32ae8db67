//! HTTP client for Reddit's public JSON API

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde_json::Value;

use crate::error::{RedditMcpError, Result};
use crate::types::RedditConfig;

/// Maximum number of body characters kept in an upstream error message
const ERROR_BODY_EXCERPT: usize = 200;

/// Source of raw upstream JSON.
///
/// The service layer talks to Reddit only through this trait so tests can
/// substitute a stub that records the requested paths.
#[async_trait]
pub trait RedditApi: Send + Sync {
    /// GET `path` with the given query parameters and decode the body as JSON.
    ///
    /// Query values are passed raw; implementations are responsible for
    /// URL-encoding them.
    async fn fetch_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value>;
}

/// reqwest-backed client for `https://www.reddit.com`
#[derive(Clone)]
pub struct RedditClient {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl RedditClient {
    /// Create a new client from configuration
    pub fn new(config: &RedditConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for RedditClient {
    fn default() -> Self {
        Self::new(&RedditConfig::default())
    }
}

#[async_trait]
impl RedditApi for RedditClient {
    async fn fetch_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, ?query, "Fetching Reddit JSON");

        let mut request = self
            .client
            .get(&url)
            .header(USER_AGENT, self.user_agent.as_str());
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RedditMcpError::Upstream(format!(
                "HTTP {}: {}",
                status,
                excerpt(&text)
            )));
        }

        let data: Value = response.json().await?;
        Ok(data)
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_BODY_EXCERPT {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(ERROR_BODY_EXCERPT).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> RedditClient {
        RedditClient::new(&RedditConfig {
            base_url: format!("{}/", server.uri()),
            user_agent: "test-agent/1.0".to_string(),
        })
    }

    #[tokio::test]
    async fn test_fetch_json_sends_user_agent_and_encoded_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("q", "rust & cats"))
            .and(query_param("limit", "5"))
            .and(header("user-agent", "test-agent/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kind": "Listing"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let value = client
            .fetch_json(
                "/search.json",
                &[("q", "rust & cats".to_string()), ("limit", "5".to_string())],
            )
            .await
            .unwrap();

        assert_eq!(value["kind"], "Listing");
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/all/hot.json"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .fetch_json("/r/all/hot.json", &[("limit", "10".to_string())])
            .await
            .unwrap_err();

        assert!(err.is_upstream());
        let message = err.to_string();
        assert!(message.contains("429"), "unexpected message: {message}");
        assert!(message.contains("Too Many Requests"));
    }

    #[tokio::test]
    async fn test_invalid_json_body_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.fetch_json("/r/rust/new.json", &[]).await.unwrap_err();
        assert!(err.is_upstream());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = RedditClient::new(&RedditConfig {
            base_url: "https://example.com///".to_string(),
            user_agent: "ua".to_string(),
        });
        assert_eq!(client.base_url(), "https://example.com");
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let long = "x".repeat(500);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), ERROR_BODY_EXCERPT + 3);
        assert!(cut.ends_with("..."));
    }
}
