//! Core types for the Reddit MCP server

use serde::{Deserialize, Serialize};

/// Service name reported by `/health` and the MCP `serverInfo`
pub const SERVICE_NAME: &str = "mcp-reddit-server";

/// Host the JSON API is fetched from
pub const DEFAULT_REDDIT_BASE_URL: &str = "https://www.reddit.com";

/// Origin prepended to permalinks to build post URLs
pub const REDDIT_WEB_ORIGIN: &str = "https://reddit.com";

/// Number of posts returned when a tool call omits `limit`
pub const DEFAULT_LIMIT: u32 = 10;

/// A Reddit post as returned to MCP clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub title: String,
    /// Web URL built from the upstream permalink
    pub url: String,
    pub author: String,
    pub subreddit: String,
    pub score: i64,
    pub num_comments: i64,
}

/// A top-level comment on a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub author: String,
    pub body: String,
    pub score: i64,
    /// Unix timestamp in seconds, as reported by Reddit
    pub created_utc: f64,
}

/// A post together with its top-level comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostWithComments {
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// Upstream client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    /// Base URL of the JSON API (no trailing slash)
    pub base_url: String,
    /// Value sent in the `User-Agent` header on every request
    pub user_agent: String,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REDDIT_BASE_URL.to_string(),
            user_agent: default_user_agent(),
        }
    }
}

/// `mcp-reddit-server/<version>`
pub fn default_user_agent() -> String {
    format!("{}/{}", SERVICE_NAME, env!("CARGO_PKG_VERSION"))
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub reddit: RedditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            reddit: RedditConfig::default(),
        }
    }
}
