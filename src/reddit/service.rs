//! Reddit query operations backing the MCP tools

use std::sync::Arc;

use crate::error::{RedditMcpError, Result};
use crate::types::{Post, PostWithComments};

use super::client::RedditApi;
use super::transform::{parse_comments, parse_listing};

/// Check that a user-supplied path segment (subreddit, post id) is safe to
/// splice into an upstream path.
///
/// Accepts ASCII letters, digits, `_`, `-` and `+` (multireddits).
pub fn validate_path_segment(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(RedditMcpError::Validation(format!(
            "{} must not be empty",
            field
        )));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+')))
    {
        return Err(RedditMcpError::Validation(format!(
            "{} contains invalid character {:?}",
            field, bad
        )));
    }
    Ok(())
}

/// Typed Reddit operations over a [`RedditApi`]
#[derive(Clone)]
pub struct RedditService {
    api: Arc<dyn RedditApi>,
}

impl RedditService {
    pub fn new(api: Arc<dyn RedditApi>) -> Self {
        Self { api }
    }

    /// Search posts across all of Reddit
    pub async fn search_posts(&self, query: &str, limit: u32) -> Result<Vec<Post>> {
        self.listing(
            "/search.json".to_string(),
            vec![("q", query.to_string())],
            limit,
        )
        .await
        .map_err(|e| {
            tracing::error!(query, limit, error = %e, "Failed to search Reddit posts");
            e.context("Failed to search Reddit posts")
        })
    }

    /// Hot posts from r/all
    pub async fn hot_all(&self, limit: u32) -> Result<Vec<Post>> {
        self.listing("/r/all/hot.json".to_string(), Vec::new(), limit)
            .await
            .map_err(|e| {
                tracing::error!(limit, error = %e, "Failed to get hot posts from all subreddits");
                e.context("Failed to get hot posts from all subreddits")
            })
    }

    /// Hot posts from one subreddit
    pub async fn hot_by_subreddit(&self, subreddit: &str, limit: u32) -> Result<Vec<Post>> {
        validate_path_segment("subreddit", subreddit)?;
        self.listing(format!("/r/{}/hot.json", subreddit), Vec::new(), limit)
            .await
            .map_err(|e| {
                tracing::error!(subreddit, limit, error = %e, "Failed to get hot posts from subreddit");
                e.context("Failed to get hot posts from subreddit")
            })
    }

    /// Newest posts from one subreddit
    pub async fn new_by_subreddit(&self, subreddit: &str, limit: u32) -> Result<Vec<Post>> {
        validate_path_segment("subreddit", subreddit)?;
        self.listing(format!("/r/{}/new.json", subreddit), Vec::new(), limit)
            .await
            .map_err(|e| {
                tracing::error!(subreddit, limit, error = %e, "Failed to get new posts from subreddit");
                e.context("Failed to get new posts from subreddit")
            })
    }

    /// A post and its top-level comments
    pub async fn comments(&self, subreddit: &str, post_id: &str) -> Result<PostWithComments> {
        validate_path_segment("subreddit", subreddit)?;
        validate_path_segment("postId", post_id)?;

        let path = format!("/r/{}/comments/{}.json", subreddit, post_id);
        let result = match self.api.fetch_json(&path, &[]).await {
            Ok(value) => parse_comments(value),
            Err(e) => Err(e),
        };

        result.map_err(|e| {
            tracing::error!(subreddit, post_id, error = %e, "Failed to get comments for Reddit post");
            e.context("Failed to get comments for Reddit post")
        })
    }

    /// Fetch a post listing. A zero limit short-circuits to an empty list.
    async fn listing(
        &self,
        path: String,
        mut query: Vec<(&'static str, String)>,
        limit: u32,
    ) -> Result<Vec<Post>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        query.push(("limit", limit.to_string()));

        let value = self.api.fetch_json(&path, &query).await?;
        let mut posts = parse_listing(value)?;
        posts.truncate(limit as usize);
        Ok(posts)
    }
}
