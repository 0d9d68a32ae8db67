//! MCP tool definitions and dispatch for the Reddit tools

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::protocol::{ToolCallResult, ToolDefinition};
use crate::error::{RedditMcpError, Result};
use crate::reddit::RedditService;
use crate::types::DEFAULT_LIMIT;

/// Tool names
pub mod names {
    pub const SEARCH: &str = "search";
    pub const HOT_ALL: &str = "hot-all";
    pub const HOT_BY_SUBREDDIT: &str = "hot-by-subreddit";
    pub const NEW_BY_SUBREDDIT: &str = "new-by-subreddit";
    pub const COMMENTS_BY_POST: &str = "comments-by-post";
}

/// All tool definitions: (name, description, JSON schema)
pub const TOOL_DEFINITIONS: &[(&str, &str, &str)] = &[
    (
        names::SEARCH,
        "Search Reddit posts by query",
        r#"{
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query for Reddit posts"},
                "limit": {"type": "integer", "minimum": 0, "description": "Number of results to return (default 10)"}
            },
            "required": ["query"]
        }"#,
    ),
    (
        names::HOT_ALL,
        "Get hot posts from all subreddits",
        r#"{
            "type": "object",
            "properties": {
                "limit": {"type": "integer", "minimum": 0, "description": "Number of results to return (default 10)"}
            }
        }"#,
    ),
    (
        names::HOT_BY_SUBREDDIT,
        "Get hot posts from a specific subreddit",
        r#"{
            "type": "object",
            "properties": {
                "subreddit": {"type": "string", "description": "Subreddit name (without r/ prefix)"},
                "limit": {"type": "integer", "minimum": 0, "description": "Number of results to return (default 10)"}
            },
            "required": ["subreddit"]
        }"#,
    ),
    (
        names::NEW_BY_SUBREDDIT,
        "Get newest posts from a specific subreddit",
        r#"{
            "type": "object",
            "properties": {
                "subreddit": {"type": "string", "description": "Subreddit name (without r/ prefix)"},
                "limit": {"type": "integer", "minimum": 0, "description": "Number of results to return (default 10)"}
            },
            "required": ["subreddit"]
        }"#,
    ),
    (
        names::COMMENTS_BY_POST,
        "Get comments for a specific Reddit post",
        r#"{
            "type": "object",
            "properties": {
                "subreddit": {"type": "string", "description": "Subreddit name (without r/ prefix)"},
                "postId": {"type": "string", "description": "Reddit post ID"}
            },
            "required": ["subreddit", "postId"]
        }"#,
    ),
];

/// Get all tool definitions as ToolDefinition structs
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    TOOL_DEFINITIONS
        .iter()
        .map(|(name, description, schema)| ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: serde_json::from_str(schema).unwrap_or(json!({})),
        })
        .collect()
}

pub fn is_known_tool(name: &str) -> bool {
    TOOL_DEFINITIONS.iter().any(|(n, _, _)| *n == name)
}

#[derive(Debug, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct HotAllArgs {
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SubredditListingArgs {
    pub subreddit: String,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CommentsArgs {
    pub subreddit: String,
    #[serde(rename = "postId")]
    pub post_id: String,
}

/// Deserialize tool arguments; absent arguments count as `{}`
fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = match arguments {
        Value::Null => json!({}),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| RedditMcpError::Validation(e.to_string()))
}

/// Dispatches `tools/call` requests to the Reddit service
#[derive(Clone)]
pub struct ToolRegistry {
    service: RedditService,
}

impl ToolRegistry {
    pub fn new(service: RedditService) -> Self {
        Self { service }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        get_tool_definitions()
    }

    /// Run a tool.
    ///
    /// Unknown tools are an `Err` (a JSON-RPC error for the caller). Bad
    /// arguments and handler failures are reported inside the returned
    /// [`ToolCallResult`] with `isError` set.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<ToolCallResult> {
        if !is_known_tool(name) {
            tracing::warn!(tool = name, "Unknown tool requested");
            return Err(RedditMcpError::Validation(format!("Tool {} not found", name)));
        }

        tracing::info!(tool = name, "Calling tool");
        match self.dispatch(name, arguments).await {
            Ok(result) => Ok(result),
            Err(RedditMcpError::Validation(detail)) => {
                tracing::warn!(tool = name, error = %detail, "Invalid tool arguments");
                Ok(ToolCallResult::error(format!(
                    "Invalid arguments for tool {}: {}",
                    name, detail
                )))
            }
            Err(e) => Ok(ToolCallResult::error(format!(
                "Error executing {}: {}",
                name, e
            ))),
        }
    }

    async fn dispatch(&self, name: &str, arguments: Value) -> Result<ToolCallResult> {
        match name {
            names::SEARCH => {
                let args: SearchArgs = parse_arguments(arguments)?;
                let posts = self
                    .service
                    .search_posts(&args.query, args.limit.unwrap_or(DEFAULT_LIMIT))
                    .await?;
                ToolCallResult::json(&posts)
            }
            names::HOT_ALL => {
                let args: HotAllArgs = parse_arguments(arguments)?;
                let posts = self
                    .service
                    .hot_all(args.limit.unwrap_or(DEFAULT_LIMIT))
                    .await?;
                ToolCallResult::json(&posts)
            }
            names::HOT_BY_SUBREDDIT => {
                let args: SubredditListingArgs = parse_arguments(arguments)?;
                let posts = self
                    .service
                    .hot_by_subreddit(&args.subreddit, args.limit.unwrap_or(DEFAULT_LIMIT))
                    .await?;
                ToolCallResult::json(&posts)
            }
            names::NEW_BY_SUBREDDIT => {
                let args: SubredditListingArgs = parse_arguments(arguments)?;
                let posts = self
                    .service
                    .new_by_subreddit(&args.subreddit, args.limit.unwrap_or(DEFAULT_LIMIT))
                    .await?;
                ToolCallResult::json(&posts)
            }
            names::COMMENTS_BY_POST => {
                let args: CommentsArgs = parse_arguments(arguments)?;
                let result = self
                    .service
                    .comments(&args.subreddit, &args.post_id)
                    .await?;
                ToolCallResult::json(&result)
            }
            _ => Err(RedditMcpError::Validation(format!("Tool {} not found", name))),
        }
    }
}
