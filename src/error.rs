//! Error types for the Reddit MCP server

use thiserror::Error;

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, RedditMcpError>;

/// Main error type for the Reddit MCP server
#[derive(Error, Debug)]
pub enum RedditMcpError {
    #[error("{0}")]
    Validation(String),

    #[error("Reddit API request failed: {0}")]
    Upstream(String),

    #[error("Unexpected Reddit response: {0}")]
    Parse(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<RedditMcpError>,
    },

    #[error("Bad Request: {0}")]
    Session(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for RedditMcpError {
    fn from(e: reqwest::Error) -> Self {
        RedditMcpError::Upstream(e.to_string())
    }
}

impl RedditMcpError {
    /// Wrap an error with a service-level message
    pub fn context(self, context: impl Into<String>) -> Self {
        RedditMcpError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any context wrappers
    pub fn root(&self) -> &RedditMcpError {
        match self {
            RedditMcpError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.root(), RedditMcpError::Validation(_))
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self.root(), RedditMcpError::Upstream(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self.root(), RedditMcpError::Parse(_))
    }

    /// Get error code for the JSON-RPC layer
    pub fn code(&self) -> i64 {
        match self.root() {
            RedditMcpError::Validation(_) => -32602,
            RedditMcpError::Session(_) => -32000,
            RedditMcpError::Serialization(_)
            | RedditMcpError::Io(_)
            | RedditMcpError::Internal(_) => -32603,
            _ => -32000,
        }
    }
}
