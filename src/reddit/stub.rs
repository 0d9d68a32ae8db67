//! In-process [`RedditApi`] that replays a canned payload and records requests

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{RedditMcpError, Result};

use super::client::RedditApi;

/// A request seen by [`StubRedditApi`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl RecordedCall {
    /// Value of a query parameter, if it was sent
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

enum Reply {
    Json(Value),
    Error(String),
}

/// Stub upstream used by tests and benchmarks
pub struct StubRedditApi {
    reply: Reply,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubRedditApi {
    /// Answer every request with `value`
    pub fn with_response(value: Value) -> Self {
        Self {
            reply: Reply::Json(value),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail every request with an upstream error carrying `message`
    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            reply: Reply::Error(message.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl RedditApi for StubRedditApi {
    async fn fetch_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        self.calls.lock().push(RecordedCall {
            path: path.to_string(),
            query: query
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
        });

        match &self.reply {
            Reply::Json(value) => Ok(value.clone()),
            Reply::Error(message) => Err(RedditMcpError::Upstream(message.clone())),
        }
    }
}
