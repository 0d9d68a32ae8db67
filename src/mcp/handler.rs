//! Per-session MCP method dispatcher

use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use super::protocol::{
    codes, methods, InitializeResult, LoggingLevel, McpHandler, McpNotification, McpRequest,
    McpResponse,
};
use super::tools::ToolRegistry;
use crate::types::SERVICE_NAME;

/// MCP request handler for one session
pub struct RedditHandler {
    tools: ToolRegistry,
    /// Server-initiated messages for the session's notification stream
    notifications: broadcast::Sender<McpNotification>,
    /// Minimum level forwarded as `notifications/message`
    log_level: AtomicU8,
}

impl RedditHandler {
    pub fn new(tools: ToolRegistry, notifications: broadcast::Sender<McpNotification>) -> Self {
        Self {
            tools,
            notifications,
            log_level: AtomicU8::new(LoggingLevel::Info.as_u8()),
        }
    }

    pub fn log_level(&self) -> LoggingLevel {
        LoggingLevel::from_u8(self.log_level.load(Ordering::Relaxed))
    }

    /// Push a log notification to the client if it passes the session's level
    fn notify_log(&self, level: LoggingLevel, data: Value) {
        if level < self.log_level() {
            return;
        }
        // No open stream means nobody is listening; dropping is fine.
        let _ = self.notifications.send(McpNotification::new(
            methods::LOG_MESSAGE,
            json!({
                "level": level,
                "logger": SERVICE_NAME,
                "data": data,
            }),
        ));
    }

    async fn call_tool(&self, id: Option<Value>, params: &Value) -> McpResponse {
        let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        match self.tools.call(name, arguments).await {
            Ok(result) => {
                if result.is_error == Some(true) {
                    self.notify_log(
                        LoggingLevel::Error,
                        json!({"tool": name, "error": result.first_text()}),
                    );
                }
                McpResponse::success(id, json!(result))
            }
            Err(e) => McpResponse::from_error(id, e),
        }
    }

    fn set_log_level(&self, id: Option<Value>, params: &Value) -> McpResponse {
        let level = params
            .get("level")
            .cloned()
            .map(serde_json::from_value::<LoggingLevel>);

        match level {
            Some(Ok(level)) => {
                self.log_level.store(level.as_u8(), Ordering::Relaxed);
                tracing::debug!(?level, "Session log level changed");
                McpResponse::success(id, json!({}))
            }
            _ => McpResponse::error(id, codes::INVALID_PARAMS, "Invalid log level"),
        }
    }
}

#[async_trait]
impl McpHandler for RedditHandler {
    async fn handle_request(&self, request: McpRequest) -> Option<McpResponse> {
        if request.is_notification() {
            match request.method.as_str() {
                methods::INITIALIZED => tracing::debug!("Client finished initialization"),
                methods::CANCELLED => tracing::debug!(params = %request.params, "Client cancelled request"),
                other => tracing::debug!(method = other, "Ignoring notification"),
            }
            return None;
        }

        let id = request.id;
        let response = match request.method.as_str() {
            methods::INITIALIZE => {
                let requested = request
                    .params
                    .get("protocolVersion")
                    .and_then(|v| v.as_str());
                let result = InitializeResult::negotiate(requested);
                McpResponse::success(id, json!(result))
            }
            methods::PING => McpResponse::success(id, json!({})),
            methods::LIST_TOOLS => {
                let tools = self.tools.definitions();
                McpResponse::success(id, json!({"tools": tools}))
            }
            methods::CALL_TOOL => self.call_tool(id, &request.params).await,
            methods::SET_LOG_LEVEL => self.set_log_level(id, &request.params),
            _ => McpResponse::error(
                id,
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };

        Some(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reddit::{RedditService, StubRedditApi};
    use std::sync::Arc;

    fn handler(stub: StubRedditApi) -> (RedditHandler, broadcast::Receiver<McpNotification>) {
        let (tx, rx) = broadcast::channel(16);
        let tools = ToolRegistry::new(RedditService::new(Arc::new(stub)));
        (RedditHandler::new(tools, tx), rx)
    }

    fn request(id: i64, method: &str, params: Value) -> McpRequest {
        McpRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(id)),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn test_initialize() {
        let (handler, _rx) = handler(StubRedditApi::with_response(json!({})));
        let response = handler
            .handle_request(request(1, "initialize", json!({"protocolVersion": "2025-03-26"})))
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["serverInfo"]["name"], "mcp-reddit-server");
        assert_eq!(response.id, json!(1));
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let (handler, _rx) = handler(StubRedditApi::with_response(json!({})));
        let notification = McpRequest {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: "notifications/initialized".to_string(),
            params: Value::Null,
        };
        assert!(handler.handle_request(notification).await.is_none());
    }

    #[tokio::test]
    async fn test_list_tools() {
        let (handler, _rx) = handler(StubRedditApi::with_response(json!({})));
        let response = handler
            .handle_request(request(2, "tools/list", Value::Null))
            .await
            .unwrap();
        let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 5);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let (handler, _rx) = handler(StubRedditApi::with_response(json!({})));
        let response = handler
            .handle_request(request(3, "resources/list", Value::Null))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tool_error_pushes_log_notification() {
        let (handler, mut rx) = handler(StubRedditApi::with_error("HTTP 502 Bad Gateway"));
        let response = handler
            .handle_request(request(
                4,
                "tools/call",
                json!({"name": "hot-all", "arguments": {"limit": 3}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.result.unwrap()["isError"], json!(true));

        let notification = rx.try_recv().unwrap();
        assert_eq!(notification.method, "notifications/message");
        assert_eq!(notification.params["level"], "error");
        assert_eq!(notification.params["data"]["tool"], "hot-all");
    }

    #[tokio::test]
    async fn test_set_log_level_filters_notifications() {
        let (handler, mut rx) = handler(StubRedditApi::with_error("down"));
        let response = handler
            .handle_request(request(5, "logging/setLevel", json!({"level": "critical"})))
            .await
            .unwrap();
        assert!(!response.is_error());
        assert_eq!(handler.log_level(), LoggingLevel::Critical);

        handler
            .handle_request(request(6, "tools/call", json!({"name": "hot-all"})))
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());

        let bad = handler
            .handle_request(request(7, "logging/setLevel", json!({"level": "loud"})))
            .await
            .unwrap();
        assert_eq!(bad.error.unwrap().code, codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_jsonrpc_error() {
        let (handler, _rx) = handler(StubRedditApi::with_response(json!({})));
        let response = handler
            .handle_request(request(8, "tools/call", json!({"name": "nope"})))
            .await
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, codes::INVALID_PARAMS);
        assert_eq!(error.message, "Tool nope not found");
    }
}
