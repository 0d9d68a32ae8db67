//! A live session: one client's protocol handler plus its notification channel

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::BroadcastStream;

use crate::error::Result;
use crate::mcp::{codes, is_initialize_request, McpHandler, McpNotification, McpRequest, McpResponse};

/// Session identifier (UUID v4)
pub type SessionId = String;

/// Hook run exactly once when a session closes
pub type CloseHook = Box<dyn FnOnce(&str) + Send>;

/// Outcome of posting a message body to a session
#[derive(Debug, Clone)]
pub enum SessionReply {
    /// JSON-RPC response, or array of responses for a batch
    Json(Value),
    /// Body held only notifications or client responses
    Accepted,
    /// Rejected before reaching the handler
    Rejected(McpResponse),
}

/// Active session bound to a protocol handler
pub struct McpSession {
    id: SessionId,
    handler: Arc<dyn McpHandler>,
    notifications: broadcast::Sender<McpNotification>,
    initialized: AtomicBool,
    stream_open: AtomicBool,
    closed: watch::Sender<bool>,
    on_close: Mutex<Option<CloseHook>>,
}

impl McpSession {
    pub fn new(
        id: SessionId,
        handler: Arc<dyn McpHandler>,
        notifications: broadcast::Sender<McpNotification>,
        on_close: CloseHook,
    ) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            id,
            handler,
            notifications,
            initialized: AtomicBool::new(false),
            stream_open: AtomicBool::new(false),
            closed,
            on_close: Mutex::new(Some(on_close)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Route a POST body (single message or batch) through the handler
    pub async fn handle_post(&self, body: Value) -> Result<SessionReply> {
        let is_batch = body.is_array();
        let messages = match body {
            Value::Array(messages) => messages,
            message => vec![message],
        };

        if messages.is_empty() {
            return Ok(SessionReply::Rejected(McpResponse::error(
                None,
                codes::INVALID_REQUEST,
                "Invalid Request: Empty batch",
            )));
        }

        if messages.iter().any(is_initialize_request) {
            if messages.len() > 1 {
                return Ok(SessionReply::Rejected(McpResponse::error(
                    None,
                    codes::INVALID_REQUEST,
                    "Invalid Request: Only one initialization request is allowed",
                )));
            }
            if self.initialized.swap(true, Ordering::SeqCst) {
                return Ok(SessionReply::Rejected(McpResponse::error(
                    None,
                    codes::INVALID_REQUEST,
                    "Invalid Request: Server already initialized",
                )));
            }
        }

        let mut responses = Vec::new();
        for message in messages {
            // Responses to server-initiated requests carry no method.
            if message.get("method").is_none() {
                continue;
            }

            let id = message.get("id").cloned();
            match serde_json::from_value::<McpRequest>(message) {
                Ok(request) => {
                    if let Some(response) = self.handler.handle_request(request).await {
                        responses.push(response);
                    }
                }
                Err(e) => responses.push(McpResponse::error(
                    id,
                    codes::INVALID_REQUEST,
                    format!("Invalid Request: {}", e),
                )),
            }
        }

        if responses.is_empty() {
            return Ok(SessionReply::Accepted);
        }

        let value = if is_batch {
            serde_json::to_value(&responses)?
        } else {
            serde_json::to_value(&responses[0])?
        };
        Ok(SessionReply::Json(value))
    }

    /// Open the server-to-client notification stream.
    ///
    /// Returns `None` when a stream is already open for this session. The
    /// stream ends when the session closes.
    pub fn open_stream(self: &Arc<Self>) -> Option<NotificationStream> {
        if self.stream_open.swap(true, Ordering::SeqCst) {
            return None;
        }

        let updates = BroadcastStream::new(self.notifications.subscribe())
            .filter_map(|item| futures::future::ready(item.ok()))
            .take_until(wait_closed(self.closed.subscribe()));

        Some(NotificationStream {
            inner: Box::pin(updates),
            session: Arc::clone(self),
        })
    }

    /// Close the session and run its close hook. Idempotent.
    pub fn close(&self) {
        if self.closed.send_replace(true) {
            return;
        }

        let hook = self.on_close.lock().take();
        if let Some(hook) = hook {
            hook(&self.id);
        }
    }
}

async fn wait_closed(mut closed: watch::Receiver<bool>) {
    loop {
        if *closed.borrow_and_update() {
            return;
        }
        if closed.changed().await.is_err() {
            return;
        }
    }
}

/// Notifications for one session; releases the session's stream slot on drop
pub struct NotificationStream {
    inner: Pin<Box<dyn Stream<Item = McpNotification> + Send>>,
    session: Arc<McpSession>,
}

impl Stream for NotificationStream {
    type Item = McpNotification;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for NotificationStream {
    fn drop(&mut self) {
        self.session.stream_open.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    /// Echoes the method name back as the result
    struct EchoHandler;

    #[async_trait]
    impl McpHandler for EchoHandler {
        async fn handle_request(&self, request: McpRequest) -> Option<McpResponse> {
            if request.is_notification() {
                return None;
            }
            Some(McpResponse::success(request.id, json!(request.method)))
        }
    }

    fn session_with_hook(hook: CloseHook) -> Arc<McpSession> {
        let (tx, _) = broadcast::channel(8);
        Arc::new(McpSession::new(
            "sid-1".to_string(),
            Arc::new(EchoHandler),
            tx,
            hook,
        ))
    }

    fn session() -> Arc<McpSession> {
        session_with_hook(Box::new(|_: &str| {}))
    }

    #[tokio::test]
    async fn test_single_request_reply() {
        let session = session();
        let reply = session
            .handle_post(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}))
            .await
            .unwrap();

        match reply {
            SessionReply::Json(value) => assert_eq!(value["result"], "ping"),
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_batch_reply_skips_notifications() {
        let session = session();
        let reply = session
            .handle_post(json!([
                {"jsonrpc": "2.0", "id": 1, "method": "ping"},
                {"jsonrpc": "2.0", "method": "notifications/initialized"},
                {"jsonrpc": "2.0", "id": 2, "method": "tools/list"}
            ]))
            .await
            .unwrap();

        match reply {
            SessionReply::Json(Value::Array(items)) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[1]["id"], 2);
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_notification_only_is_accepted() {
        let session = session();
        let reply = session
            .handle_post(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await
            .unwrap();
        assert!(matches!(reply, SessionReply::Accepted));
    }

    #[tokio::test]
    async fn test_second_initialize_rejected() {
        let session = session();
        let init = json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}});

        let first = session.handle_post(init.clone()).await.unwrap();
        assert!(matches!(first, SessionReply::Json(_)));
        assert!(session.is_initialized());

        match session.handle_post(init).await.unwrap() {
            SessionReply::Rejected(response) => {
                let error = response.error.unwrap();
                assert_eq!(error.code, codes::INVALID_REQUEST);
                assert_eq!(error.message, "Invalid Request: Server already initialized");
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_message_gets_invalid_request() {
        let session = session();
        let reply = session
            .handle_post(json!({"jsonrpc": "2.0", "id": 9, "method": 42}))
            .await
            .unwrap();
        match reply {
            SessionReply::Json(value) => {
                assert_eq!(value["error"]["code"], codes::INVALID_REQUEST);
                assert_eq!(value["id"], 9);
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[test]
    fn test_close_runs_hook_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let session = session_with_hook(Box::new(move |id: &str| {
            assert_eq!(id, "sid-1");
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        session.close();
        session.close();
        assert!(session.is_closed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stream_receives_notifications_and_ends_on_close() {
        let (tx, _) = broadcast::channel(8);
        let session = Arc::new(McpSession::new(
            "sid-2".to_string(),
            Arc::new(EchoHandler),
            tx.clone(),
            Box::new(|_: &str| {}),
        ));
        let mut stream = session.open_stream().unwrap();
        assert!(session.open_stream().is_none());

        tx.send(McpNotification::new("notifications/message", json!({"level": "info"})))
            .unwrap();
        let received = stream.next().await.unwrap();
        assert_eq!(received.method, "notifications/message");

        session.close();
        assert!(stream.next().await.is_none());

        drop(stream);
        assert!(session.open_stream().is_some());
    }
}
