//! Session lifecycle: create on `initialize`, route by id, remove on close

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::store::{InMemorySessionStore, SessionStore};
use super::transport::{McpSession, SessionReply};
use crate::error::{RedditMcpError, Result};
use crate::mcp::{McpHandler, McpNotification, RedditHandler, ToolRegistry};
use crate::reddit::RedditService;

/// Buffered notifications per session before slow streams start lagging
const NOTIFICATION_BUFFER: usize = 64;

/// Builds the protocol handler for a new session from its notification sender
pub type HandlerFactory =
    Arc<dyn Fn(broadcast::Sender<McpNotification>) -> Arc<dyn McpHandler> + Send + Sync>;

/// Owns the session table and the recipe for new session handlers
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    factory: HandlerFactory,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, factory: HandlerFactory) -> Self {
        Self { store, factory }
    }

    /// In-memory sessions serving the Reddit tools
    pub fn for_reddit(service: RedditService) -> Self {
        let tools = ToolRegistry::new(service);
        let factory: HandlerFactory =
            Arc::new(move |notifications: broadcast::Sender<McpNotification>| {
                Arc::new(RedditHandler::new(tools.clone(), notifications)) as Arc<dyn McpHandler>
            });
        Self::new(Arc::new(InMemorySessionStore::new()), factory)
    }

    /// Look up a live session
    pub fn get(&self, id: &str) -> Option<Arc<McpSession>> {
        self.store.get(id)
    }

    pub fn session_count(&self) -> usize {
        self.store.len()
    }

    /// Handle an initialization body that arrived without a session id.
    ///
    /// A fresh session runs the body; it is stored (and returned) only if
    /// initialization succeeded.
    pub async fn initialize(&self, body: Value) -> Result<(Option<Arc<McpSession>>, SessionReply)> {
        let session = Arc::new(self.new_session());
        let reply = session.handle_post(body).await?;

        if !(session.is_initialized() && initialize_succeeded(&reply)) {
            return Ok((None, reply));
        }

        if !self.store.insert(Arc::clone(&session)) {
            return Err(RedditMcpError::Internal(format!(
                "session id collision: {}",
                session.id()
            )));
        }

        tracing::info!(session_id = %session.id(), sessions = self.store.len(), "Session initialized");
        Ok((Some(session), reply))
    }

    /// Close a session by id. Returns `false` if it was not live.
    pub fn terminate(&self, id: &str) -> bool {
        match self.store.get(id) {
            Some(session) => {
                session.close();
                true
            }
            None => false,
        }
    }

    /// Close every live session
    pub fn shutdown(&self) {
        let ids = self.store.ids();
        let count = ids.len();
        for id in ids {
            self.terminate(&id);
        }
        tracing::info!(sessions = count, "Closed all sessions");
    }

    fn new_session(&self) -> McpSession {
        let id = loop {
            let candidate = Uuid::new_v4().to_string();
            if !self.store.contains(&candidate) {
                break candidate;
            }
        };

        let (notifications, _) = broadcast::channel(NOTIFICATION_BUFFER);
        let handler = (self.factory)(notifications.clone());

        let store = Arc::downgrade(&self.store);
        let on_close = Box::new(move |id: &str| {
            if let Some(store) = store.upgrade() {
                if store.remove(id).is_some() {
                    tracing::info!(session_id = %id, "Session closed");
                }
            }
        });

        McpSession::new(id, handler, notifications, on_close)
    }
}

/// The reply is a single JSON-RPC response carrying a result and no error
fn initialize_succeeded(reply: &SessionReply) -> bool {
    match reply {
        SessionReply::Json(value) => value.get("result").is_some() && value.get("error").is_none(),
        _ => false,
    }
}
