//! Session table behind an injectable store interface

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::transport::{McpSession, SessionId};

/// Keyed storage for live sessions.
///
/// Presence in the store is what makes a session "alive"; the HTTP layer
/// never holds sessions anywhere else.
pub trait SessionStore: Send + Sync {
    fn get(&self, id: &str) -> Option<Arc<McpSession>>;

    /// Insert a session under its own id. Returns `false` (and leaves the
    /// store untouched) if the id is already taken.
    fn insert(&self, session: Arc<McpSession>) -> bool;

    fn remove(&self, id: &str) -> Option<Arc<McpSession>>;

    fn ids(&self) -> Vec<SessionId>;

    fn len(&self) -> usize;

    fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-memory session store
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, Arc<McpSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, id: &str) -> Option<Arc<McpSession>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    fn insert(&self, session: Arc<McpSession>) -> bool {
        match self.sessions.entry(session.id().to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(session);
                true
            }
        }
    }

    fn remove(&self, id: &str) -> Option<Arc<McpSession>> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    fn ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::{McpHandler, McpRequest, McpResponse};
    use async_trait::async_trait;
    use tokio::sync::broadcast;

    struct NullHandler;

    #[async_trait]
    impl McpHandler for NullHandler {
        async fn handle_request(&self, _request: McpRequest) -> Option<McpResponse> {
            None
        }
    }

    fn session(id: &str) -> Arc<McpSession> {
        let (tx, _) = broadcast::channel(1);
        Arc::new(McpSession::new(
            id.to_string(),
            Arc::new(NullHandler),
            tx,
            Box::new(|_: &str| {}),
        ))
    }

    #[test]
    fn test_insert_get_remove() {
        let store = InMemorySessionStore::new();
        assert!(store.is_empty());

        assert!(store.insert(session("a")));
        assert!(store.contains("a"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().id(), "a");

        assert!(store.remove("a").is_some());
        assert!(!store.contains("a"));
        assert!(store.remove("a").is_none());
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let store = InMemorySessionStore::new();
        let first = session("dup");
        assert!(store.insert(first.clone()));
        assert!(!store.insert(session("dup")));
        assert!(Arc::ptr_eq(&store.get("dup").unwrap(), &first));
    }
}
