//! Session management for the Streamable HTTP transport
//!
//! Sessions are identified by the `mcp-session-id` header, assigned during
//! initialization and required on every later request.

mod manager;
mod store;
mod transport;

pub use manager::{HandlerFactory, SessionManager};
pub use store::{InMemorySessionStore, SessionStore};
pub use transport::{CloseHook, McpSession, NotificationStream, SessionId, SessionReply};
