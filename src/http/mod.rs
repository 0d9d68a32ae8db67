//! Streamable HTTP transport
//!
//! - `POST /mcp` - Send JSON-RPC requests
//! - `GET /mcp` - Open SSE stream for server messages
//! - `DELETE /mcp` - Terminate session
//! - `GET /health` - Liveness check

mod server;

pub use server::{HttpServer, SESSION_HEADER};
