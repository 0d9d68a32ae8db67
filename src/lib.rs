//! mcp-reddit-server - Reddit queries as MCP tools
//!
//! Read-only Reddit search, listings and comments exposed as MCP tools over
//! the Streamable HTTP transport, with per-client sessions.

pub mod error;
pub mod http;
pub mod mcp;
pub mod reddit;
pub mod session;
pub mod types;

pub use error::{RedditMcpError, Result};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
