//! MCP (Model Context Protocol) server implementation
//!
//! JSON-RPC message types, the per-session method dispatcher, and the
//! Reddit tool registry.

pub mod handler;
pub mod protocol;
pub mod tools;

pub use handler::RedditHandler;
pub use protocol::{
    codes, contains_initialize_request, is_initialize_request, methods, InitializeResult,
    LoggingLevel, McpHandler, McpNotification, McpRequest, McpResponse, ToolCallResult,
};
pub use tools::{get_tool_definitions, ToolRegistry, TOOL_DEFINITIONS};
