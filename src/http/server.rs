//! HTTP front door: MCP Streamable HTTP endpoints plus a health check

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::error::{RedditMcpError, Result};
use crate::mcp::{codes, contains_initialize_request, McpResponse};
use crate::session::{SessionManager, SessionReply};
use crate::types::{ServerConfig, SERVICE_NAME};

/// Header carrying the session identifier in both directions
pub const SESSION_HEADER: &str = "mcp-session-id";

/// HTTP server for the MCP endpoint
pub struct HttpServer {
    sessions: SessionManager,
    addr: SocketAddr,
}

impl HttpServer {
    /// Create a new server bound to `host:port` once started
    pub fn new(sessions: SessionManager, config: &ServerConfig) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port)
            .parse::<SocketAddr>()
            .map_err(|e| {
                RedditMcpError::Config(format!(
                    "invalid listen address {}:{}: {}",
                    config.host, config.port, e
                ))
            })?;
        Ok(Self { sessions, addr })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Build the router
    pub fn router(sessions: SessionManager) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/mcp", post(post_mcp).get(get_mcp).delete(delete_mcp))
            .layer(TraceLayer::new_for_http())
            .with_state(sessions)
    }

    /// Bind the listening socket
    pub async fn bind(&self) -> Result<TcpListener> {
        Ok(TcpListener::bind(self.addr).await?)
    }

    /// Serve requests on `listener` until the process stops
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let local = listener.local_addr()?;

        tracing::info!("MCP Reddit Server running on http://{}", local);
        tracing::info!("Health check available at http://{}/health", local);
        tracing::info!("MCP endpoint available at http://{}/mcp", local);

        let app = Self::router(self.sessions);
        axum::serve(listener, app).await?;

        Ok(())
    }
}

fn session_id_from(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

fn jsonrpc_error(status: StatusCode, code: i64, message: &str) -> Response {
    (status, Json(McpResponse::error(None, code, message))).into_response()
}

fn missing_session() -> Response {
    let error = RedditMcpError::Session("No valid session ID provided".to_string());
    (
        StatusCode::BAD_REQUEST,
        Json(McpResponse::from_error(None, error)),
    )
        .into_response()
}

fn invalid_session() -> Response {
    (StatusCode::BAD_REQUEST, "Invalid or missing session ID").into_response()
}

fn with_session_header(mut response: Response, session_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(session_id) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

fn reply_response(reply: SessionReply, session_id: Option<&str>) -> Response {
    let response = match reply {
        SessionReply::Json(value) => (StatusCode::OK, Json(value)).into_response(),
        SessionReply::Accepted => StatusCode::ACCEPTED.into_response(),
        SessionReply::Rejected(error) => (StatusCode::BAD_REQUEST, Json(error)).into_response(),
    };
    match session_id {
        Some(id) => with_session_header(response, id),
        None => response,
    }
}

/// Health check endpoint
async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
    }))
}

/// `POST /mcp`: client-to-server messages
async fn post_mcp(
    State(sessions): State<SessionManager>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Rejecting unparseable MCP request body");
            return jsonrpc_error(
                StatusCode::BAD_REQUEST,
                codes::PARSE_ERROR,
                "Parse error: Invalid JSON",
            );
        }
    };

    let result = match session_id_from(&headers) {
        Some(id) => match sessions.get(id) {
            Some(session) => session
                .handle_post(body)
                .await
                .map(|reply| reply_response(reply, Some(session.id()))),
            None => {
                tracing::debug!(session_id = id, "Request for unknown session");
                return missing_session();
            }
        },
        None if contains_initialize_request(&body) => {
            sessions.initialize(body).await.map(|(session, reply)| {
                reply_response(reply, session.as_ref().map(|s| s.id()))
            })
        }
        None => return missing_session(),
    };

    match result {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Error handling MCP request");
            jsonrpc_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL_ERROR,
                "Internal server error",
            )
        }
    }
}

/// `GET /mcp`: server-to-client notification stream (SSE)
async fn get_mcp(State(sessions): State<SessionManager>, headers: HeaderMap) -> Response {
    let Some(session) = session_id_from(&headers).and_then(|id| sessions.get(id)) else {
        return invalid_session();
    };

    let Some(stream) = session.open_stream() else {
        return (
            StatusCode::CONFLICT,
            "Conflict: Only one SSE stream is allowed per session",
        )
            .into_response();
    };

    tracing::debug!(session_id = %session.id(), "Notification stream opened");

    let events = stream.map(|notification| {
        let event = Event::default()
            .event("message")
            .json_data(&notification)
            .unwrap_or_else(|e| Event::default().comment(format!("unserializable: {}", e)));
        Ok::<_, Infallible>(event)
    });

    let response = Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response();
    with_session_header(response, session.id())
}

/// `DELETE /mcp`: explicit session termination
async fn delete_mcp(State(sessions): State<SessionManager>, headers: HeaderMap) -> Response {
    let Some(id) = session_id_from(&headers).filter(|id| sessions.get(id).is_some()) else {
        return invalid_session();
    };

    sessions.terminate(id);
    tracing::info!(session_id = id, "Session terminated by client");
    StatusCode::OK.into_response()
}
