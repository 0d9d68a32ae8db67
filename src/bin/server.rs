//! Reddit MCP Server
//!
//! Run with: mcp-reddit-server

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcp_reddit::http::HttpServer;
use mcp_reddit::reddit::{RedditClient, RedditService};
use mcp_reddit::session::SessionManager;
use mcp_reddit::types::{default_user_agent, RedditConfig, ServerConfig, DEFAULT_REDDIT_BASE_URL};

#[derive(Parser, Debug)]
#[command(name = "mcp-reddit-server")]
#[command(about = "MCP server exposing read-only Reddit queries over HTTP")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Reddit JSON API base URL
    #[arg(long, env = "REDDIT_BASE_URL", default_value = DEFAULT_REDDIT_BASE_URL)]
    reddit_base_url: String,

    /// User-Agent sent to Reddit (defaults to mcp-reddit-server/<version>)
    #[arg(long, env = "REDDIT_USER_AGENT")]
    user_agent: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, env = "MCP_REDDIT_LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            reddit: RedditConfig {
                base_url: self.reddit_base_url.clone(),
                user_agent: self.user_agent.clone().unwrap_or_else(default_user_agent),
            },
        }
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .with(filter)
            .init();
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let client = RedditClient::new(&config.reddit);
    tracing::info!(
        base_url = client.base_url(),
        user_agent = %config.reddit.user_agent,
        "Using Reddit API"
    );

    let sessions = SessionManager::for_reddit(RedditService::new(Arc::new(client)));
    let server = HttpServer::new(sessions.clone(), &config)?;
    let listener = server
        .bind()
        .await
        .with_context(|| format!("failed to bind {}", server.addr()))?;

    tokio::select! {
        result = server.serve(listener) => {
            result.context("server error")?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutting down server...");
            sessions.shutdown();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.log_json);

    if let Err(e) = run(args.server_config()).await {
        tracing::error!("Failed to start server: {:#}", e);
        std::process::exit(1);
    }
}
