// ABOUTME: Server binary entrypoint: CLI parsing, logging, config, and serve loop
// ABOUTME: Wires ServerResources and runs the Analytics MCP server
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entry point for the Google Analytics MCP server.

use analytics_mcp_server::config::ServerConfig;
use analytics_mcp_server::context::ServerResources;
use analytics_mcp_server::logging::LoggingConfig;
use analytics_mcp_server::mcp::AnalyticsMcpServer;
use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "analytics-mcp-server",
    about = "Google Analytics MCP server",
    version
)]
struct Args {
    /// Bind host, overriding ANALYTICS_MCP_HOST
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overriding ANALYTICS_MCP_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    LoggingConfig::from_env().init()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    if !config.oauth.is_configured() {
        warn!(
            "OAuth client credentials not configured; set GOOGLE_OAUTH_CLIENT_ID and \
             GOOGLE_OAUTH_CLIENT_SECRET to enable the self-managed authorization flow"
        );
    }
    info!(
        "configuration loaded (auth mode: {}, stateless: {})",
        config.auth_mode, config.stateless_mode
    );

    let resources = Arc::new(ServerResources::new(config)?);
    AnalyticsMcpServer::new(resources).run().await
}
