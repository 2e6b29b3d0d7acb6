// ABOUTME: Axum HTTP server exposing the MCP endpoint, health check, and OAuth callback
// ABOUTME: Assembles routers, middleware layers, and the JSON-RPC dispatch loop
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # MCP HTTP Server
//!
//! Control flow per request: token extraction middleware (populates the
//! request-scoped auth context) → MCP dispatch → tool invocation → service
//! injection → tool body. Each inbound request runs as an independent task;
//! the session store is the only shared mutable resource.

use crate::constants::errors::{
    ERROR_METHOD_NOT_FOUND, ERROR_PARSE, MSG_METHOD_NOT_FOUND,
};
use crate::context::{RequestAuthContext, ServerResources};
use crate::middleware::user_token_middleware;
use crate::routes::{HealthRoutes, OAuthRoutes};
use crate::tools::handle_tools_call;
use anyhow::{Context, Result};
use axum::{
    extract::{Extension, State},
    http::{HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use super::protocol::{McpRequest, McpResponse, ProtocolHandler};

/// MCP server over streamable HTTP
#[derive(Clone)]
pub struct AnalyticsMcpServer {
    resources: Arc<ServerResources>,
}

impl AnalyticsMcpServer {
    /// Create a new server over shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Assemble the full application router.
    ///
    /// The token extraction middleware wraps every route; CORS and tracing
    /// layers sit outside it.
    #[must_use]
    pub fn router(&self) -> Router {
        let resources = self.resources.clone();

        let mcp_routes = Router::new()
            .route(
                &resources.config.http_path,
                post(handle_mcp_request).get(handle_mcp_stream),
            )
            .with_state(resources.clone());

        Router::new()
            .merge(mcp_routes)
            .merge(HealthRoutes::routes())
            .merge(OAuthRoutes::routes(resources.clone()))
            .layer(middleware::from_fn_with_state(
                resources.clone(),
                user_token_middleware,
            ))
            .layer(cors_layer(&resources))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve until shutdown
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind or the server fails.
    pub async fn run(self) -> Result<()> {
        let address = self.resources.config.bind_address();
        let app = self.router();

        info!(
            "Starting Analytics MCP server on {} (mcp path: {}, auth mode: {})",
            address, self.resources.config.http_path, self.resources.config.auth_mode
        );
        info!(
            "Read-only mode: {}",
            if self.resources.config.read_only {
                "ENABLED"
            } else {
                "DISABLED"
            }
        );

        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .with_context(|| format!("failed to bind {address}"))?;
        axum::serve(listener, app)
            .await
            .context("server terminated unexpectedly")?;
        Ok(())
    }
}

fn cors_layer(resources: &Arc<ServerResources>) -> CorsLayer {
    let origins: Vec<HeaderValue> = resources
        .config
        .oauth
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
    }
}

/// POST handler for the MCP endpoint: one JSON-RPC message per request
async fn handle_mcp_request(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<RequestAuthContext>,
    Json(payload): Json<Value>,
) -> Response {
    let request: McpRequest = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(e) => {
            let response = McpResponse::error(
                json!(0),
                ERROR_PARSE,
                format!("invalid JSON-RPC request: {e}"),
            );
            return (StatusCode::OK, Json(response)).into_response();
        }
    };

    debug!("dispatching MCP method: {}", request.method);

    // Notifications carry no response channel.
    if request.is_notification() {
        return StatusCode::ACCEPTED.into_response();
    }

    let response = match request.method.as_str() {
        "initialize" => ProtocolHandler::handle_initialize(&request),
        "ping" => ProtocolHandler::handle_ping(&request),
        "tools/list" => ProtocolHandler::handle_tools_list(&request),
        "prompts/list" => ProtocolHandler::handle_prompts_list(&request),
        "resources/list" => ProtocolHandler::handle_resources_list(&request),
        "tools/call" => handle_tools_call(&resources, &ctx, &request).await,
        _ => McpResponse::error(
            request.request_id(),
            ERROR_METHOD_NOT_FOUND,
            MSG_METHOD_NOT_FOUND.to_owned(),
        ),
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// GET handler for the MCP endpoint.
///
/// Long-lived streaming connections are not part of this server's transport;
/// clients use plain request/response POSTs.
async fn handle_mcp_stream() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": "streaming connections are not supported; POST JSON-RPC messages instead"
        })),
    )
        .into_response()
}
