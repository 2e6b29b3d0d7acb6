// ABOUTME: Token extraction middleware parsing Authorization headers per request
// ABOUTME: Applies health and protocol-method exemptions and stashes request-scoped auth state
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Token Extraction Middleware
//!
//! Intercepts every inbound HTTP request before MCP dispatch. The upstream
//! gateway manages the OAuth flow and forwards tokens via
//! `Authorization: Bearer <token>`; this middleware extracts the token and
//! stores it in request extensions for tools to use. In trust-forwarded mode
//! token validation happens when calling Google APIs; in verify-jwt mode the
//! token is verified locally as a Google ID token first.
//!
//! Failure semantics: every auth failure produces a structured 401 with a
//! machine-readable reason and never escapes the HTTP boundary. Tokens are
//! never logged whole, only a masked suffix.

use crate::constants::headers::{ANALYTICS_PROPERTY_ID, MCP_SESSION_ID};
use crate::context::{RequestAuthContext, ServerResources};
use crate::errors::UnauthorizedResponse;
use crate::utils::mask_sensitive;
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// MCP protocol methods that never require authentication
/// (capability discovery and liveness).
const AUTH_EXEMPT_METHODS: [&str; 4] = ["ping", "tools/list", "prompts/list", "resources/list"];

/// Upper bound when peeking request bodies
const BODY_PEEK_LIMIT: usize = 4 * 1024 * 1024;

/// Per-request token extraction layer.
///
/// Applied with `middleware::from_fn_with_state`; see the module docs for the
/// pass/fail matrix.
pub async fn user_token_middleware(
    State(resources): State<Arc<ServerResources>>,
    mut request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let auth_header = header_value(request.headers(), "authorization");

    info!(
        "[middleware] {} {} | auth: {}",
        method,
        path,
        mask_sensitive(auth_header.as_deref().unwrap_or("NONE"), 12)
    );

    // Liveness probes pass through unauthenticated.
    if path == "/health" {
        debug!("[middleware] allowing health check without auth");
        request.extensions_mut().insert(RequestAuthContext::new());
        return next.run(request).await;
    }

    // Verbs outside the transport's set pass through; the transport framing,
    // not this middleware, rejects unsupported methods.
    if !matches!(method, Method::POST | Method::GET | Method::HEAD) {
        debug!("[middleware] skipping auth for {}", method);
        request.extensions_mut().insert(RequestAuthContext::new());
        return next.run(request).await;
    }

    let mut ctx = RequestAuthContext::new();
    if let Some(session_id) = header_value(request.headers(), MCP_SESSION_ID) {
        ctx = ctx.with_transport_session_id(session_id);
    }
    if let Some(property_id) = header_value(request.headers(), ANALYTICS_PROPERTY_ID) {
        let trimmed = property_id.trim();
        if !trimmed.is_empty() {
            debug!("[middleware] property id from header: {}", trimmed);
            ctx = ctx.with_property_id(trimmed);
        }
    }

    // Streaming GET connections authenticate opportunistically: some
    // streaming handshakes precede authentication, so an absent token is not
    // an error here.
    if method == Method::GET {
        debug!("[middleware] GET request for stream - path: {}", path);
        if let Some(token) = auth_header
            .as_deref()
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            debug!(
                "[middleware] stream carries auth token: {}",
                mask_sensitive(token, 12)
            );
            ctx = ctx.with_bearer_token(token);
        }
        request.extensions_mut().insert(ctx);
        return next.run(request).await;
    }

    // Peek the body for protocol methods that are auth-exempt, then hand the
    // bytes back so downstream handlers can still read them.
    let (parts, body) = request.into_parts();
    let body_bytes = match to_bytes(body, BODY_PEEK_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("[middleware] failed to read request body: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Failed to read request body", "code": 400})),
            )
                .into_response();
        }
    };
    request = Request::from_parts(parts, Body::from(body_bytes.clone()));

    if let Some(protocol_method) = extract_protocol_method(&body_bytes) {
        debug!("[middleware] MCP method: {}", protocol_method);
        if AUTH_EXEMPT_METHODS.contains(&protocol_method.as_str()) {
            info!(
                "[middleware] allowing MCP protocol method '{}' without auth",
                protocol_method
            );
            request.extensions_mut().insert(ctx);
            return next.run(request).await;
        }
    }

    // Everything else requires a Bearer token.
    let Some(auth_header) = auth_header else {
        warn!("missing Authorization header for {}", path);
        return unauthorized("Unauthorized: Missing Authorization header");
    };

    if auth_header.trim().is_empty() {
        return unauthorized("Unauthorized: Empty Authorization header");
    }

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        let scheme = auth_header.split(' ').next().unwrap_or_default();
        warn!("invalid Authorization type: {}", scheme);
        return unauthorized("Unauthorized: Only Bearer tokens supported");
    };

    let token = token.trim();
    if token.is_empty() {
        return unauthorized("Unauthorized: Empty Bearer token");
    }

    // Google OAuth access tokens start with "ya29."; other formats still
    // pass (test tokens, ID tokens), they just get flagged in the log.
    if !token.starts_with("ya29.") {
        debug!(
            "token does not match Google OAuth format: {}",
            mask_sensitive(token, 4)
        );
    }

    ctx = ctx.with_bearer_token(token);

    if let Some(verifier) = &resources.token_verifier {
        match verifier.verify(token).await {
            Ok(identity) => {
                if let Some(email) = identity.email {
                    debug!("verified token identity: {}", email);
                    ctx = ctx.with_verified_email(email);
                }
            }
            Err(e) => {
                warn!("token verification failed: {}", e);
                let reason = if matches!(e, crate::auth::JwtValidationError::TokenExpired { .. }) {
                    "Unauthorized: Invalid or expired token"
                } else {
                    "Unauthorized: Invalid JWT"
                };
                return unauthorized(reason);
            }
        }
    }

    debug!(
        "token extracted successfully: {}",
        mask_sensitive(ctx.bearer_token().unwrap_or_default(), 8)
    );
    request.extensions_mut().insert(ctx);
    next.run(request).await
}

/// Structured 401 with a machine-readable reason
fn unauthorized(reason: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(UnauthorizedResponse::new(reason)),
    )
        .into_response()
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}

/// Pull the JSON-RPC `method` field out of a request body, if it parses
fn extract_protocol_method(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()?
        .get("method")?
        .as_str()
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_protocol_method() {
        let body = br#"{"jsonrpc":"2.0","method":"tools/list","id":1}"#;
        assert_eq!(extract_protocol_method(body).as_deref(), Some("tools/list"));
    }

    #[test]
    fn test_extract_protocol_method_invalid_json() {
        assert_eq!(extract_protocol_method(b"not json"), None);
        assert_eq!(extract_protocol_method(b""), None);
    }

    #[test]
    fn test_exempt_method_list() {
        for method in ["ping", "tools/list", "prompts/list", "resources/list"] {
            assert!(AUTH_EXEMPT_METHODS.contains(&method));
        }
        assert!(!AUTH_EXEMPT_METHODS.contains(&"initialize"));
        assert!(!AUTH_EXEMPT_METHODS.contains(&"tools/call"));
    }
}
