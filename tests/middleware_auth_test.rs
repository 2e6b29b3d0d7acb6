// ABOUTME: Integration tests for the token extraction middleware
// ABOUTME: Drives a probe router to observe extracted request-scoped auth state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use analytics_mcp_server::context::RequestAuthContext;
use analytics_mcp_server::middleware::user_token_middleware;
use axum::{
    body::{to_bytes, Body},
    extract::Extension,
    http::{Request, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

/// Router that echoes whatever the middleware stashed in request extensions,
/// plus the body as seen by the downstream handler.
fn probe_router() -> Router {
    async fn probe(
        Extension(ctx): Extension<RequestAuthContext>,
        body: String,
    ) -> Json<Value> {
        Json(json!({
            "token": ctx.bearer_token(),
            "property_id": ctx.property_id(),
            "transport_session_id": ctx.transport_session_id(),
            "body": body,
        }))
    }

    let resources = common::create_test_resources();
    Router::new()
        .route("/mcp", post(probe).get(probe))
        .route("/health", get(probe))
        .layer(middleware::from_fn_with_state(
            resources,
            user_token_middleware,
        ))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn mcp_post(auth: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn tool_call_body() -> Value {
    json!({"jsonrpc": "2.0", "method": "tools/call", "id": 1, "params": {"name": "get_account_summaries"}})
}

#[tokio::test]
async fn test_health_never_requires_auth() {
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(probe_router(), request).await;
    assert_eq!(status, StatusCode::OK, "GET /health must pass without auth");

    // Other verbs on the health path are also never 401; the router decides.
    let request = Request::builder()
        .method("POST")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(probe_router(), request).await;
    assert_ne!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_exempt_protocol_methods_pass_without_auth() {
    for method in ["ping", "tools/list", "prompts/list", "resources/list"] {
        let body = json!({"jsonrpc": "2.0", "method": method, "id": 1});
        let (status, payload) = send(probe_router(), mcp_post(None, &body)).await;
        assert_eq!(status, StatusCode::OK, "method {method} must be auth-exempt");
        // The peeked body must still be readable downstream, unaltered.
        assert_eq!(payload["body"], body.to_string());
    }
}

#[tokio::test]
async fn test_non_exempt_method_requires_auth() {
    let (status, payload) = send(probe_router(), mcp_post(None, &tool_call_body())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["error"], "Unauthorized: Missing Authorization header");
    assert_eq!(payload["code"], 401);
}

#[tokio::test]
async fn test_initialize_is_not_exempt() {
    let body = json!({"jsonrpc": "2.0", "method": "initialize", "id": 1});
    let (status, _) = send(probe_router(), mcp_post(None, &body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_authorization_header() {
    let (status, payload) = send(probe_router(), mcp_post(Some(""), &tool_call_body())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["error"], "Unauthorized: Empty Authorization header");
}

#[tokio::test]
async fn test_unsupported_scheme() {
    let (status, payload) = send(
        probe_router(),
        mcp_post(Some("Basic dXNlcjpwYXNz"), &tool_call_body()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["error"], "Unauthorized: Only Bearer tokens supported");
}

#[tokio::test]
async fn test_empty_bearer_token() {
    let (status, payload) = send(probe_router(), mcp_post(Some("Bearer "), &tool_call_body())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["error"], "Unauthorized: Empty Bearer token");
}

#[tokio::test]
async fn test_token_extracted_verbatim_after_trim() {
    let (status, payload) = send(
        probe_router(),
        mcp_post(Some("Bearer ya29.secret-token"), &tool_call_body()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["token"], "ya29.secret-token");

    // Surrounding whitespace is trimmed, nothing else is altered.
    let (_, payload) = send(
        probe_router(),
        mcp_post(Some("Bearer   spaced.token  "), &tool_call_body()),
    )
    .await;
    assert_eq!(payload["token"], "spaced.token");
}

#[tokio::test]
async fn test_non_google_token_format_still_accepted() {
    let (status, payload) = send(
        probe_router(),
        mcp_post(Some("Bearer test-token-123"), &tool_call_body()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["token"], "test-token-123");
}

#[tokio::test]
async fn test_property_id_header_is_captured() {
    let mut request = mcp_post(Some("Bearer tok"), &tool_call_body());
    request
        .headers_mut()
        .insert("x-analytics-property-id", " 213025502 ".parse().unwrap());
    let (_, payload) = send(probe_router(), request).await;
    assert_eq!(payload["property_id"], "213025502");
}

#[tokio::test]
async fn test_blank_property_id_header_is_ignored() {
    let mut request = mcp_post(Some("Bearer tok"), &tool_call_body());
    request
        .headers_mut()
        .insert("x-analytics-property-id", "   ".parse().unwrap());
    let (_, payload) = send(probe_router(), request).await;
    assert_eq!(payload["property_id"], Value::Null);
}

#[tokio::test]
async fn test_transport_session_id_is_captured() {
    let mut request = mcp_post(Some("Bearer tok"), &tool_call_body());
    request
        .headers_mut()
        .insert("mcp-session-id", "sess-42".parse().unwrap());
    let (_, payload) = send(probe_router(), request).await;
    assert_eq!(payload["transport_session_id"], "sess-42");
}

#[tokio::test]
async fn test_get_is_opportunistic_never_401() {
    // Without a token: the streaming handshake may precede authentication.
    let request = Request::builder()
        .method("GET")
        .uri("/mcp")
        .body(Body::empty())
        .unwrap();
    let (status, payload) = send(probe_router(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["token"], Value::Null);

    // With a token: it is extracted.
    let request = Request::builder()
        .method("GET")
        .uri("/mcp")
        .header("authorization", "Bearer stream-token")
        .body(Body::empty())
        .unwrap();
    let (status, payload) = send(probe_router(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["token"], "stream-token");
}

#[tokio::test]
async fn test_unsupported_verb_passes_through_unauthenticated() {
    let request = Request::builder()
        .method("DELETE")
        .uri("/mcp")
        .body(Body::empty())
        .unwrap();
    let response = probe_router().oneshot(request).await.unwrap();
    // The router, not the middleware, rejects the verb.
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_non_json_body_requires_auth() {
    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .body(Body::from("not json at all"))
        .unwrap();
    let (status, payload) = send(probe_router(), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["error"], "Unauthorized: Missing Authorization header");
}
