// ABOUTME: MCP protocol message types and core protocol operation handlers
// ABOUTME: Handles initialize, ping, and the list operations for tools, prompts, and resources
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # MCP Protocol Handlers
//!
//! JSON-RPC message types plus handlers for the core protocol operations.
//! Tool execution lives in [`crate::tools`].

use crate::constants::protocol::{
    JSONRPC_VERSION, MCP_PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::schema::get_tools;

/// Default ID for notifications and error responses that don't have a request ID
fn default_request_id() -> Value {
    Value::Number(serde_json::Number::from(0))
}

/// MCP request
#[derive(Debug, Clone, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Option<Value>,
    /// Optional ID - notifications don't have IDs, only regular requests do
    pub id: Option<Value>,
}

impl McpRequest {
    /// Whether this message is a notification (no response expected)
    #[must_use]
    pub const fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// The request ID, or the default for notifications
    #[must_use]
    pub fn request_id(&self) -> Value {
        self.id.clone().unwrap_or_else(default_request_id)
    }
}

/// MCP response
#[derive(Debug, Serialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
    pub id: Value,
}

/// MCP error
#[derive(Debug, Serialize)]
pub struct McpError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl McpResponse {
    /// Create a successful MCP response
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error MCP response
    #[must_use]
    pub fn error(id: Value, code: i32, message: String) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            result: None,
            error: Some(McpError {
                code,
                message,
                data: None,
            }),
            id,
        }
    }

    /// Create an error MCP response with data
    #[must_use]
    pub fn error_with_data(id: Value, code: i32, message: String, data: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            result: None,
            error: Some(McpError {
                code,
                message,
                data: Some(data),
            }),
            id,
        }
    }
}

/// Handlers for core MCP protocol operations
pub struct ProtocolHandler;

impl ProtocolHandler {
    /// Handle initialize request
    #[must_use]
    pub fn handle_initialize(request: &McpRequest) -> McpResponse {
        McpResponse::success(
            request.request_id(),
            json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {},
                    "prompts": {},
                    "resources": {},
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": SERVER_VERSION,
                },
            }),
        )
    }

    /// Handle ping request
    #[must_use]
    pub fn handle_ping(request: &McpRequest) -> McpResponse {
        McpResponse::success(request.request_id(), json!({}))
    }

    /// Handle tools list request
    #[must_use]
    pub fn handle_tools_list(request: &McpRequest) -> McpResponse {
        let tools = get_tools();
        McpResponse::success(request.request_id(), json!({ "tools": tools }))
    }

    /// Handle prompts list request
    #[must_use]
    pub fn handle_prompts_list(request: &McpRequest) -> McpResponse {
        McpResponse::success(request.request_id(), json!({ "prompts": [] }))
    }

    /// Handle resources list request
    #[must_use]
    pub fn handle_resources_list(request: &McpRequest) -> McpResponse {
        McpResponse::success(request.request_id(), json!({ "resources": [] }))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn request(method: &str, id: Option<Value>) -> McpRequest {
        McpRequest {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            method: method.to_owned(),
            params: None,
            id,
        }
    }

    #[test]
    fn test_initialize_reports_server_info() {
        let response = ProtocolHandler::handle_initialize(&request("initialize", Some(json!(1))));
        let result = response.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(response.id, json!(1));
    }

    #[test]
    fn test_ping_returns_empty_object() {
        let response = ProtocolHandler::handle_ping(&request("ping", Some(json!(7))));
        assert_eq!(response.result.unwrap(), json!({}));
    }

    #[test]
    fn test_tools_list_is_nonempty() {
        let response = ProtocolHandler::handle_tools_list(&request("tools/list", Some(json!(2))));
        let result = response.result.unwrap();
        assert!(!result["tools"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_notification_detection() {
        assert!(request("notifications/initialized", None).is_notification());
        assert!(!request("ping", Some(json!(3))).is_notification());
    }
}
