// ABOUTME: Tool call routing for tools/call requests with property-id normalization
// ABOUTME: Maps tool names to bodies through the service-injection wrappers
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Tool Execution
//!
//! Routes `tools/call` requests to tool bodies. Every tool requires a
//! `user_email` argument; a missing identity is a validation error surfaced
//! before any credential work happens. Authentication-required conditions
//! surface as a distinguishable JSON-RPC error carrying the authorization
//! URL so the gateway can restart the OAuth flow.

pub mod admin;
pub mod reporting;
pub mod service;

pub use service::{with_admin_alpha_client, with_admin_client, with_data_client, ToolError};

use crate::constants::errors::{ERROR_INVALID_PARAMS, ERROR_UNAUTHORIZED};
use crate::context::{RequestAuthContext, ServerResources};
use crate::errors::AppError;
use crate::mcp::protocol::{McpRequest, McpResponse};
use crate::mcp::schema::tools;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

/// Normalize a property identifier into the `properties/<number>` resource
/// name the Analytics APIs expect.
///
/// Accepted formats are a bare number or a string of `properties/` followed
/// by a number.
///
/// # Errors
///
/// Returns `InvalidParams` for any other shape.
pub fn construct_property_rn(value: &Value) -> Result<String, ToolError> {
    if let Some(number) = value.as_u64() {
        return Ok(format!("properties/{number}"));
    }
    if let Some(text) = value.as_str() {
        let text = text.trim();
        let digits = text.strip_prefix("properties/").unwrap_or(text);
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            return Ok(format!("properties/{digits}"));
        }
    }
    Err(ToolError::InvalidParams(format!(
        "invalid property ID {value}; expected a number or 'properties/' followed by a number"
    )))
}

/// Resolve the property argument, falling back to the request's default
/// property when the gateway scoped one via header.
fn resolve_property(args: &Value, ctx: &RequestAuthContext) -> Result<String, ToolError> {
    match args.get("property_id") {
        Some(value) => construct_property_rn(value),
        None => match ctx.property_id() {
            Some(header_value) => construct_property_rn(&json!(header_value)),
            None => Err(ToolError::InvalidParams(
                "'property_id' parameter is required".to_owned(),
            )),
        },
    }
}

/// Handle a `tools/call` request
pub async fn handle_tools_call(
    resources: &Arc<ServerResources>,
    ctx: &RequestAuthContext,
    request: &McpRequest,
) -> McpResponse {
    let request_id = request.request_id();
    let params = request.params.clone().unwrap_or_else(|| json!({}));

    let Some(tool_name) = params.get("name").and_then(Value::as_str).map(ToOwned::to_owned)
    else {
        return McpResponse::error(
            request_id,
            ERROR_INVALID_PARAMS,
            "tools/call requires a 'name' parameter".to_owned(),
        );
    };
    let args = params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| json!({}));

    let user_email = args
        .get("user_email")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_owned();

    let result = execute_tool(resources, ctx, &tool_name, &user_email, &args).await;

    match result {
        Ok(value) => {
            let text = serde_json::to_string_pretty(&value)
                .unwrap_or_else(|_| value.to_string());
            McpResponse::success(
                request_id,
                json!({
                    "content": [{ "type": "text", "text": text }],
                    "isError": false,
                    "structuredContent": value,
                }),
            )
        }
        Err(ToolError::InvalidParams(message)) => {
            McpResponse::error(request_id, ERROR_INVALID_PARAMS, message)
        }
        Err(ToolError::AuthenticationRequired { message, auth_url }) => {
            McpResponse::error_with_data(
                request_id,
                ERROR_UNAUTHORIZED,
                message,
                json!({ "requiresAuth": true, "authUrl": auth_url }),
            )
        }
        Err(ToolError::Execution(e)) => {
            // Downstream failures are tool-level errors, not protocol errors.
            warn!("[{}] tool execution failed: {}", tool_name, e);
            McpResponse::success(
                request_id,
                json!({
                    "content": [{ "type": "text", "text": e.to_string() }],
                    "isError": true,
                }),
            )
        }
    }
}

async fn execute_tool(
    resources: &Arc<ServerResources>,
    ctx: &RequestAuthContext,
    tool_name: &str,
    user_email: &str,
    args: &Value,
) -> Result<Value, ToolError> {
    match tool_name {
        tools::GET_ACCOUNT_SUMMARIES => {
            with_admin_client(resources, ctx, user_email, tool_name, |client| async move {
                admin::get_account_summaries(&client).await
            })
            .await
        }
        tools::GET_PROPERTY_DETAILS => {
            let property = resolve_property(args, ctx)?;
            with_admin_client(resources, ctx, user_email, tool_name, |client| async move {
                admin::get_property_details(&client, &property).await
            })
            .await
        }
        tools::LIST_GOOGLE_ADS_LINKS => {
            let property = resolve_property(args, ctx)?;
            with_admin_client(resources, ctx, user_email, tool_name, |client| async move {
                admin::list_google_ads_links(&client, &property).await
            })
            .await
        }
        tools::LIST_PROPERTY_ANNOTATIONS => {
            let property = resolve_property(args, ctx)?;
            with_admin_alpha_client(resources, ctx, user_email, tool_name, |client| async move {
                admin::list_property_annotations(&client, &property).await
            })
            .await
        }
        tools::GET_CUSTOM_DIMENSIONS_AND_METRICS => {
            let property = resolve_property(args, ctx)?;
            with_admin_client(resources, ctx, user_email, tool_name, |client| async move {
                admin::get_custom_dimensions_and_metrics(&client, &property).await
            })
            .await
        }
        tools::RUN_REPORT => {
            let property = resolve_property(args, ctx)?;
            let body = reporting::build_report_request(args)
                .map_err(|e: AppError| ToolError::InvalidParams(e.to_string()))?;
            with_data_client(resources, ctx, user_email, tool_name, |client| async move {
                reporting::run_report(&client, &property, &body).await
            })
            .await
        }
        tools::RUN_REALTIME_REPORT => {
            let property = resolve_property(args, ctx)?;
            let body = reporting::build_realtime_request(args)
                .map_err(|e: AppError| ToolError::InvalidParams(e.to_string()))?;
            with_data_client(resources, ctx, user_email, tool_name, |client| async move {
                reporting::run_realtime_report(&client, &property, &body).await
            })
            .await
        }
        unknown => Err(ToolError::InvalidParams(format!(
            "unknown tool: {unknown}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_construct_property_rn_from_number() {
        assert_eq!(
            construct_property_rn(&json!(213025502)).unwrap(),
            "properties/213025502"
        );
    }

    #[test]
    fn test_construct_property_rn_from_strings() {
        assert_eq!(
            construct_property_rn(&json!("213025502")).unwrap(),
            "properties/213025502"
        );
        assert_eq!(
            construct_property_rn(&json!("properties/213025502")).unwrap(),
            "properties/213025502"
        );
    }

    #[test]
    fn test_construct_property_rn_rejects_garbage() {
        assert!(construct_property_rn(&json!("accounts/5")).is_err());
        assert!(construct_property_rn(&json!("properties/abc")).is_err());
        assert!(construct_property_rn(&json!(-5)).is_err());
        assert!(construct_property_rn(&json!({"id": 5})).is_err());
    }
}
