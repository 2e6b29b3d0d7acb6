// ABOUTME: Thin REST clients over the Google Analytics Admin and Data APIs
// ABOUTME: Shared request plumbing with bearer auth, user agent, and error mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Analytics API Clients
//!
//! Thin wrappers over the Google Analytics Admin (v1beta/v1alpha) and Data
//! (v1beta) REST surfaces. Each client is bound to one access token and is
//! constructed per request by the service-injection layer, which caches it
//! for the remainder of the request.

pub mod admin;
pub mod data;

pub use admin::AdminApiClient;
pub use data::DataApiClient;

use crate::errors::{AppError, AppResult};
use serde_json::Value;

/// Kind of API client, used as the per-request cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientKind {
    /// Analytics Admin API, v1beta
    Admin,
    /// Analytics Admin API, v1alpha (annotations)
    AdminAlpha,
    /// Analytics Data API, v1beta
    Data,
}

impl std::fmt::Display for ClientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::AdminAlpha => write!(f, "admin_alpha"),
            Self::Data => write!(f, "data"),
        }
    }
}

/// User agent attached to every Analytics API request
#[must_use]
pub fn user_agent() -> String {
    format!("analytics-mcp-server/{}", env!("CARGO_PKG_VERSION"))
}

/// Map a non-success Analytics API response to an `AppError`.
///
/// A 401/403 means the token was rejected upstream; that is an external auth
/// failure distinct from a transport or server error.
pub(crate) async fn error_from_response(
    service: &str,
    response: reqwest::Response,
) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
        })
        .unwrap_or(body);

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        AppError::external_auth_failed(service, format!("{status}: {detail}"))
    } else {
        AppError::external_service(service, format!("{status}: {detail}"))
    }
}

/// Issue a GET against an Analytics endpoint and decode the JSON body
pub(crate) async fn get_json(
    http: &reqwest::Client,
    service: &str,
    url: &str,
    query: &[(&str, String)],
    access_token: &str,
) -> AppResult<Value> {
    let response = http
        .get(url)
        .query(query)
        .bearer_auth(access_token)
        .header(reqwest::header::USER_AGENT, user_agent())
        .send()
        .await
        .map_err(|e| AppError::external_service(service, e.to_string()))?;

    if !response.status().is_success() {
        return Err(error_from_response(service, response).await);
    }

    response
        .json()
        .await
        .map_err(|e| AppError::serialization(format!("{service} response: {e}")))
}

/// Issue a POST with a JSON body against an Analytics endpoint
pub(crate) async fn post_json(
    http: &reqwest::Client,
    service: &str,
    url: &str,
    body: &Value,
    access_token: &str,
) -> AppResult<Value> {
    let response = http
        .post(url)
        .json(body)
        .bearer_auth(access_token)
        .header(reqwest::header::USER_AGENT, user_agent())
        .send()
        .await
        .map_err(|e| AppError::external_service(service, e.to_string()))?;

    if !response.status().is_success() {
        return Err(error_from_response(service, response).await);
    }

    response
        .json()
        .await
        .map_err(|e| AppError::serialization(format!("{service} response: {e}")))
}

/// Collect every page of a paginated list endpoint.
///
/// `items_field` names the array in each page; pagination follows
/// `nextPageToken` until the API stops returning one.
pub(crate) async fn paginate(
    http: &reqwest::Client,
    service: &str,
    url: &str,
    items_field: &str,
    access_token: &str,
) -> AppResult<Vec<Value>> {
    let mut items = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(token) = &page_token {
            query.push(("pageToken", token.clone()));
        }

        let page = get_json(http, service, url, &query, access_token).await?;

        if let Some(page_items) = page.get(items_field).and_then(Value::as_array) {
            items.extend(page_items.iter().cloned());
        }

        page_token = page
            .get("nextPageToken")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(ToOwned::to_owned);
        if page_token.is_none() {
            break;
        }
    }

    Ok(items)
}
