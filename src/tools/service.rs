// ABOUTME: Service-injection layer constructing authenticated API clients for tool bodies
// ABOUTME: Explicit higher-order functions with per-request client caching and auth propagation
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Service Injection
//!
//! Each tool body receives an authenticated API client through one of the
//! `with_*_client` wrappers below. The wrapper validates the identity
//! parameter (a validation error, not an auth error, when missing), obtains
//! an access token — the request's forwarded bearer token when present,
//! otherwise the credential resolver — constructs the client, and caches it
//! for the remaining lifetime of the current request so repeated tool calls
//! within one request do not reconstruct it.
//!
//! An authentication-required condition propagates upward as a
//! distinguishable error carrying the authorization URL, letting the calling
//! gateway restart the OAuth flow. All other errors propagate unchanged after
//! being logged.

use crate::analytics::{AdminApiClient, DataApiClient};
use crate::context::{RequestAuthContext, ServerResources};
use crate::credentials::CredentialError;
use crate::errors::AppError;
use crate::utils::mask_sensitive;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

/// Failure surfaced by a tool invocation
#[derive(Debug, Error)]
pub enum ToolError {
    /// The caller's arguments were invalid (missing identity, bad property id)
    #[error("{0}")]
    InvalidParams(String),
    /// No credential could be resolved; the gateway must restart the OAuth flow
    #[error("{message}")]
    AuthenticationRequired {
        /// Human-readable message including the authorization URL
        message: String,
        /// Authorization URL for restarting the flow
        auth_url: Option<String>,
    },
    /// The tool body or downstream API failed
    #[error(transparent)]
    Execution(#[from] AppError),
}

impl From<CredentialError> for ToolError {
    fn from(error: CredentialError) -> Self {
        match error {
            CredentialError::AuthenticationRequired { message, auth_url } => {
                Self::AuthenticationRequired { message, auth_url }
            }
            CredentialError::Internal(e) => Self::Execution(e),
        }
    }
}

/// Validate the required identity parameter
fn require_user_email(tool_name: &str, user_email: &str) -> Result<(), ToolError> {
    if user_email.trim().is_empty() {
        return Err(ToolError::InvalidParams(format!(
            "[{tool_name}] 'user_email' parameter is required but was not provided."
        )));
    }
    Ok(())
}

/// Obtain an access token for the user: the forwarded bearer token takes
/// precedence, then the resolver's priority chain.
async fn access_token(
    resources: &Arc<ServerResources>,
    ctx: &RequestAuthContext,
    user_email: &str,
    tool_name: &str,
) -> Result<String, ToolError> {
    if let Some(token) = ctx.bearer_token() {
        debug!(
            "[{}] using forwarded token {} for user {}",
            tool_name,
            mask_sensitive(token, 8),
            user_email
        );
        return Ok(token.to_owned());
    }

    let session_id = ctx.effective_session_id();
    match resources
        .credential_resolver
        .resolve(user_email, session_id.as_deref())
        .await
    {
        Ok(credential) => Ok(credential.access_token),
        Err(e) => {
            // Re-raise auth-required errors so the gateway can trigger OAuth.
            error!("[{}] credential resolution failed for user {}: {}", tool_name, user_email, e);
            Err(e.into())
        }
    }
}

/// Run a tool body with an authenticated Analytics Admin API (v1beta) client
///
/// # Errors
///
/// Returns `InvalidParams` when the identity is missing,
/// `AuthenticationRequired` when no credential can be resolved, and
/// `Execution` for everything the tool body raises.
pub async fn with_admin_client<F, Fut, T>(
    resources: &Arc<ServerResources>,
    ctx: &RequestAuthContext,
    user_email: &str,
    tool_name: &str,
    f: F,
) -> Result<T, ToolError>
where
    F: FnOnce(Arc<AdminApiClient>) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    require_user_email(tool_name, user_email)?;

    let cached = ctx.clients.lock().await.admin.clone();
    let client = match cached {
        Some(client) => client,
        None => {
            debug!("[{}] creating admin API client for user: {}", tool_name, user_email);
            let token = access_token(resources, ctx, user_email, tool_name).await?;
            let client = Arc::new(AdminApiClient::new(resources.http_client.clone(), token));
            let mut cache = ctx.clients.lock().await;
            cache.admin.get_or_insert(client).clone()
        }
    };

    run_tool(tool_name, f(client)).await
}

/// Run a tool body with an authenticated Analytics Admin API (v1alpha) client
///
/// # Errors
///
/// Same contract as [`with_admin_client`].
pub async fn with_admin_alpha_client<F, Fut, T>(
    resources: &Arc<ServerResources>,
    ctx: &RequestAuthContext,
    user_email: &str,
    tool_name: &str,
    f: F,
) -> Result<T, ToolError>
where
    F: FnOnce(Arc<AdminApiClient>) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    require_user_email(tool_name, user_email)?;

    let cached = ctx.clients.lock().await.admin_alpha.clone();
    let client = match cached {
        Some(client) => client,
        None => {
            debug!(
                "[{}] creating admin alpha API client for user: {}",
                tool_name, user_email
            );
            let token = access_token(resources, ctx, user_email, tool_name).await?;
            let client = Arc::new(AdminApiClient::new_alpha(
                resources.http_client.clone(),
                token,
            ));
            let mut cache = ctx.clients.lock().await;
            cache.admin_alpha.get_or_insert(client).clone()
        }
    };

    run_tool(tool_name, f(client)).await
}

/// Run a tool body with an authenticated Analytics Data API client
///
/// # Errors
///
/// Same contract as [`with_admin_client`].
pub async fn with_data_client<F, Fut, T>(
    resources: &Arc<ServerResources>,
    ctx: &RequestAuthContext,
    user_email: &str,
    tool_name: &str,
    f: F,
) -> Result<T, ToolError>
where
    F: FnOnce(Arc<DataApiClient>) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    require_user_email(tool_name, user_email)?;

    let cached = ctx.clients.lock().await.data.clone();
    let client = match cached {
        Some(client) => client,
        None => {
            debug!("[{}] creating data API client for user: {}", tool_name, user_email);
            let token = access_token(resources, ctx, user_email, tool_name).await?;
            let client = Arc::new(DataApiClient::new(resources.http_client.clone(), token));
            let mut cache = ctx.clients.lock().await;
            cache.data.get_or_insert(client).clone()
        }
    };

    run_tool(tool_name, f(client)).await
}

async fn run_tool<T>(
    tool_name: &str,
    fut: impl Future<Output = Result<T, AppError>>,
) -> Result<T, ToolError> {
    match fut.await {
        Ok(value) => Ok(value),
        Err(e) => {
            error!("[{}] error executing tool: {}", tool_name, e);
            Err(ToolError::Execution(e))
        }
    }
}
