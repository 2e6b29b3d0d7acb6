// ABOUTME: OAuth redirect endpoint exchanging authorization codes for tokens
// ABOUTME: Validates CSRF state, stores credentials in both stores, renders result pages
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # OAuth Callback Route
//!
//! `GET /oauth2callback?state=&code=&error=` — on success exchanges the code
//! for tokens, resolves the user's email via the userinfo endpoint, and
//! stores a session record keyed by a derived session id (plus a persisted
//! credential unless the server runs stateless). On any failure a rendered
//! error page is returned; an unvalidated CSRF state is never accepted.

use crate::constants::oauth::{GOOGLE_ISSUERS, GOOGLE_TOKEN_URL};
use crate::context::ServerResources;
use crate::credentials::StoredCredential;
use crate::session::SessionRecord;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Query parameters delivered by the authorization server
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackParams {
    pub state: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
}

/// OAuth routes implementation
pub struct OAuthRoutes;

impl OAuthRoutes {
    /// Create the OAuth callback route
    #[must_use]
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/oauth2callback", get(oauth_callback_handler))
            .with_state(resources)
    }
}

/// Template renderer for OAuth success and error pages
struct OAuthTemplateRenderer;

impl OAuthTemplateRenderer {
    fn render_success(user_email: &str) -> String {
        const TEMPLATE: &str = include_str!("../../templates/oauth_success.html");
        TEMPLATE.replace("{{USER_EMAIL}}", user_email)
    }

    fn render_error(error: &str, description: Option<&str>) -> String {
        const TEMPLATE: &str = include_str!("../../templates/oauth_error.html");
        let description_html = description
            .map(|d| format!("<div class=\"description\"><strong>Details:</strong> {d}</div>"))
            .unwrap_or_default();
        TEMPLATE
            .replace("{{ERROR}}", error)
            .replace("{{DESCRIPTION}}", &description_html)
    }
}

fn error_page(error: &str, description: Option<&str>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Html(OAuthTemplateRenderer::render_error(error, description)),
    )
        .into_response()
}

async fn oauth_callback_handler(
    State(resources): State<Arc<ServerResources>>,
    Query(params): Query<OAuthCallbackParams>,
) -> Response {
    if let Some(provider_error) = params.error.as_deref() {
        warn!("OAuth callback returned an error: {}", provider_error);
        return error_page("Authorization was denied", Some(provider_error));
    }

    let Some(state) = params.state.as_deref() else {
        return error_page("Missing state parameter in OAuth callback", None);
    };
    let Some(code) = params.code.as_deref() else {
        return error_page("Missing authorization code in OAuth callback", None);
    };

    // CSRF check: the state must have been issued by this server and is
    // consumed exactly once. The browser redirect carries no MCP session,
    // so no session binding is asserted here.
    if let Err(e) = resources
        .session_store
        .validate_and_consume_oauth_state(state, None)
        .await
    {
        error!("OAuth state validation failed: {}", e);
        return error_page("OAuth state validation failed", Some(&e.to_string()));
    }

    let token = match resources.oauth_client.exchange_code(code).await {
        Ok(token) => token,
        Err(e) => {
            error!("failed to fetch OAuth token: {}", e);
            return error_page("Token exchange failed", Some(&e.to_string()));
        }
    };

    let user_email = match resources
        .oauth_client
        .fetch_user_email(&token.access_token)
        .await
    {
        Ok(email) => email,
        Err(e) => {
            error!("failed to retrieve user email: {}", e);
            return error_page("Failed to retrieve user email from Google", Some(&e.to_string()));
        }
    };

    info!("successfully exchanged OAuth code for tokens (user: {})", user_email);

    let mut scopes = token.scope_list();
    if scopes.is_empty() {
        scopes = resources.config.oauth.scopes.clone();
    }

    let credential = StoredCredential {
        user_email: user_email.clone(),
        access_token: token.access_token.clone(),
        refresh_token: token.refresh_token.clone(),
        token_endpoint: GOOGLE_TOKEN_URL.to_owned(),
        client_id: resources.config.oauth.client_id.clone(),
        client_secret: resources.config.oauth.client_secret.clone(),
        scopes: scopes.clone(),
        expiry: token.expires_at,
    };

    if !resources.config.stateless_mode {
        if let Err(e) = resources.credential_store.store(&credential).await {
            error!("failed to persist credentials for {}: {}", user_email, e);
            return error_page("Failed to store credentials", Some(&e.to_string()));
        }
    }

    let session_result = resources
        .session_store
        .store_session(SessionRecord {
            session_id: format!("google_{user_email}"),
            user_email: user_email.clone(),
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            token_endpoint: GOOGLE_TOKEN_URL.to_owned(),
            client_id: resources.config.oauth.client_id.clone(),
            client_secret: resources.config.oauth.client_secret.clone(),
            scopes,
            expiry: token.expires_at,
            issuer: GOOGLE_ISSUERS[0].to_owned(),
            created_at: Utc::now(),
            transport_session_id: None,
        })
        .await;
    if let Err(e) = session_result {
        error!("failed to bind session for {}: {}", user_email, e);
        return error_page("Failed to create session", Some(&e.to_string()));
    }

    Html(OAuthTemplateRenderer::render_success(&user_email)).into_response()
}
