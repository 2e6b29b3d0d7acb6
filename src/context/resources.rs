// ABOUTME: Centralized resource container for dependency injection across the server
// ABOUTME: Owns the session store, credential stores, resolver, and token verifier
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Server Resources
//!
//! Centralized resource container owned by the server's top-level context.
//! Holds every shared dependency — the session store is constructed exactly
//! once here and reachable only through this container, so tests can build
//! isolated instances instead of sharing hidden process-wide state.

use crate::auth::TokenVerifier;
use crate::config::{AuthMode, ServerConfig};
use crate::credentials::{
    CredentialResolver, CredentialStore, FileCredentialStore, InMemoryCredentialStore,
};
use crate::errors::{AppError, AppResult};
use crate::oauth2_client::{OAuth2Client, OAuth2Config};
use crate::session::SessionStore;
use std::sync::Arc;

/// Shared server resources, cloned cheaply via `Arc` into every handler
#[derive(Clone)]
pub struct ServerResources {
    pub config: Arc<ServerConfig>,
    pub session_store: Arc<SessionStore>,
    pub credential_store: Arc<dyn CredentialStore>,
    pub credential_resolver: Arc<CredentialResolver>,
    pub oauth_client: Arc<OAuth2Client>,
    pub token_verifier: Option<Arc<TokenVerifier>>,
    pub http_client: reqwest::Client,
}

impl ServerResources {
    /// Wire up all shared resources from the resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if OAuth client credentials are required but missing,
    /// or if the credential store directory cannot be determined.
    pub fn new(config: ServerConfig) -> AppResult<Self> {
        // Stateless mode keeps credentials in memory only; otherwise they
        // persist as JSON files, surviving restarts.
        let credential_store: Arc<dyn CredentialStore> = if config.stateless_mode {
            Arc::new(InMemoryCredentialStore::new())
        } else if let Some(dir) = &config.credentials_dir {
            Arc::new(FileCredentialStore::new(dir.clone()))
        } else {
            Arc::new(FileCredentialStore::at_default_location()?)
        };

        Self::from_parts(config, Arc::new(SessionStore::new()), credential_store)
    }

    /// Wire up resources over explicitly supplied store instances.
    ///
    /// Tests use this to run against isolated stores instead of the
    /// environment-selected ones.
    ///
    /// # Errors
    ///
    /// Returns an error if verify-jwt mode is configured without a client ID
    /// to use as the token audience.
    pub fn from_parts(
        config: ServerConfig,
        session_store: Arc<SessionStore>,
        credential_store: Arc<dyn CredentialStore>,
    ) -> AppResult<Self> {
        let config = Arc::new(config);
        let http_client = reqwest::Client::new();

        let oauth_client = Arc::new(OAuth2Client::new(
            OAuth2Config::google(
                config.oauth.client_id.clone().unwrap_or_default(),
                config.oauth.client_secret.clone().unwrap_or_default(),
                config.oauth.redirect_uri.clone(),
                config.oauth.scopes.clone(),
            ),
            http_client.clone(),
        ));

        let credential_resolver = Arc::new(CredentialResolver::new(
            session_store.clone(),
            credential_store.clone(),
            oauth_client.clone(),
            http_client.clone(),
            config.oauth.scopes.clone(),
        ));

        let token_verifier = match config.auth_mode {
            AuthMode::VerifyJwt => {
                let audience = config.oauth.client_id.clone().ok_or_else(|| {
                    AppError::config(
                        "MCP_ENABLE_OAUTH21 requires GOOGLE_OAUTH_CLIENT_ID as the token audience",
                    )
                })?;
                Some(Arc::new(TokenVerifier::new(http_client.clone(), audience)))
            }
            AuthMode::TrustForwarded => None,
        };

        Ok(Self {
            config,
            session_store,
            credential_store,
            credential_resolver,
            oauth_client,
            token_verifier,
            http_client,
        })
    }
}
