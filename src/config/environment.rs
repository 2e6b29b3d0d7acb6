// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, auth modes, and OAuth endpoint derivation
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment-based configuration management.
//!
//! All configuration is environment-driven; the core components only depend
//! on the resolved values carried by [`ServerConfig`].

use crate::constants::scopes;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// How inbound bearer tokens are treated by the token extraction middleware
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Trust opaque forwarded tokens; validation happens at the Google API layer
    #[default]
    TrustForwarded,
    /// Verify tokens locally as Google ID tokens against the JWKS endpoint
    VerifyJwt,
}

impl AuthMode {
    /// Check whether local JWT verification is enabled
    #[must_use]
    pub const fn verifies_locally(self) -> bool {
        matches!(self, Self::VerifyJwt)
    }
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrustForwarded => write!(f, "trust-forwarded"),
            Self::VerifyJwt => write!(f, "verify-jwt"),
        }
    }
}

/// OAuth client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Google OAuth client ID
    pub client_id: Option<String>,
    /// Google OAuth client secret
    pub client_secret: Option<String>,
    /// Primary redirect URI for the consent-screen flow
    pub redirect_uri: String,
    /// Additional redirect URIs accepted for this client
    pub custom_redirect_uris: Vec<String>,
    /// Allowed CORS origins for OAuth endpoints
    pub allowed_origins: Vec<String>,
    /// Scopes requested during authorization
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    /// Check if OAuth client credentials are available
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    /// All valid redirect URIs, primary first, duplicates removed
    #[must_use]
    pub fn redirect_uris(&self) -> Vec<String> {
        let mut uris = vec![self.redirect_uri.clone()];
        for uri in &self.custom_redirect_uris {
            if !uris.contains(uri) {
                uris.push(uri.clone());
            }
        }
        uris
    }

    /// Validate that a redirect URI is one of the configured URIs
    #[must_use]
    pub fn validate_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris().iter().any(|u| u == uri)
    }
}

/// Server configuration resolved from environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host for the HTTP server
    pub host: String,
    /// Bind port for the HTTP server
    pub port: u16,
    /// Base URI used to construct the server's own URL
    pub base_uri: String,
    /// External URL for reverse-proxy deployments
    pub external_url: Option<String>,
    /// Path the MCP endpoint is served on
    pub http_path: String,
    /// Whether write operations are disabled
    pub read_only: bool,
    /// Stateless mode: no on-disk credential persistence
    pub stateless_mode: bool,
    /// Bearer token handling mode
    pub auth_mode: AuthMode,
    /// Directory for the persisted per-user credential store
    pub credentials_dir: Option<PathBuf>,
    /// OAuth client configuration
    pub oauth: OAuthConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be parsed or if stateless mode is
    /// requested without OAuth 2.1 token verification enabled.
    pub fn from_env() -> Result<Self> {
        let host = env::var("ANALYTICS_MCP_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let base_uri =
            env::var("ANALYTICS_MCP_BASE_URI").unwrap_or_else(|_| "http://localhost".to_owned());
        let port = Self::port_from_env()?;
        let external_url = env::var("ANALYTICS_EXTERNAL_URL").ok().filter(|v| !v.is_empty());
        let http_path = env::var("ANALYTICS_MCP_HTTP_PATH").unwrap_or_else(|_| "/mcp".to_owned());
        let read_only = env_flag("ANALYTICS_READ_ONLY");
        let stateless_mode = env_flag("ANALYTICS_MCP_STATELESS_MODE");
        let auth_mode = if env_flag("MCP_ENABLE_OAUTH21") {
            AuthMode::VerifyJwt
        } else {
            AuthMode::TrustForwarded
        };

        if stateless_mode && !auth_mode.verifies_locally() {
            bail!("ANALYTICS_MCP_STATELESS_MODE requires MCP_ENABLE_OAUTH21=true");
        }

        let credentials_dir = env::var("ANALYTICS_MCP_CREDENTIALS_DIR")
            .ok()
            .map(PathBuf::from);

        let mut config = Self {
            host,
            port,
            base_uri,
            external_url,
            http_path,
            read_only,
            stateless_mode,
            auth_mode,
            credentials_dir,
            oauth: OAuthConfig {
                client_id: env::var("GOOGLE_OAUTH_CLIENT_ID").ok().filter(|v| !v.is_empty()),
                client_secret: env::var("GOOGLE_OAUTH_CLIENT_SECRET")
                    .ok()
                    .filter(|v| !v.is_empty()),
                redirect_uri: String::new(),
                custom_redirect_uris: split_env_list("OAUTH_CUSTOM_REDIRECT_URIS"),
                allowed_origins: Vec::new(),
                scopes: scopes::default_scopes(),
            },
        };

        config.oauth.redirect_uri = env::var("GOOGLE_OAUTH_REDIRECT_URI")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| format!("{}/oauth2callback", config.oauth_base_url()));
        config.oauth.allowed_origins = config.resolve_allowed_origins();

        Ok(config)
    }

    /// Parse the port, tolerating the `tcp://ip:port` values Kubernetes
    /// injects for same-named service environment variables.
    fn port_from_env() -> Result<u16> {
        let raw = env::var("ANALYTICS_MCP_PORT").unwrap_or_else(|_| "3334".to_owned());
        let candidate = if raw.contains("://") {
            raw.rsplit(':').next().unwrap_or(&raw).to_owned()
        } else {
            raw
        };
        candidate
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("invalid ANALYTICS_MCP_PORT value {candidate:?}: {e}"))
    }

    /// The server's own URL, constructed from base URI and port
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}:{}", self.base_uri, self.port)
    }

    /// Base URL for OAuth endpoints, preferring the external reverse-proxy URL
    #[must_use]
    pub fn oauth_base_url(&self) -> String {
        self.external_url
            .clone()
            .unwrap_or_else(|| self.base_url())
    }

    /// Socket address string the server binds to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn resolve_allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![self.base_url()];
        if let Some(external) = &self.external_url {
            if !origins.contains(external) {
                origins.push(external.clone());
            }
        }
        for origin in split_env_list("OAUTH_ALLOWED_ORIGINS") {
            if !origins.contains(&origin) {
                origins.push(origin);
            }
        }
        origins
    }
}

/// Read a boolean flag from the environment ("true", case-insensitive)
fn env_flag(name: &str) -> bool {
    env::var(name).is_ok_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Read a comma-separated list from the environment
fn split_env_list(name: &str) -> Vec<String> {
    env::var(name)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}
