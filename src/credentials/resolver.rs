// ABOUTME: Credential resolver deciding which credential source is authoritative per request
// ABOUTME: Falls back from session store to persisted store with refresh and write-back
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Credential Resolver
//!
//! Given a user identity and an optional session identifier, produces a
//! currently valid access credential or fails with an authentication-required
//! error carrying a fresh authorization URL.
//!
//! Priority order (first success wins):
//! 1. Session store lookup — fastest, session-bound, no I/O.
//! 2. Persisted per-user store — refreshed against the token endpoint when
//!    expired, with the refreshed credential written back to both stores so
//!    subsequent lookups hit the fast path.
//! 3. Nothing found — the caller must initiate a new authorization flow.
//!
//! Credentials that lack a required scope are treated as not found; the
//! resolver never silently downgrades scope.

use crate::errors::AppError;
use crate::oauth2_client::{refresh_access_token, OAuth2Client};
use crate::session::{generate_state_token, SessionRecord, SessionStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::store::{CredentialStore, StoredCredential};

/// Resolution failure surfaced to the service-injection layer
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No credential could be resolved; a new authorization flow is required
    #[error("{message}")]
    AuthenticationRequired {
        /// Human-readable message including the authorization URL
        message: String,
        /// Authorization URL for restarting the OAuth flow
        auth_url: Option<String>,
    },
    /// A store or transport failure unrelated to the credential itself
    #[error(transparent)]
    Internal(#[from] AppError),
}

/// A currently valid access credential
#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    /// Identity the credential belongs to
    pub user_email: String,
    /// Access token to present to the Analytics APIs
    pub access_token: String,
    /// Granted scope set
    pub scopes: Vec<String>,
    /// Absolute expiry of the access token
    pub expiry: Option<DateTime<Utc>>,
}

impl From<SessionRecord> for ResolvedCredential {
    fn from(record: SessionRecord) -> Self {
        Self {
            user_email: record.user_email,
            access_token: record.access_token,
            scopes: record.scopes,
            expiry: record.expiry,
        }
    }
}

impl From<StoredCredential> for ResolvedCredential {
    fn from(credential: StoredCredential) -> Self {
        Self {
            user_email: credential.user_email,
            access_token: credential.access_token,
            scopes: credential.scopes,
            expiry: credential.expiry,
        }
    }
}

/// A freshly started authorization flow
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// URL the end user must visit to grant access
    pub auth_url: String,
    /// Formatted message surfaced to the user/gateway
    pub message: String,
}

/// Resolves credentials across the session store, the persisted store, and
/// the refresh path.
pub struct CredentialResolver {
    session_store: Arc<SessionStore>,
    credential_store: Arc<dyn CredentialStore>,
    oauth: Arc<OAuth2Client>,
    http: reqwest::Client,
    required_scopes: Vec<String>,
}

impl CredentialResolver {
    /// Create a resolver over explicit store instances
    #[must_use]
    pub fn new(
        session_store: Arc<SessionStore>,
        credential_store: Arc<dyn CredentialStore>,
        oauth: Arc<OAuth2Client>,
        http: reqwest::Client,
        required_scopes: Vec<String>,
    ) -> Self {
        Self {
            session_store,
            credential_store,
            oauth,
            http,
            required_scopes,
        }
    }

    /// Resolve a currently valid credential for the user.
    ///
    /// Deterministic for a fixed store state and wall-clock time; the only
    /// side effect is the refresh-and-write-back case.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::AuthenticationRequired`] carrying a fresh
    /// authorization URL when no source yields a usable credential, or
    /// [`CredentialError::Internal`] on store failures.
    pub async fn resolve(
        &self,
        user_email: &str,
        session_id: Option<&str>,
    ) -> Result<ResolvedCredential, CredentialError> {
        // Priority 1: session store, trying the caller's session first and
        // then the keys this server uses when it stores sessions itself.
        if let Some(record) = self.session_lookup(user_email, session_id).await {
            debug!(user_email = %user_email, "resolved credentials from session store");
            return Ok(record.into());
        }

        // Priority 2: persisted per-user store, refreshing when expired.
        if let Some(credential) = self
            .credential_store
            .load(user_email)
            .await
            .map_err(CredentialError::Internal)?
        {
            if !credential.has_scopes(&self.required_scopes) {
                debug!(
                    user_email = %user_email,
                    "persisted credentials lack required scopes; treating as not found"
                );
            } else if credential.is_expired() {
                if credential.can_refresh() {
                    match self.refresh_and_write_back(credential, session_id).await {
                        Ok(refreshed) => return Ok(refreshed),
                        Err(e) => {
                            // Fail open to "need new auth", not fatal.
                            warn!(user_email = %user_email, error = %e, "credential refresh failed");
                        }
                    }
                } else {
                    debug!(user_email = %user_email, "persisted credentials expired without refresh token");
                }
            } else {
                debug!(user_email = %user_email, "resolved credentials from persisted store");
                return Ok(credential.into());
            }
        }

        // Priority 3: nothing found; start a new authorization flow.
        let authorization = self
            .begin_authorization(user_email, session_id)
            .await
            .map_err(CredentialError::Internal)?;
        Err(CredentialError::AuthenticationRequired {
            message: authorization.message,
            auth_url: Some(authorization.auth_url),
        })
    }

    /// Start an authorization flow: generate and store a CSRF state bound to
    /// the caller's session, and build the consent-screen URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the authorization URL cannot be constructed.
    pub async fn begin_authorization(
        &self,
        user_email: &str,
        session_id: Option<&str>,
    ) -> Result<AuthorizationRequest, AppError> {
        let state = generate_state_token();
        self.session_store
            .store_oauth_state(&state, session_id, None)
            .await;

        let auth_url = self.oauth.authorization_url(&state, user_email)?;
        info!(user_email = %user_email, "generated authorization URL");

        let message = format!(
            "**Google Analytics Authentication Required**\n\n\
             Please authorize access to your Google Analytics account by visiting this URL:\n\n\
             {auth_url}\n\n\
             After authorizing, your credentials will be saved and you can retry your command.\n"
        );

        Ok(AuthorizationRequest { auth_url, message })
    }

    async fn session_lookup(
        &self,
        user_email: &str,
        session_id: Option<&str>,
    ) -> Option<SessionRecord> {
        let mut candidates: Vec<String> = Vec::new();
        if let Some(id) = session_id {
            candidates.push(id.to_owned());
        }
        candidates.push(format!("google_{user_email}"));
        candidates.push(format!("refreshed_{user_email}"));

        for key in candidates {
            let record = self
                .session_store
                .get_credentials_with_validation(Some(user_email), &key)
                .await;
            if let Some(record) = record {
                if record.has_scopes(&self.required_scopes) {
                    return Some(record);
                }
                debug!(
                    session_id = %key,
                    "session credentials lack required scopes; continuing"
                );
            }
        }
        None
    }

    /// Refresh an expired persisted credential and write the result back to
    /// both stores so subsequent lookups hit the fast path.
    async fn refresh_and_write_back(
        &self,
        credential: StoredCredential,
        session_id: Option<&str>,
    ) -> Result<ResolvedCredential, AppError> {
        let (Some(client_id), Some(client_secret), Some(refresh_token)) = (
            credential.client_id.as_deref(),
            credential.client_secret.as_deref(),
            credential.refresh_token.as_deref(),
        ) else {
            return Err(AppError::auth_required(
                "credential cannot be refreshed without client configuration",
            ));
        };

        let token = refresh_access_token(
            &self.http,
            &credential.token_endpoint,
            client_id,
            client_secret,
            refresh_token,
        )
        .await?;

        info!(user_email = %credential.user_email, "refreshed expired credentials");

        // Google omits the refresh token on refresh responses; keep the old one.
        let preserved_refresh = credential.refresh_token.clone();
        let refreshed = StoredCredential {
            access_token: token.access_token,
            refresh_token: token.refresh_token.or(preserved_refresh),
            expiry: token.expires_at,
            ..credential
        };

        self.credential_store.store(&refreshed).await?;
        self.session_store
            .store_session(SessionRecord {
                session_id: format!("refreshed_{}", refreshed.user_email),
                user_email: refreshed.user_email.clone(),
                access_token: refreshed.access_token.clone(),
                refresh_token: refreshed.refresh_token.clone(),
                token_endpoint: refreshed.token_endpoint.clone(),
                client_id: refreshed.client_id.clone(),
                client_secret: refreshed.client_secret.clone(),
                scopes: refreshed.scopes.clone(),
                expiry: refreshed.expiry,
                issuer: crate::constants::oauth::GOOGLE_ISSUERS[0].to_owned(),
                created_at: Utc::now(),
                transport_session_id: session_id.map(ToOwned::to_owned),
            })
            .await?;

        Ok(refreshed.into())
    }
}
