// ABOUTME: OAuth2 client for Google's authorization, token, and userinfo endpoints
// ABOUTME: Handles authorization URL construction, code exchange, and token refresh
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::constants::oauth::{GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GOOGLE_USERINFO_URL};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// OAuth2 client configuration for the Google consent-screen flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl OAuth2Config {
    /// Configuration against Google's endpoints
    #[must_use]
    pub fn google(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            auth_url: GOOGLE_AUTH_URL.to_owned(),
            token_url: GOOGLE_TOKEN_URL.to_owned(),
            redirect_uri,
            scopes,
        }
    }
}

/// Token material returned by the token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Token {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

impl OAuth2Token {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now())
    }

    /// Granted scopes as a list (the wire format is space-separated)
    #[must_use]
    pub fn scope_list(&self) -> Vec<String> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().map(ToOwned::to_owned).collect())
            .unwrap_or_default()
    }
}

/// Userinfo payload; only the email is needed to key credential storage
#[derive(Debug, Deserialize)]
pub struct UserInfo {
    pub email: Option<String>,
    #[serde(default)]
    pub verified_email: Option<bool>,
}

pub struct OAuth2Client {
    config: OAuth2Config,
    client: reqwest::Client,
}

impl OAuth2Client {
    #[must_use]
    pub fn new(config: OAuth2Config, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Build the authorization URL for the consent screen.
    ///
    /// Requests offline access and forces the consent prompt so a refresh
    /// token is issued; `login_hint` pre-selects the user's account.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization URL is malformed.
    pub fn authorization_url(&self, state: &str, login_hint: &str) -> AppResult<String> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AppError::config(format!("invalid auth URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state)
            .append_pair("access_type", "offline")
            .append_pair("include_granted_scopes", "true")
            .append_pair("login_hint", login_hint)
            .append_pair("prompt", "consent");

        Ok(url.to_string())
    }

    /// Exchange an authorization code for tokens
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange request fails or the response
    /// is not a valid token payload.
    pub async fn exchange_code(&self, code: &str) -> AppResult<OAuth2Token> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response: TokenResponse = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::external_service("Google token endpoint", e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::external_auth_failed("Google token endpoint", e.to_string()))?
            .json()
            .await
            .map_err(|e| AppError::serialization(format!("token response: {e}")))?;

        Ok(token_from_response(response))
    }

    /// Refresh an expired access token using the configured client
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh request fails or is rejected.
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<OAuth2Token> {
        refresh_access_token(
            &self.client,
            &self.config.token_url,
            &self.config.client_id,
            &self.config.client_secret,
            refresh_token,
        )
        .await
    }

    /// Fetch the authenticated user's profile to resolve their email
    ///
    /// # Errors
    ///
    /// Returns an error if the userinfo request fails or decodes to a payload
    /// without an email.
    pub async fn fetch_user_email(&self, access_token: &str) -> AppResult<String> {
        let info: UserInfo = self
            .client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::external_service("Google userinfo", e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::external_auth_failed("Google userinfo", e.to_string()))?
            .json()
            .await
            .map_err(|e| AppError::serialization(format!("userinfo response: {e}")))?;

        info.email
            .filter(|email| !email.is_empty())
            .ok_or_else(|| {
                AppError::external_service("Google userinfo", "response carried no email")
            })
    }

    /// The configured redirect URI
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.config.redirect_uri
    }

    /// The configured scope set
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.config.scopes
    }
}

/// Refresh an access token against an arbitrary token endpoint.
///
/// Used by the credential resolver, which refreshes with whatever endpoint
/// and client the stored credential was issued by.
///
/// # Errors
///
/// Returns an error if the refresh request fails or is rejected.
pub async fn refresh_access_token(
    client: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> AppResult<OAuth2Token> {
    let params = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];

    let response: TokenResponse = client
        .post(token_url)
        .form(&params)
        .send()
        .await
        .map_err(|e| AppError::external_service("token refresh", e.to_string()))?
        .error_for_status()
        .map_err(|e| AppError::external_auth_failed("token refresh", e.to_string()))?
        .json()
        .await
        .map_err(|e| AppError::serialization(format!("refresh response: {e}")))?;

    Ok(token_from_response(response))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: Option<u64>,
    refresh_token: Option<String>,
    scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_owned()
}

fn token_from_response(response: TokenResponse) -> OAuth2Token {
    let expires_at = response
        .expires_in
        .map(|seconds| Utc::now() + Duration::seconds(i64::try_from(seconds).unwrap_or(3600)));

    OAuth2Token {
        access_token: response.access_token,
        token_type: response.token_type,
        expires_at,
        refresh_token: response.refresh_token,
        scope: response.scope,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn test_client() -> OAuth2Client {
        OAuth2Client::new(
            OAuth2Config::google(
                "client-123".to_owned(),
                "secret".to_owned(),
                "http://localhost:3334/oauth2callback".to_owned(),
                vec!["https://www.googleapis.com/auth/analytics.readonly".to_owned()],
            ),
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_authorization_url_parameters() {
        let client = test_client();
        let url = client
            .authorization_url("state-abc", "user@example.com")
            .unwrap();

        let parsed = Url::parse(&url).unwrap();
        let pairs: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(pairs["client_id"], "client-123");
        assert_eq!(pairs["state"], "state-abc");
        assert_eq!(pairs["access_type"], "offline");
        assert_eq!(pairs["prompt"], "consent");
        assert_eq!(pairs["login_hint"], "user@example.com");
    }

    #[test]
    fn test_scope_list_splits_on_whitespace() {
        let token = OAuth2Token {
            access_token: "tok".to_owned(),
            token_type: "Bearer".to_owned(),
            expires_at: None,
            refresh_token: None,
            scope: Some("a b  c".to_owned()),
        };
        assert_eq!(token.scope_list(), vec!["a", "b", "c"]);
    }
}
