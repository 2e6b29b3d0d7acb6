// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides common config, resource, and session record helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

//! Shared test utilities for `analytics-mcp-server`.

use analytics_mcp_server::config::{AuthMode, OAuthConfig, ServerConfig};
use analytics_mcp_server::context::ServerResources;
use analytics_mcp_server::credentials::{CredentialStore, InMemoryCredentialStore};
use analytics_mcp_server::session::{SessionRecord, SessionStore};
use chrono::{Duration, Utc};
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Standard test configuration: trust-forwarded tokens, in-memory stores
pub fn create_test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_owned(),
        port: 3334,
        base_uri: "http://localhost".to_owned(),
        external_url: None,
        http_path: "/mcp".to_owned(),
        read_only: false,
        stateless_mode: true,
        auth_mode: AuthMode::TrustForwarded,
        credentials_dir: None,
        oauth: OAuthConfig {
            client_id: Some("test-client-id".to_owned()),
            client_secret: Some("test-client-secret".to_owned()),
            redirect_uri: "http://localhost:3334/oauth2callback".to_owned(),
            custom_redirect_uris: vec![],
            allowed_origins: vec!["http://localhost:3334".to_owned()],
            scopes: vec![
                "https://www.googleapis.com/auth/analytics.readonly".to_owned(),
                "https://www.googleapis.com/auth/userinfo.email".to_owned(),
            ],
        },
    }
}

/// Standard test resources with isolated in-memory stores
pub fn create_test_resources() -> Arc<ServerResources> {
    init_test_logging();
    create_test_resources_with_stores(
        Arc::new(SessionStore::new()),
        Arc::new(InMemoryCredentialStore::new()),
    )
}

/// Test resources over explicitly supplied stores
pub fn create_test_resources_with_stores(
    session_store: Arc<SessionStore>,
    credential_store: Arc<dyn CredentialStore>,
) -> Arc<ServerResources> {
    init_test_logging();
    let resources =
        ServerResources::from_parts(create_test_config(), session_store, credential_store)
            .expect("test resources should wire up");
    Arc::new(resources)
}

/// A session record expiring comfortably in the future
pub fn create_test_session_record(session_id: &str, user_email: &str) -> SessionRecord {
    SessionRecord {
        session_id: session_id.to_owned(),
        user_email: user_email.to_owned(),
        access_token: "ya29.test-access-token".to_owned(),
        refresh_token: Some("refresh-token".to_owned()),
        token_endpoint: "https://oauth2.googleapis.com/token".to_owned(),
        client_id: Some("test-client-id".to_owned()),
        client_secret: Some("test-client-secret".to_owned()),
        scopes: vec![
            "https://www.googleapis.com/auth/analytics.readonly".to_owned(),
            "https://www.googleapis.com/auth/userinfo.email".to_owned(),
        ],
        expiry: Some(Utc::now() + Duration::hours(1)),
        issuer: "https://accounts.google.com".to_owned(),
        created_at: Utc::now(),
        transport_session_id: None,
    }
}
