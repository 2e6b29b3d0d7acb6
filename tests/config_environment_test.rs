// ABOUTME: Integration tests for environment-driven configuration loading
// ABOUTME: Serialized because they mutate process environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
#![allow(clippy::unwrap_used, clippy::expect_used)]

use analytics_mcp_server::config::{AuthMode, ServerConfig};
use serial_test::serial;

const CONFIG_VARS: [&str; 12] = [
    "ANALYTICS_MCP_HOST",
    "ANALYTICS_MCP_PORT",
    "ANALYTICS_MCP_BASE_URI",
    "ANALYTICS_MCP_HTTP_PATH",
    "ANALYTICS_EXTERNAL_URL",
    "ANALYTICS_READ_ONLY",
    "ANALYTICS_MCP_STATELESS_MODE",
    "MCP_ENABLE_OAUTH21",
    "GOOGLE_OAUTH_CLIENT_ID",
    "GOOGLE_OAUTH_CLIENT_SECRET",
    "GOOGLE_OAUTH_REDIRECT_URI",
    "OAUTH_CUSTOM_REDIRECT_URIS",
];

fn clear_config_env() {
    for var in CONFIG_VARS {
        std::env::remove_var(var);
    }
    std::env::remove_var("OAUTH_ALLOWED_ORIGINS");
    std::env::remove_var("ANALYTICS_MCP_CREDENTIALS_DIR");
}

#[test]
#[serial]
fn test_defaults() {
    clear_config_env();
    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.port, 3334);
    assert_eq!(config.http_path, "/mcp");
    assert_eq!(config.base_url(), "http://localhost:3334");
    assert_eq!(config.auth_mode, AuthMode::TrustForwarded);
    assert!(!config.stateless_mode);
    assert!(!config.read_only);
    assert_eq!(
        config.oauth.redirect_uri,
        "http://localhost:3334/oauth2callback"
    );
    assert!(!config.oauth.is_configured());
}

#[test]
#[serial]
fn test_kubernetes_style_port_value() {
    clear_config_env();
    std::env::set_var("ANALYTICS_MCP_PORT", "tcp://10.0.0.5:8080");
    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.port, 8080);
    clear_config_env();
}

#[test]
#[serial]
fn test_invalid_port_is_an_error() {
    clear_config_env();
    std::env::set_var("ANALYTICS_MCP_PORT", "not-a-port");
    assert!(ServerConfig::from_env().is_err());
    clear_config_env();
}

#[test]
#[serial]
fn test_stateless_requires_oauth21() {
    clear_config_env();
    std::env::set_var("ANALYTICS_MCP_STATELESS_MODE", "true");
    assert!(ServerConfig::from_env().is_err());

    std::env::set_var("MCP_ENABLE_OAUTH21", "true");
    let config = ServerConfig::from_env().unwrap();
    assert!(config.stateless_mode);
    assert_eq!(config.auth_mode, AuthMode::VerifyJwt);
    clear_config_env();
}

#[test]
#[serial]
fn test_external_url_drives_oauth_base() {
    clear_config_env();
    std::env::set_var("ANALYTICS_EXTERNAL_URL", "https://gateway.example.com");
    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.oauth_base_url(), "https://gateway.example.com");
    assert_eq!(
        config.oauth.redirect_uri,
        "https://gateway.example.com/oauth2callback"
    );
    assert!(config
        .oauth
        .allowed_origins
        .contains(&"https://gateway.example.com".to_owned()));
    clear_config_env();
}

#[test]
#[serial]
fn test_explicit_redirect_uri_wins() {
    clear_config_env();
    std::env::set_var(
        "GOOGLE_OAUTH_REDIRECT_URI",
        "https://custom.example.com/cb",
    );
    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.oauth.redirect_uri, "https://custom.example.com/cb");
    clear_config_env();
}

#[test]
#[serial]
fn test_custom_redirect_uris_deduplicated() {
    clear_config_env();
    std::env::set_var(
        "OAUTH_CUSTOM_REDIRECT_URIS",
        "https://a.example.com/cb, https://b.example.com/cb",
    );
    let config = ServerConfig::from_env().unwrap();

    let uris = config.oauth.redirect_uris();
    assert_eq!(uris[0], "http://localhost:3334/oauth2callback");
    assert!(uris.contains(&"https://a.example.com/cb".to_owned()));
    assert!(uris.contains(&"https://b.example.com/cb".to_owned()));
    assert!(config.oauth.validate_redirect_uri("https://a.example.com/cb"));
    assert!(!config.oauth.validate_redirect_uri("https://evil.example.com/cb"));
    clear_config_env();
}

#[test]
#[serial]
fn test_oauth_client_configuration() {
    clear_config_env();
    std::env::set_var("GOOGLE_OAUTH_CLIENT_ID", "client-id");
    std::env::set_var("GOOGLE_OAUTH_CLIENT_SECRET", "client-secret");
    let config = ServerConfig::from_env().unwrap();
    assert!(config.oauth.is_configured());
    assert!(!config.oauth.scopes.is_empty());
    clear_config_env();
}
