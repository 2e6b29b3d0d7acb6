// ABOUTME: Centralized constants for protocol versions, Google endpoints, and error codes
// ABOUTME: Single source of truth for values shared across modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Centralized constants used throughout the server.

/// MCP protocol constants
pub mod protocol {
    /// `JSON-RPC` version used by MCP
    pub const JSONRPC_VERSION: &str = "2.0";

    /// MCP protocol version this server speaks
    pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

    /// Server name reported during initialize
    pub const SERVER_NAME: &str = "analytics-mcp-server";

    /// Server version from Cargo metadata
    pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// `JSON-RPC` and `MCP` error codes
pub mod errors {
    /// Parse error
    pub const ERROR_PARSE: i32 = -32700;

    /// Method not found
    pub const ERROR_METHOD_NOT_FOUND: i32 = -32601;

    /// Invalid parameters
    pub const ERROR_INVALID_PARAMS: i32 = -32602;

    /// Internal error
    pub const ERROR_INTERNAL_ERROR: i32 = -32603;

    /// Unauthorized (custom error code)
    pub const ERROR_UNAUTHORIZED: i32 = -32000;

    /// Common error messages
    pub const MSG_METHOD_NOT_FOUND: &str = "Method not found";
    pub const MSG_INVALID_PARAMS: &str = "Invalid parameters";
    pub const MSG_INTERNAL_ERROR: &str = "Internal error";
}

/// Google OAuth 2.0 endpoints and defaults
pub mod oauth {
    /// Google authorization endpoint
    pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";

    /// Google token endpoint
    pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

    /// Google userinfo endpoint (resolves the authenticated user's email)
    pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

    /// Google JWKS endpoint for ID-token signature verification
    pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

    /// Issuer values Google uses in ID tokens
    pub const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];

    /// Default lifetime of a pending OAuth CSRF state
    pub const DEFAULT_STATE_TTL_SECS: i64 = 600;
}

/// OAuth scopes for Google Analytics API access
pub mod scopes {
    /// Read-only access to Google Analytics
    pub const ANALYTICS_READONLY: &str = "https://www.googleapis.com/auth/analytics.readonly";

    /// Full access to Google Analytics (for future write operations)
    pub const ANALYTICS: &str = "https://www.googleapis.com/auth/analytics";

    /// User profile info (required to get user email for identification)
    pub const USERINFO_EMAIL: &str = "https://www.googleapis.com/auth/userinfo.email";

    /// Default scopes for all Analytics MCP operations
    #[must_use]
    pub fn default_scopes() -> Vec<String> {
        vec![ANALYTICS_READONLY.to_owned(), USERINFO_EMAIL.to_owned()]
    }
}

/// Google Analytics API base URLs
pub mod analytics {
    /// Analytics Admin API, v1beta surface
    pub const ADMIN_V1BETA_BASE: &str = "https://analyticsadmin.googleapis.com/v1beta";

    /// Analytics Admin API, v1alpha surface (annotations)
    pub const ADMIN_V1ALPHA_BASE: &str = "https://analyticsadmin.googleapis.com/v1alpha";

    /// Analytics Data API, v1beta surface
    pub const DATA_V1BETA_BASE: &str = "https://analyticsdata.googleapis.com/v1beta";
}

/// HTTP header names used by the middleware
pub mod headers {
    /// Optional default property scoping header
    pub const ANALYTICS_PROPERTY_ID: &str = "x-analytics-property-id";

    /// Transport-level session identifier set by streamable HTTP clients
    pub const MCP_SESSION_ID: &str = "mcp-session-id";
}
