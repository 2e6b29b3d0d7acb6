// ABOUTME: Library root for the Google Analytics MCP server
// ABOUTME: Declares the module tree shared by the server binary and tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Analytics MCP Server
//!
//! A thin Model Context Protocol (MCP) server exposing Google Analytics
//! account administration and reporting as callable tools, authenticated via
//! Google OAuth 2.0 bearer tokens forwarded by an upstream gateway.
//!
//! The load-bearing subsystem is the request-scoped authentication and
//! credential-resolution pipeline:
//!
//! - [`middleware`] — per-request bearer token extraction with method/path
//!   exemptions and optional local JWT verification
//! - [`session`] — in-memory session store binding tokens to session
//!   identifiers with TTL-based expiry, plus one-time OAuth CSRF states
//! - [`credentials`] — priority-ordered credential resolution with refresh
//!   and write-back across the session and persisted stores
//! - [`tools`] — service injection turning a resolved credential into a
//!   cached, authenticated API client before a tool body runs
//!
//! Everything else is thin glue: [`analytics`] wraps the Google Analytics
//! Admin and Data REST APIs, [`mcp`] speaks JSON-RPC over HTTP, and
//! [`routes`] serves the health check and OAuth redirect endpoints.

/// Google Analytics Admin and Data API clients
pub mod analytics;

/// Google ID-token verification against the issuer's JWKS
pub mod auth;

/// Environment-driven configuration
pub mod config;

/// Shared constants: protocol versions, endpoints, scopes, error codes
pub mod constants;

/// Request-scoped and server-wide dependency-injection contexts
pub mod context;

/// Credential stores and the priority-order resolver
pub mod credentials;

/// Unified error handling
pub mod errors;

/// Logging configuration
pub mod logging;

/// MCP protocol types, tool catalog, and the HTTP server
pub mod mcp;

/// HTTP middleware
pub mod middleware;

/// OAuth2 client for Google's authorization and token endpoints
pub mod oauth2_client;

/// Health and OAuth callback routes
pub mod routes;

/// In-memory session context store
pub mod session;

/// Tool bodies, dispatch, and the service-injection layer
pub mod tools;

/// Small shared helpers
pub mod utils;
