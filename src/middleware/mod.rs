// ABOUTME: HTTP middleware for the MCP server
// ABOUTME: Exposes the per-request token extraction layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP middleware.

pub mod auth;

pub use auth::user_token_middleware;
