// ABOUTME: HTTP route handlers outside the MCP protocol surface
// ABOUTME: Health checks and the OAuth consent-screen redirect endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP routes.

pub mod health;
pub mod oauth;

pub use health::HealthRoutes;
pub use oauth::OAuthRoutes;
