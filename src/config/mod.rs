// ABOUTME: Configuration module exposing environment-driven server settings
// ABOUTME: Re-exports the typed configuration structures used across the server
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server configuration.

pub mod environment;

pub use environment::{AuthMode, OAuthConfig, ServerConfig};
