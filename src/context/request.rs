// ABOUTME: Request-scoped authentication context populated by the token middleware
// ABOUTME: Carries the bearer token, resolved identity, and the per-request API client cache
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Request-Scoped Auth Context
//!
//! Ephemeral per-request record. Constructed at most once per inbound request
//! by the token extraction middleware, injected into axum request extensions,
//! and discarded when the request completes. Never shared across concurrent
//! requests; the embedded client cache only synchronizes tool calls within
//! the same request.

use crate::analytics::{AdminApiClient, DataApiClient};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-request cache of constructed API clients, keyed by client kind
#[derive(Default)]
pub struct ClientCache {
    pub(crate) admin: Option<Arc<AdminApiClient>>,
    pub(crate) admin_alpha: Option<Arc<AdminApiClient>>,
    pub(crate) data: Option<Arc<DataApiClient>>,
}

/// Request-scoped authentication context.
///
/// Cloning is cheap and shares the same underlying client cache; clones only
/// exist within the one request the context was built for.
#[derive(Clone, Default)]
pub struct RequestAuthContext {
    bearer_token: Option<String>,
    verified_email: Option<String>,
    transport_session_id: Option<String>,
    property_id: Option<String>,
    pub(crate) clients: Arc<Mutex<ClientCache>>,
}

impl RequestAuthContext {
    /// Empty context for requests that passed through unauthenticated
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the raw bearer token
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Attach the identity resolved by local token verification
    #[must_use]
    pub fn with_verified_email(mut self, email: impl Into<String>) -> Self {
        self.verified_email = Some(email.into());
        self
    }

    /// Attach the transport-level session identifier
    #[must_use]
    pub fn with_transport_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.transport_session_id = Some(session_id.into());
        self
    }

    /// Attach the default property id supplied via header
    #[must_use]
    pub fn with_property_id(mut self, property_id: impl Into<String>) -> Self {
        self.property_id = Some(property_id.into());
        self
    }

    /// The raw bearer token forwarded with this request, if any
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    /// The identity resolved by token verification, if the server runs in
    /// verify-jwt mode
    #[must_use]
    pub fn verified_email(&self) -> Option<&str> {
        self.verified_email.as_deref()
    }

    /// The transport-level session identifier, if the client sent one
    #[must_use]
    pub fn transport_session_id(&self) -> Option<&str> {
        self.transport_session_id.as_deref()
    }

    /// The default property id for this request, if the gateway scoped one
    #[must_use]
    pub fn property_id(&self) -> Option<&str> {
        self.property_id.as_deref()
    }

    /// The session identifier used for credential resolution: the explicit
    /// transport session when present, otherwise one derived from the
    /// verified identity.
    #[must_use]
    pub fn effective_session_id(&self) -> Option<String> {
        self.transport_session_id
            .clone()
            .or_else(|| self.verified_email.as_ref().map(|e| format!("google_{e}")))
    }
}
