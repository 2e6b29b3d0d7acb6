// ABOUTME: Credential resolution pipeline combining session, persisted, and refreshed sources
// ABOUTME: Exposes the persisted credential store seam and the priority-order resolver
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential storage and resolution.

pub mod resolver;
pub mod store;

pub use resolver::{AuthorizationRequest, CredentialError, CredentialResolver, ResolvedCredential};
pub use store::{CredentialStore, FileCredentialStore, InMemoryCredentialStore, StoredCredential};
