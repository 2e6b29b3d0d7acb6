// ABOUTME: Persisted per-user credential store behind an async trait seam
// ABOUTME: File-backed implementation plus an in-memory variant for stateless mode and tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Persisted Credential Store
//!
//! The slower-changing, per-user credential store the resolver falls back to
//! when the session store misses. It is an external collaborator with its own
//! lifecycle: records survive process restarts (file-backed variant) and are
//! keyed by user email, not by session.

use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// A persisted credential for one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    /// Identity the credential belongs to
    pub user_email: String,
    /// Current access token
    pub access_token: String,
    /// Long-lived refresh credential, when offline access was granted
    pub refresh_token: Option<String>,
    /// Endpoint that serves refresh requests
    pub token_endpoint: String,
    /// OAuth client ID used for refresh
    pub client_id: Option<String>,
    /// OAuth client secret used for refresh
    pub client_secret: Option<String>,
    /// Granted scope set
    pub scopes: Vec<String>,
    /// Absolute expiry of the access token
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredCredential {
    /// Check whether the access token has expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expiry.is_some_and(|expiry| expiry <= Utc::now())
    }

    /// Check whether the granted scopes cover all required scopes
    #[must_use]
    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Check whether a refresh is possible when the token expires
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some() && self.client_id.is_some() && self.client_secret.is_some()
    }
}

/// Persisted per-user credential storage.
///
/// Implementations provide their own concurrency safety; the resolver treats
/// them as a black box whose operations may suspend.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the credential for a user, if one is stored
    async fn load(&self, user_email: &str) -> AppResult<Option<StoredCredential>>;

    /// Create or replace the credential for its user
    async fn store(&self, credential: &StoredCredential) -> AppResult<()>;

    /// Delete the credential for a user, returning whether one was present
    async fn delete(&self, user_email: &str) -> AppResult<bool>;
}

/// File-backed credential store: one JSON file per user under a directory.
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    /// Create a store rooted at the given directory
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Create a store at the platform default location
    /// (`<data dir>/analytics-mcp/credentials`).
    ///
    /// # Errors
    ///
    /// Returns an error if no per-user data directory can be determined.
    pub fn at_default_location() -> AppResult<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| AppError::config("could not determine a data directory"))?;
        Ok(Self::new(base.join("analytics-mcp").join("credentials")))
    }

    fn path_for(&self, user_email: &str) -> PathBuf {
        // Emails are not safe file names; keep alphanumerics and map the rest.
        let safe: String = user_email
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self, user_email: &str) -> AppResult<Option<StoredCredential>> {
        let path = self.path_for(user_email);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(
                    AppError::storage(format!("failed to read {}", path.display())).with_source(e),
                )
            }
        };

        let credential: StoredCredential = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::serialization(format!("corrupt credential file {}: {e}", path.display()))
        })?;
        Ok(Some(credential))
    }

    async fn store(&self, credential: &StoredCredential) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            AppError::storage(format!("failed to create {}", self.dir.display())).with_source(e)
        })?;

        let path = self.path_for(&credential.user_email);
        let bytes = serde_json::to_vec_pretty(credential)?;
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            AppError::storage(format!("failed to write {}", path.display())).with_source(e)
        })?;
        Ok(())
    }

    async fn delete(&self, user_email: &str) -> AppResult<bool> {
        let path = self.path_for(user_email);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(
                AppError::storage(format!("failed to delete {}", path.display())).with_source(e),
            ),
        }
    }
}

/// In-memory credential store for stateless mode and tests.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: RwLock<HashMap<String, StoredCredential>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self, user_email: &str) -> AppResult<Option<StoredCredential>> {
        Ok(self.credentials.read().await.get(user_email).cloned())
    }

    async fn store(&self, credential: &StoredCredential) -> AppResult<()> {
        self.credentials
            .write()
            .await
            .insert(credential.user_email.clone(), credential.clone());
        Ok(())
    }

    async fn delete(&self, user_email: &str) -> AppResult<bool> {
        Ok(self.credentials.write().await.remove(user_email).is_some())
    }
}
