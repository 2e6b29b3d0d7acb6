// ABOUTME: In-memory session store binding OAuth credentials to session identifiers
// ABOUTME: Also tracks one-time OAuth CSRF states with TTL-based expiry
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Session Context Store
//!
//! Process-wide, in-memory store mapping session identifiers to authenticated
//! session records and one-time OAuth CSRF states to their pending session
//! bindings. Safe for concurrent access from many in-flight requests.
//!
//! Expired entries are evicted lazily on lookup; inserts additionally sweep
//! expired entries while already holding the write lock, which bounds memory
//! growth under churn without a background task.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// CSRF state token length in bytes (32 bytes = 256 bits)
const STATE_TOKEN_LENGTH: usize = 32;

/// One authenticated user's bound credentials for a logical session
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Unique key within the store
    pub session_id: String,
    /// Identity the credentials are bound to
    pub user_email: String,
    /// Current access token
    pub access_token: String,
    /// Long-lived refresh credential, when offline access was granted
    pub refresh_token: Option<String>,
    /// Endpoint that issued the token and serves refresh requests
    pub token_endpoint: String,
    /// OAuth client ID, required for refresh
    pub client_id: Option<String>,
    /// OAuth client secret, required for refresh
    pub client_secret: Option<String>,
    /// Granted scope set; a usable record has at least one scope
    pub scopes: Vec<String>,
    /// Absolute expiry of the access token
    pub expiry: Option<DateTime<Utc>>,
    /// Token issuer
    pub issuer: String,
    /// When this record was created
    pub created_at: DateTime<Utc>,
    /// Transport-level session identifier, when known
    pub transport_session_id: Option<String>,
}

impl SessionRecord {
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
}

/// One in-flight, not-yet-completed authorization-code exchange
#[derive(Debug, Clone)]
struct PendingOAuthState {
    session_id: Option<String>,
    expires_at: DateTime<Utc>,
}

/// Process-wide keyed store for session records and pending OAuth states.
///
/// Owned by [`crate::context::ServerResources`] and passed explicitly to every
/// component that needs it; there is no global instance.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    oauth_states: RwLock<HashMap<String, PendingOAuthState>>,
}

impl SessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite the session record at its session identifier.
    ///
    /// Idempotent under the same key. Refresh replaces the whole record,
    /// never a partial update.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the record carries an expiry that is not
    /// strictly in the future, or an empty scope set.
    pub async fn store_session(&self, record: SessionRecord) -> AppResult<()> {
        if let Some(expiry) = record.expiry {
            if expiry <= Utc::now() {
                return Err(AppError::invalid_input(
                    "session record expiry must be in the future",
                ));
            }
        }
        if record.scopes.is_empty() {
            return Err(AppError::invalid_input(
                "session record must carry at least one scope",
            ));
        }

        let mut sessions = self.sessions.write().await;
        sessions.insert(record.session_id.clone(), record);
        Self::evict_expired_sessions(&mut sessions);
        drop(sessions);
        Ok(())
    }

    /// Return the session record only if it exists, is not expired, and its
    /// bound identity matches the requested identity (when supplied).
    ///
    /// An access to an expired entry deletes it and behaves as a miss, so a
    /// subsequent lookup is an idempotent miss.
    pub async fn get_credentials_with_validation(
        &self,
        requested_email: Option<&str>,
        session_id: &str,
    ) -> Option<SessionRecord> {
        let mut sessions = self.sessions.write().await;
        let record = sessions.get(session_id)?;

        if record.is_expired() {
            tracing::debug!(session_id = %session_id, "evicting expired session record on lookup");
            sessions.remove(session_id);
            return None;
        }

        if let Some(email) = requested_email {
            if record.user_email != email {
                tracing::warn!(
                    session_id = %session_id,
                    "session identity mismatch; refusing credentials"
                );
                return None;
            }
        }

        Some(record.clone())
    }

    /// Remove a session record, returning whether one was present
    pub async fn remove_session(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Store a pending OAuth CSRF state with an absolute expiry computed
    /// from the TTL (default 600 seconds).
    pub async fn store_oauth_state(
        &self,
        state: &str,
        session_id: Option<&str>,
        expires_in_seconds: Option<i64>,
    ) {
        let ttl = expires_in_seconds.unwrap_or(crate::constants::oauth::DEFAULT_STATE_TTL_SECS);
        let pending = PendingOAuthState {
            session_id: session_id.map(ToOwned::to_owned),
            expires_at: Utc::now() + Duration::seconds(ttl),
        };

        let mut states = self.oauth_states.write().await;
        states.insert(state.to_owned(), pending);
        Self::evict_expired_states(&mut states);
        drop(states);
    }

    /// Atomically look up and remove a pending OAuth state.
    ///
    /// A state token is consumed at most once: any attempt, successful or
    /// not, removes it. Guarantees at-most-once success under concurrent
    /// callers racing on the same token.
    ///
    /// # Errors
    ///
    /// Returns `OAuthStateInvalid` if the state is unknown, already consumed,
    /// expired, or bound to a different session identifier than supplied.
    pub async fn validate_and_consume_oauth_state(
        &self,
        state: &str,
        session_id: Option<&str>,
    ) -> AppResult<()> {
        let pending = {
            let mut states = self.oauth_states.write().await;
            states.remove(state)
        };

        let Some(pending) = pending else {
            return Err(AppError::invalid_oauth_state(
                "unknown or already consumed OAuth state",
            ));
        };

        if pending.expires_at <= Utc::now() {
            return Err(AppError::invalid_oauth_state("OAuth state has expired"));
        }

        // Cross-session binding check: a state created in one session must
        // not be consumable from another.
        if let (Some(bound), Some(caller)) = (pending.session_id.as_deref(), session_id) {
            if bound != caller {
                return Err(AppError::invalid_oauth_state(
                    "OAuth state was issued for a different session",
                ));
            }
        }

        Ok(())
    }

    /// Number of live session records (test introspection)
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Number of pending OAuth states (test introspection)
    pub async fn oauth_state_count(&self) -> usize {
        self.oauth_states.read().await.len()
    }

    fn evict_expired_sessions(sessions: &mut HashMap<String, SessionRecord>) {
        sessions.retain(|_, record| !record.is_expired());
    }

    fn evict_expired_states(states: &mut HashMap<String, PendingOAuthState>) {
        let now = Utc::now();
        states.retain(|_, pending| pending.expires_at > now);
    }
}

/// Generate a cryptographically random CSRF state token
#[must_use]
pub fn generate_state_token() -> String {
    let random_bytes: Vec<u8> = (0..STATE_TOKEN_LENGTH)
        .map(|_| rand::thread_rng().gen())
        .collect();
    hex::encode(random_bytes)
}
