// ABOUTME: Google ID-token verification against the issuer's JWKS public keys
// ABOUTME: Used when the middleware runs in verify-jwt mode instead of trusting forwarded tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Token Verification
//!
//! Verifies bearer tokens as Google-issued RS256 ID tokens: signature against
//! the key set published at the JWKS endpoint, plus issuer, audience, and
//! expiry claims. Keys are cached by `kid` and refetched when an unknown key
//! is seen or the cache goes stale.

use crate::constants::oauth::{GOOGLE_ISSUERS, GOOGLE_JWKS_URL};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// How long fetched JWKS keys stay usable before a refetch
const JWKS_CACHE_TTL_SECS: i64 = 3600;

/// `JWT` validation error with detailed information
#[derive(Debug, Clone)]
pub enum JwtValidationError {
    /// Token has expired
    TokenExpired {
        /// When the token expired, if the claim was readable
        expired_at: Option<DateTime<Utc>>,
    },
    /// Token signature or claims are invalid
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token is malformed (not proper `JWT` format)
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
    /// The issuer's key set could not be fetched
    KeySetUnavailable {
        /// Underlying fetch failure
        reason: String,
    },
}

impl std::fmt::Display for JwtValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenExpired { expired_at } => match expired_at {
                Some(at) => write!(
                    f,
                    "JWT token expired at {}",
                    at.format("%Y-%m-%d %H:%M:%S UTC")
                ),
                None => write!(f, "JWT token has expired"),
            },
            Self::TokenInvalid { reason } => {
                write!(f, "JWT token is invalid: {reason}")
            }
            Self::TokenMalformed { details } => {
                write!(f, "JWT token is malformed: {details}")
            }
            Self::KeySetUnavailable { reason } => {
                write!(f, "issuer key set unavailable: {reason}")
            }
        }
    }
}

impl std::error::Error for JwtValidationError {}

/// Claims carried by a Google ID token that this server cares about
#[derive(Debug, Deserialize)]
pub struct GoogleIdClaims {
    /// Stable subject identifier
    pub sub: String,
    /// Verified email address, when the email scope was granted
    pub email: Option<String>,
    /// Issuer
    pub iss: String,
    /// Expiration timestamp
    pub exp: i64,
}

/// Identity resolved from a verified token
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    /// Stable subject identifier
    pub subject: String,
    /// Verified email address, when present in the claims
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: Option<String>,
    n: Option<String>,
    e: Option<String>,
    #[serde(default)]
    kty: String,
}

#[derive(Default)]
struct KeyCache {
    keys: HashMap<String, Jwk>,
    fetched_at: Option<DateTime<Utc>>,
}

impl KeyCache {
    fn is_stale(&self) -> bool {
        self.fetched_at.map_or(true, |at| {
            Utc::now().signed_duration_since(at).num_seconds() > JWKS_CACHE_TTL_SECS
        })
    }
}

/// Verifies bearer tokens as Google ID tokens
pub struct TokenVerifier {
    client: reqwest::Client,
    jwks_url: String,
    audience: String,
    cache: RwLock<KeyCache>,
}

impl TokenVerifier {
    /// Create a verifier for Google ID tokens with the given audience
    /// (the OAuth client ID the tokens are issued for).
    #[must_use]
    pub fn new(client: reqwest::Client, audience: String) -> Self {
        Self {
            client,
            jwks_url: GOOGLE_JWKS_URL.to_owned(),
            audience,
            cache: RwLock::new(KeyCache::default()),
        }
    }

    /// Verifier against a custom JWKS endpoint (tests)
    #[must_use]
    pub fn with_jwks_url(client: reqwest::Client, audience: String, jwks_url: String) -> Self {
        Self {
            client,
            jwks_url,
            audience,
            cache: RwLock::new(KeyCache::default()),
        }
    }

    /// Verify a token's signature and claims, returning the resolved identity
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] if the token is malformed, carries an
    /// unknown key ID, fails signature verification, is expired, or was issued
    /// for a different audience or issuer.
    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity, JwtValidationError> {
        let header = decode_header(token).map_err(|e| JwtValidationError::TokenMalformed {
            details: format!("failed to decode token header: {e}"),
        })?;

        let kid = header.kid.ok_or_else(|| JwtValidationError::TokenMalformed {
            details: "token header missing kid (key ID)".to_owned(),
        })?;

        let jwk = self.key_for(&kid).await?;
        let decoding_key = decoding_key_from_jwk(&jwk)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let token_data = decode::<GoogleIdClaims>(token, &decoding_key, &validation)
            .map_err(|e| convert_jwt_error(&e))?;

        tracing::debug!(
            subject = %token_data.claims.sub,
            "ID token verification successful"
        );

        Ok(VerifiedIdentity {
            subject: token_data.claims.sub,
            email: token_data.claims.email,
        })
    }

    /// Look up the key for `kid`, refetching the key set when it is unknown
    /// or the cache is stale.
    async fn key_for(&self, kid: &str) -> Result<Jwk, JwtValidationError> {
        {
            let cache = self.cache.read().await;
            if !cache.is_stale() {
                if let Some(jwk) = cache.keys.get(kid) {
                    return Ok(jwk.clone());
                }
            }
        }

        let response: JwksResponse = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| JwtValidationError::KeySetUnavailable {
                reason: e.to_string(),
            })?
            .json()
            .await
            .map_err(|e| JwtValidationError::KeySetUnavailable {
                reason: e.to_string(),
            })?;

        let mut cache = self.cache.write().await;
        cache.keys = response
            .keys
            .into_iter()
            .filter_map(|jwk| jwk.kid.clone().map(|kid| (kid, jwk)))
            .collect();
        cache.fetched_at = Some(Utc::now());

        cache
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| JwtValidationError::TokenInvalid {
                reason: format!("key not found in JWKS: {kid}"),
            })
    }
}

fn decoding_key_from_jwk(jwk: &Jwk) -> Result<DecodingKey, JwtValidationError> {
    if jwk.kty != "RSA" {
        return Err(JwtValidationError::TokenInvalid {
            reason: format!("unsupported key type: {}", jwk.kty),
        });
    }
    let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
        return Err(JwtValidationError::TokenInvalid {
            reason: "JWKS key missing RSA components".to_owned(),
        });
    };
    DecodingKey::from_rsa_components(n, e).map_err(|err| JwtValidationError::TokenInvalid {
        reason: format!("invalid RSA key components: {err}"),
    })
}

/// Convert JWT library errors to detailed validation errors
fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> JwtValidationError {
    use jsonwebtoken::errors::ErrorKind;
    tracing::warn!("JWT token validation failed: {:?}", e);

    match e.kind() {
        ErrorKind::ExpiredSignature => JwtValidationError::TokenExpired { expired_at: None },
        ErrorKind::InvalidSignature => JwtValidationError::TokenInvalid {
            reason: "token signature verification failed".to_owned(),
        },
        ErrorKind::InvalidAudience => JwtValidationError::TokenInvalid {
            reason: "token audience does not match this server".to_owned(),
        },
        ErrorKind::InvalidIssuer => JwtValidationError::TokenInvalid {
            reason: "token issuer is not Google".to_owned(),
        },
        ErrorKind::InvalidToken => JwtValidationError::TokenMalformed {
            details: "token format is invalid".to_owned(),
        },
        ErrorKind::Base64(base64_err) => JwtValidationError::TokenMalformed {
            details: format!("token contains invalid base64: {base64_err}"),
        },
        ErrorKind::Json(json_err) => JwtValidationError::TokenMalformed {
            details: format!("token contains invalid JSON: {json_err}"),
        },
        _ => JwtValidationError::TokenInvalid {
            reason: format!("token validation failed: {e}"),
        },
    }
}
