// ABOUTME: Integration tests for the session context store
// ABOUTME: Covers TTL eviction, identity binding, and one-shot OAuth state consumption
//
// SPDX-License-Identifier: MIT OR Apache-2.0
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use analytics_mcp_server::session::{generate_state_token, SessionStore};
use chrono::{Duration, Utc};
use common::create_test_session_record;
use std::sync::Arc;

#[tokio::test]
async fn test_store_and_validated_lookup_roundtrip() {
    let store = SessionStore::new();
    let record = create_test_session_record("s1", "user@example.com");

    store.store_session(record.clone()).await.unwrap();

    let found = store
        .get_credentials_with_validation(Some("user@example.com"), "s1")
        .await
        .expect("record should be retrievable within its TTL");
    assert_eq!(found.access_token, record.access_token);
    assert_eq!(found.user_email, "user@example.com");
    assert_eq!(found.scopes, record.scopes);
}

#[tokio::test]
async fn test_store_session_is_idempotent_overwrite() {
    let store = SessionStore::new();
    store
        .store_session(create_test_session_record("s1", "user@example.com"))
        .await
        .unwrap();

    let mut replacement = create_test_session_record("s1", "user@example.com");
    replacement.access_token = "ya29.replacement".to_owned();
    store.store_session(replacement).await.unwrap();

    assert_eq!(store.session_count().await, 1);
    let found = store
        .get_credentials_with_validation(None, "s1")
        .await
        .unwrap();
    assert_eq!(found.access_token, "ya29.replacement");
}

#[tokio::test]
async fn test_identity_mismatch_returns_nothing() {
    let store = SessionStore::new();
    store
        .store_session(create_test_session_record("s1", "owner@example.com"))
        .await
        .unwrap();

    let found = store
        .get_credentials_with_validation(Some("intruder@example.com"), "s1")
        .await;
    assert!(found.is_none());

    // The record itself survives an identity mismatch.
    assert!(store
        .get_credentials_with_validation(Some("owner@example.com"), "s1")
        .await
        .is_some());
}

#[tokio::test]
async fn test_expired_record_is_evicted_on_lookup() {
    let store = SessionStore::new();
    let mut record = create_test_session_record("s1", "user@example.com");
    record.expiry = Some(Utc::now() + Duration::milliseconds(30));
    store.store_session(record).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(80)).await;

    assert!(store
        .get_credentials_with_validation(Some("user@example.com"), "s1")
        .await
        .is_none());
    // Idempotent miss: the record is gone afterwards.
    assert_eq!(store.session_count().await, 0);
    assert!(store
        .get_credentials_with_validation(Some("user@example.com"), "s1")
        .await
        .is_none());
}

#[tokio::test]
async fn test_store_session_rejects_past_expiry() {
    let store = SessionStore::new();
    let mut record = create_test_session_record("s1", "user@example.com");
    record.expiry = Some(Utc::now() - Duration::seconds(1));

    assert!(store.store_session(record).await.is_err());
    assert_eq!(store.session_count().await, 0);
}

#[tokio::test]
async fn test_store_session_rejects_empty_scopes() {
    let store = SessionStore::new();
    let mut record = create_test_session_record("s1", "user@example.com");
    record.scopes.clear();

    assert!(store.store_session(record).await.is_err());
}

#[tokio::test]
async fn test_remove_session() {
    let store = SessionStore::new();
    store
        .store_session(create_test_session_record("s1", "user@example.com"))
        .await
        .unwrap();

    assert!(store.remove_session("s1").await);
    assert!(!store.remove_session("s1").await);
    assert!(store
        .get_credentials_with_validation(None, "s1")
        .await
        .is_none());
}

#[tokio::test]
async fn test_oauth_state_consumed_exactly_once() {
    let store = SessionStore::new();
    store.store_oauth_state("abc", Some("s1"), None).await;

    store
        .validate_and_consume_oauth_state("abc", Some("s1"))
        .await
        .expect("first consumption should succeed");

    let second = store.validate_and_consume_oauth_state("abc", Some("s1")).await;
    assert!(second.is_err(), "second consumption must fail");
}

#[tokio::test]
async fn test_oauth_state_cross_session_binding_rejected() {
    let store = SessionStore::new();
    store.store_oauth_state("abc", Some("s1"), None).await;

    let result = store.validate_and_consume_oauth_state("abc", Some("s2")).await;
    assert!(result.is_err(), "state bound to s1 must not validate for s2");
}

#[tokio::test]
async fn test_oauth_state_unbound_accepts_any_session() {
    let store = SessionStore::new();
    store.store_oauth_state("abc", None, None).await;

    store
        .validate_and_consume_oauth_state("abc", Some("s1"))
        .await
        .expect("unbound state should validate for any session");
}

#[tokio::test]
async fn test_unknown_oauth_state_rejected() {
    let store = SessionStore::new();
    let result = store.validate_and_consume_oauth_state("nope", None).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_expired_oauth_state_rejected() {
    let store = SessionStore::new();
    store.store_oauth_state("abc", None, Some(0)).await;

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let result = store.validate_and_consume_oauth_state("abc", None).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_concurrent_consume_has_single_winner() {
    let store = Arc::new(SessionStore::new());
    store.store_oauth_state("contested", Some("s1"), None).await;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .validate_and_consume_oauth_state("contested", Some("s1"))
                .await
                .is_ok()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1, "exactly one concurrent caller may consume the state");
}

#[tokio::test]
async fn test_state_insert_sweeps_expired_entries() {
    let store = SessionStore::new();
    store.store_oauth_state("old", None, Some(0)).await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    store.store_oauth_state("fresh", None, None).await;
    assert_eq!(store.oauth_state_count().await, 1);
}

#[test]
fn test_generate_state_token_is_random_hex() {
    let a = generate_state_token();
    let b = generate_state_token();
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
}
