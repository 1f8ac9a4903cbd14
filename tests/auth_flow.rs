//! End-to-end flows through the [`Authenticator`] over the in-memory store.

use anyhow::Result;
use chrono::{TimeZone, Utc};
use secrecy::ExposeSecret;
use sso::auth::{
    App, AppPolicy, AuthError, Authenticator, Clock, CredentialStore, ManualClock, MemoryStore,
    Rejection, TokenError, PLACEHOLDER_SECRET,
};
use std::{sync::Arc, time::Duration};

const HOUR: Duration = Duration::from_secs(3600);

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()))
}

async fn seeded_store() -> Result<Arc<MemoryStore>> {
    let store = Arc::new(MemoryStore::new());
    store.provision_app(App::new(7, "App_7", "s7")).await?;
    store.provision_app(App::new(8, "App_8", "s8")).await?;
    Ok(store)
}

#[tokio::test]
async fn register_login_verify() -> Result<()> {
    let store = seeded_store().await?;
    let clock = clock();
    let auth = Authenticator::new(store.clone(), AppPolicy::Strict, HOUR)
        .with_clock(clock.clone() as Arc<dyn Clock>);

    assert_eq!(auth.register("a@x.io", "pw1").await?, 1);
    assert!(matches!(
        auth.register("a@x.io", "pw2").await,
        Err(AuthError::Conflict)
    ));
    assert_eq!(auth.register("b@x.io", "pw2").await?, 2);

    let token = auth.login("a@x.io", "pw1", 7).await?;
    let claims = auth.verify_token(&token, 7).await?;
    assert_eq!(claims.uid, 1);
    assert_eq!(claims.app_id, 7);
    assert_eq!(claims.exp - claims.iat, 3600);
    assert_eq!(claims.iat, clock.now().timestamp());

    // The first registration's password is the one that counts.
    assert!(matches!(
        auth.login("a@x.io", "pw2", 7).await,
        Err(AuthError::InvalidCredentials)
    ));
    Ok(())
}

#[tokio::test]
async fn unknown_user_and_wrong_password_look_the_same() -> Result<()> {
    let store = seeded_store().await?;
    let auth = Authenticator::new(store, AppPolicy::Strict, HOUR);
    auth.register("a@x.io", "pw1").await?;

    let wrong_password = auth.login("a@x.io", "nope", 7).await;
    let unknown_user = auth.login("ghost@x.io", "pw1", 7).await;

    match (wrong_password, unknown_user) {
        (Err(a @ AuthError::InvalidCredentials), Err(b @ AuthError::InvalidCredentials)) => {
            assert_eq!(a.to_string(), b.to_string());
        }
        other => panic!("expected two InvalidCredentials, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn zero_ttl_token_is_expired() -> Result<()> {
    let store = seeded_store().await?;
    let auth = Authenticator::new(store, AppPolicy::Strict, Duration::ZERO)
        .with_clock(clock() as Arc<dyn Clock>);
    auth.register("a@x.io", "pw1").await?;

    let token = auth.login("a@x.io", "pw1", 7).await?;
    assert!(matches!(
        auth.verify_token(&token, 7).await,
        Err(AuthError::Token(TokenError::Invalid(Rejection::Expired)))
    ));
    Ok(())
}

#[tokio::test]
async fn token_expires_when_clock_reaches_exp() -> Result<()> {
    let store = seeded_store().await?;
    let clock = clock();
    let auth = Authenticator::new(store, AppPolicy::Strict, HOUR)
        .with_clock(clock.clone() as Arc<dyn Clock>);
    auth.register("a@x.io", "pw1").await?;
    let token = auth.login("a@x.io", "pw1", 7).await?;

    clock.advance(chrono::Duration::seconds(3599));
    assert!(auth.verify_token(&token, 7).await.is_ok());

    clock.advance(chrono::Duration::seconds(1));
    assert!(matches!(
        auth.verify_token(&token, 7).await,
        Err(AuthError::Token(TokenError::Invalid(Rejection::Expired)))
    ));
    Ok(())
}

#[tokio::test]
async fn token_is_bound_to_its_app() -> Result<()> {
    let store = seeded_store().await?;
    let auth = Authenticator::new(store, AppPolicy::Strict, HOUR);
    auth.register("a@x.io", "pw1").await?;

    let token = auth.login("a@x.io", "pw1", 7).await?;
    assert!(matches!(
        auth.verify_token(&token, 8).await,
        Err(AuthError::Token(TokenError::Invalid(Rejection::Signature)))
    ));
    assert!(matches!(
        auth.verify_token(&token, 99).await,
        Err(AuthError::AppNotFound)
    ));
    Ok(())
}

#[tokio::test]
async fn strict_policy_rejects_unknown_app() -> Result<()> {
    let store = seeded_store().await?;
    let auth = Authenticator::new(store.clone(), AppPolicy::Strict, HOUR);
    auth.register("a@x.io", "pw1").await?;

    assert!(matches!(
        auth.login("a@x.io", "pw1", 42).await,
        Err(AuthError::AppNotFound)
    ));
    assert!(store.app_by_id(42).await.is_err());
    Ok(())
}

#[tokio::test]
async fn auto_provision_creates_placeholder_app() -> Result<()> {
    let store = seeded_store().await?;
    let auth = Authenticator::new(store.clone(), AppPolicy::AutoProvision, HOUR);
    auth.register("a@x.io", "pw1").await?;

    let token = auth.login("a@x.io", "pw1", 42).await?;

    let app = store.app_by_id(42).await?;
    assert_eq!(app.name, "App_42");
    assert_eq!(app.secret.expose_secret(), PLACEHOLDER_SECRET);
    assert_eq!(auth.verify_token(&token, 42).await?.uid, 1);
    Ok(())
}

#[tokio::test]
async fn invalid_input_is_rejected_before_the_store() -> Result<()> {
    let store = seeded_store().await?;
    let auth = Authenticator::new(store.clone(), AppPolicy::AutoProvision, HOUR);

    assert!(matches!(
        auth.register("", "pw").await,
        Err(AuthError::InvalidInput(_))
    ));
    assert!(matches!(
        auth.login("a@x.io", "pw", 0).await,
        Err(AuthError::InvalidInput(_))
    ));
    assert_eq!(store.user_count(), 0);
    assert!(store.app_by_id(0).await.is_err());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_get_distinct_ids() -> Result<()> {
    let store = seeded_store().await?;
    let auth = Arc::new(Authenticator::new(store.clone(), AppPolicy::Strict, HOUR));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let auth = auth.clone();
            tokio::spawn(async move { auth.register(&format!("user{i}@x.io"), "pw").await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await??);
    }
    ids.sort_unstable();

    assert_eq!(ids, (1..=16).collect::<Vec<i64>>());
    assert_eq!(store.user_count(), 16);
    Ok(())
}

#[tokio::test]
async fn file_store_survives_restart() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("in_file_storage.json");

    {
        let store = Arc::new(MemoryStore::open(&path)?);
        store.provision_app(App::new(7, "App_7", "s7")).await?;
        let auth = Authenticator::new(store, AppPolicy::Strict, HOUR);
        auth.register("a@x.io", "pw1").await?;
    }

    let store = Arc::new(MemoryStore::open(&path)?);
    let auth = Authenticator::new(store, AppPolicy::Strict, HOUR);
    let token = auth.login("a@x.io", "pw1", 7).await?;
    assert_eq!(auth.verify_token(&token, 7).await?.uid, 1);
    assert_eq!(auth.register("b@x.io", "pw2").await?, 2);
    Ok(())
}
