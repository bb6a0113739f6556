use std::time::Duration;

use valwera_sync::{
    CacheKey, CacheStore, CacheValue, Credentials, Post, Registration, RemoteError,
    SessionContext, SyncEngine, SyncError,
};

use crate::support::{engine, engine_with, posts, user, FakeRemote};

#[tokio::test]
async fn login_starts_a_session_and_seeds_current_user() {
    let remote = FakeRemote::new();
    remote.authenticate_as("token-u2", user("u2", "Bo Jackson"));
    let session = SessionContext::new();
    let engine = SyncEngine::new(remote.clone(), session.clone());

    let logged_in = engine
        .login(Credentials::new("bo@example.com", "hunter2"))
        .await
        .unwrap();

    assert_eq!(logged_in.id, "u2");
    assert_eq!(session.token().as_deref(), Some("token-u2"));
    assert_eq!(session.actor(), Ok("u2".to_string()));
    assert_eq!(
        engine.cache().get(&CacheKey::CurrentUser),
        Some(CacheValue::User(user("u2", "Bo Jackson")))
    );
    // Served from the seeded cache.
    assert_eq!(engine.current_user().await.unwrap().name, "Bo Jackson");
    assert!(remote.fetches().is_empty());
}

#[tokio::test]
async fn login_drops_the_previous_users_cache() {
    let remote = FakeRemote::new();
    let engine = engine_with(&remote, CacheKey::Posts, posts(&[("p1", &["u1"])])).await;
    remote.authenticate_as("token-u2", user("u2", "Bo Jackson"));

    engine
        .register(Registration {
            name: "Bo Jackson".into(),
            email: "bo@example.com".into(),
            password: "hunter2".into(),
        })
        .await
        .unwrap();

    assert!(engine.cache().get(&CacheKey::Posts).is_none());
    assert_eq!(engine.cache().keys(), vec![CacheKey::CurrentUser]);
}

#[tokio::test]
async fn failed_login_leaves_no_session() {
    let remote = FakeRemote::new();
    let engine = SyncEngine::new(remote.clone(), SessionContext::new());

    let err = engine
        .login(Credentials::new("bo@example.com", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SyncError::Remote(RemoteError::from_status(401, "Invalid credentials"))
    );
    assert!(err.is_unauthorized());
    assert!(!engine.session().is_active());
}

#[tokio::test]
async fn logout_ends_the_session_and_clears_the_cache() {
    let remote = FakeRemote::new();
    let engine = engine_with(&remote, CacheKey::Posts, posts(&[("p1", &[])])).await;

    let ended = engine.logout().unwrap();
    assert_eq!(ended.user_id(), "u1");
    assert!(!engine.session().is_active());
    assert!(engine.cache().keys().is_empty());

    let err = engine.toggle_like("p1").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(engine.logout().is_none());
}

#[tokio::test]
async fn revert_after_logout_restores_nothing() {
    let remote = FakeRemote::new();
    let engine = engine_with(&remote, CacheKey::Posts, posts(&[("p1", &[])])).await;
    let gate = remote.hold_next();

    let like = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.toggle_like("p1").await })
    };
    remote.wait_for_dispatches(1).await;
    assert_eq!(engine.snapshots_on(&CacheKey::Posts), 1);

    engine.logout();
    assert_eq!(engine.in_flight(), 0);
    gate.fail(RemoteError::from_status(401, "Token expired"));

    let err = like.await.unwrap().unwrap_err();
    assert!(matches!(err, SyncError::IntentFailed { .. }));
    assert!(engine.cache().keys().is_empty());
}

#[tokio::test]
async fn fetch_finishing_after_logout_is_discarded() {
    let remote = FakeRemote::new();
    let engine = engine(&remote);
    remote.serve(CacheKey::Posts, posts(&[("p1", &["u1"])]));
    let release = remote.hold_fetch(CacheKey::Posts);

    let fetch = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.posts().await })
    };
    remote.wait_for_fetches(1).await;
    engine.logout();
    release.send(()).unwrap();

    assert_eq!(fetch.await.unwrap().unwrap_err(), SyncError::SessionChanged);
    assert!(engine.cache().keys().is_empty());
    assert!(engine.read::<Vec<Post>>(&CacheKey::Posts).is_none());
}

#[tokio::test]
async fn next_user_does_not_inherit_pending_effects() {
    let remote = FakeRemote::new();
    let engine = engine_with(&remote, CacheKey::Posts, posts(&[("p1", &[])])).await;
    let gate = remote.hold_next();

    let like = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.toggle_like("p1").await })
    };
    remote.wait_for_dispatches(1).await;

    remote.authenticate_as("token-u2", user("u2", "Bo Jackson"));
    engine
        .login(Credentials::new("bo@example.com", "hunter2"))
        .await
        .unwrap();
    remote.serve(CacheKey::Posts, posts(&[("p1", &[])]));

    // u1's like stays out of u2's feed.
    let feed = engine.refetch(&CacheKey::Posts).await.unwrap();
    assert_eq!(feed, posts(&[("p1", &[])]));

    // Its late confirmation reconciles nothing in u2's session.
    gate.confirm();
    like.await.unwrap().unwrap();
    assert_eq!(engine.session().actor(), Ok("u2".to_string()));
    assert!(!engine.cache().is_stale(&CacheKey::Posts));
    assert_eq!(engine.cache().get(&CacheKey::Posts), Some(posts(&[("p1", &[])])));
}

#[tokio::test]
async fn queued_intent_fails_when_the_session_changes_hands() {
    let remote = FakeRemote::new();
    let engine = engine_with(&remote, CacheKey::Posts, posts(&[("p1", &[])])).await;
    let gate = remote.hold_next();

    let first = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.toggle_like("p1").await })
    };
    remote.wait_for_dispatches(1).await;
    let second = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.toggle_like("p1").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    engine.logout();
    remote.authenticate_as("token-u2", user("u2", "Bo Jackson"));
    engine
        .login(Credentials::new("bo@example.com", "hunter2"))
        .await
        .unwrap();
    engine.cache().set(CacheKey::Posts, posts(&[("p1", &[])]));

    gate.confirm();
    first.await.unwrap().unwrap();
    assert_eq!(second.await.unwrap().unwrap_err(), SyncError::SessionChanged);

    // Nothing was sent or projected on u2's behalf.
    assert_eq!(remote.dispatched().len(), 1);
    assert_eq!(engine.cache().get(&CacheKey::Posts), Some(posts(&[("p1", &[])])));
}
