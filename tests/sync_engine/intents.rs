use valwera_sync::{
    CacheKey, CacheStore, CacheValue, Comment, Confirmation, Intent, IntentKind, NewPost,
    ProfileUpdate, Session, SessionContext, SessionError, SyncEngine, SyncError, User,
};

use crate::support::{engine, engine_with, jwt_with_exp, post, posts, request, user, FakeRemote};

#[tokio::test]
async fn comment_invalidates_and_refetch_replaces_wholesale() {
    let remote = FakeRemote::new();
    let before = posts(&[("p1", &[]), ("p2", &[])]);
    let engine = engine_with(&remote, CacheKey::Posts, before.clone()).await;

    let receipt = engine.comment("p1", "See you at the track").await.unwrap();
    assert_eq!(receipt.kind, IntentKind::CreateComment);
    assert!(matches!(receipt.confirmation, Confirmation::Comment(ref c) if c.content == "See you at the track"));

    // Nothing was appended locally; the entry is merely stale.
    assert_eq!(engine.cache().get(&CacheKey::Posts), Some(before));
    assert!(engine.cache().is_stale(&CacheKey::Posts));

    let mut commented = post("p1", &[]);
    commented.comments.push(Comment {
        id: "c1".into(),
        content: "See you at the track".into(),
        author: user("u1", "Ada Lovelace"),
        created_at: String::new(),
        updated_at: String::new(),
    });
    let server = vec![post("p4", &[]), commented, post("p2", &[])];
    remote.serve(CacheKey::Posts, CacheValue::Posts(server.clone()));

    assert_eq!(engine.posts().await.unwrap(), server);
    assert_eq!(remote.fetch_count(&CacheKey::Posts), 2);
}

#[tokio::test]
async fn confirmed_like_reconciles_idempotently() {
    let remote = FakeRemote::new();
    let engine = engine_with(&remote, CacheKey::Posts, posts(&[("p1", &[])])).await;

    engine.toggle_like("p1").await.unwrap();
    let server = posts(&[("p1", &["u1"])]);
    remote.serve(CacheKey::Posts, server.clone());

    let first = engine.refetch(&CacheKey::Posts).await.unwrap();
    let second = engine.refetch(&CacheKey::Posts).await.unwrap();
    assert_eq!(first, server);
    assert_eq!(first, second);
}

#[tokio::test]
async fn two_confirmed_toggles_cancel_out() {
    let remote = FakeRemote::new();
    let before = posts(&[("p1", &["u3"])]);
    let engine = engine_with(&remote, CacheKey::Posts, before.clone()).await;

    engine.toggle_like("p1").await.unwrap();
    assert_eq!(
        engine.cache().get(&CacheKey::Posts),
        Some(posts(&[("p1", &["u3", "u1"])]))
    );
    engine.toggle_like("p1").await.unwrap();
    assert_eq!(engine.cache().get(&CacheKey::Posts), Some(before));
}

#[tokio::test]
async fn like_on_an_uncached_feed_skips_the_projection() {
    let remote = FakeRemote::new();
    let engine = engine(&remote);

    let receipt = engine.toggle_like("p1").await.unwrap();
    assert_eq!(receipt.kind, IntentKind::ToggleLike);
    assert_eq!(remote.dispatched(), vec![Intent::like("p1")]);
    assert!(engine.cache().get(&CacheKey::Posts).is_none());
}

#[tokio::test]
async fn like_on_a_profile_marks_both_post_lists_stale() {
    let remote = FakeRemote::new();
    let profile = CacheKey::UserPosts("u9".into());
    let engine = engine_with(&remote, profile.clone(), posts(&[("p1", &[])])).await;
    remote.serve(CacheKey::Posts, posts(&[("p1", &[])]));
    engine.refetch(&CacheKey::Posts).await.unwrap();

    engine.toggle_like_in("p1", profile.clone()).await.unwrap();

    assert_eq!(engine.cache().get(&profile), Some(posts(&[("p1", &["u1"])])));
    // The feed copy was not projected onto, only invalidated.
    assert_eq!(engine.cache().get(&CacheKey::Posts), Some(posts(&[("p1", &[])])));
    assert!(engine.cache().is_stale(&profile));
    assert!(engine.cache().is_stale(&CacheKey::Posts));
}

#[tokio::test]
async fn new_post_invalidates_feed_and_own_posts() {
    let remote = FakeRemote::new();
    let engine = engine_with(&remote, CacheKey::Posts, posts(&[("p1", &[])])).await;
    remote.serve(CacheKey::UserPosts("u1".into()), posts(&[]));
    engine.user_posts("u1").await.unwrap();

    let receipt = engine
        .create_post(NewPost {
            content: "Morning run, 10k".into(),
            image: None,
        })
        .await
        .unwrap();
    assert!(matches!(receipt.confirmation, Confirmation::Post(ref p) if p.content == "Morning run, 10k"));
    assert!(engine.cache().is_stale(&CacheKey::Posts));
    assert!(engine.cache().is_stale(&CacheKey::UserPosts("u1".into())));
}

#[tokio::test]
async fn accepted_request_drops_out_and_connections_go_stale() {
    let remote = FakeRemote::new();
    let engine = engine_with(
        &remote,
        CacheKey::ConnectionRequests,
        CacheValue::Requests(vec![request("r1", "u2"), request("r2", "u3")]),
    )
    .await;
    remote.serve(CacheKey::Connections, CacheValue::Users(vec![]));
    engine.connections().await.unwrap();

    engine.accept_connection_request("r1").await.unwrap();

    assert_eq!(
        engine.cache().get(&CacheKey::ConnectionRequests),
        Some(CacheValue::Requests(vec![request("r2", "u3")]))
    );
    assert!(engine.cache().is_stale(&CacheKey::ConnectionRequests));
    assert!(engine.cache().is_stale(&CacheKey::Connections));
}

#[tokio::test]
async fn sent_request_refreshes_relationship_keys() {
    let remote = FakeRemote::new();
    let engine = engine_with(&remote, CacheKey::IsConnected("u2".into()), CacheValue::Flag(false)).await;

    engine.send_connection_request("u2").await.unwrap();
    assert!(engine.cache().is_stale(&CacheKey::IsConnected("u2".into())));
    assert_eq!(
        remote.dispatched(),
        vec![Intent::SendConnectionRequest {
            user_id: "u2".into()
        }]
    );
}

#[tokio::test]
async fn profile_update_refreshes_the_session_user() {
    let remote = FakeRemote::new();
    let engine = engine_with(
        &remote,
        CacheKey::CurrentUser,
        CacheValue::User(user("u1", "Ada Lovelace")),
    )
    .await;

    let update = ProfileUpdate {
        headline: Some("Sprinter".into()),
        ..Default::default()
    };
    let receipt = engine.update_profile(update).await.unwrap();
    assert_eq!(receipt.kind, IntentKind::UpdateProfile);

    let session_user = engine.session().user().unwrap();
    assert_eq!(session_user.headline.as_deref(), Some("Sprinter"));
    assert!(engine.cache().is_stale(&CacheKey::CurrentUser));
}

#[tokio::test]
async fn blank_comment_never_reaches_the_backend() {
    let remote = FakeRemote::new();
    let before = posts(&[("p1", &[])]);
    let engine = engine_with(&remote, CacheKey::Posts, before.clone()).await;

    let err = engine.comment("p1", "   ").await.unwrap_err();
    assert!(matches!(err, SyncError::InvalidIntent(_)));
    assert!(remote.dispatched().is_empty());
    assert_eq!(engine.cache().get(&CacheKey::Posts), Some(before));
    assert!(!engine.cache().is_stale(&CacheKey::Posts));
    assert_eq!(engine.in_flight(), 0);
}

#[tokio::test]
async fn no_session_no_intent() {
    let remote = FakeRemote::new();
    let engine = SyncEngine::new(remote.clone(), SessionContext::new());

    let err = engine.toggle_like("p1").await.unwrap_err();
    assert_eq!(err, SyncError::Unauthenticated(SessionError::Missing));
    assert!(err.is_unauthorized());
    assert!(remote.dispatched().is_empty());
}

#[tokio::test]
async fn expired_token_is_refused_locally() {
    let remote = FakeRemote::new();
    let session = SessionContext::with_session(Session::new(
        jwt_with_exp(1),
        User::new("u1", "Ada Lovelace"),
    ));
    let engine = SyncEngine::new(remote.clone(), session);

    let err = engine
        .create_post(NewPost {
            content: "Hello".into(),
            image: None,
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SyncError::Unauthenticated(SessionError::Expired("u1".into()))
    );
    assert!(remote.dispatched().is_empty());
}
