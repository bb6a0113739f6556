use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::cache::{CacheKey, CacheStore, CacheValue, Cacheable, InMemoryCache};
use crate::config::ClientConfig;
use crate::model::{
    AuthRequest, AuthResponse, ConnectionRequest, ConnectionStatus, Credentials, LinkState,
    NewPost, Post, ProfileUpdate, Registration, User,
};
use crate::remote::{RemoteError, RemoteStore};
use crate::session::{Session, SessionContext};

use super::error::SyncError;
use super::events::{IntentEvent, Notifier};
use super::inflight::{InFlight, IntentId, IntentPhase};
use super::intent::{Confirmation, Intent, IntentKind};
use super::policy::{Policy, Reconciliation};
use super::queue::{IntentLane, IntentQueue};

/// Outcome of a confirmed intent.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub id: IntentId,
    pub kind: IntentKind,
    pub confirmation: Confirmation,
}

struct Inner<R, C> {
    remote: R,
    cache: C,
    session: SessionContext,
    inflight: Mutex<InFlight>,
    queue: IntentQueue,
    notifier: Notifier,
    config: ClientConfig,
}

/// Mediates every read and mutation between the view layer, the local cache
/// and the remote store.
///
/// Cloning is cheap; clones share the cache, the in-flight arena and the
/// intent lanes.
pub struct SyncEngine<R, C = InMemoryCache> {
    inner: Arc<Inner<R, C>>,
}

impl<R, C> Clone for SyncEngine<R, C> {
    fn clone(&self) -> Self {
        SyncEngine {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RemoteStore> SyncEngine<R, InMemoryCache> {
    pub fn new(remote: R, session: SessionContext) -> Self {
        Self::with_cache(remote, InMemoryCache::new(), session)
    }
}

impl<R: RemoteStore, C: CacheStore> SyncEngine<R, C> {
    pub fn with_cache(remote: R, cache: C, session: SessionContext) -> Self {
        Self::with_config(remote, cache, session, ClientConfig::default())
    }

    pub fn with_config(remote: R, cache: C, session: SessionContext, config: ClientConfig) -> Self {
        SyncEngine {
            inner: Arc::new(Inner {
                remote,
                cache,
                session,
                inflight: Mutex::new(InFlight::default()),
                queue: IntentQueue::new(),
                notifier: Notifier::new(),
                config,
            }),
        }
    }

    pub fn cache(&self) -> &C {
        &self.inner.cache
    }

    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    pub fn remote(&self) -> &R {
        &self.inner.remote
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Cached value for `key` without touching the network. Stale values are
    /// returned as they are; a shape mismatch reads as absent.
    pub fn read<T: Cacheable>(&self, key: &CacheKey) -> Option<T> {
        self.inner.cache.get(key).and_then(T::from_value)
    }

    /// Fresh cached value for `key`, fetching it first when it is absent or
    /// stale.
    pub async fn query<T: Cacheable>(&self, key: CacheKey) -> Result<T, SyncError> {
        let value = match self.inner.cache.get(&key) {
            Some(value) if !self.inner.cache.is_stale(&key) => value,
            _ => self.refetch(&key).await?,
        };
        T::from_value(value).ok_or(SyncError::ShapeMismatch(key))
    }

    /// Fetch `key` from the remote store and replace the cached value.
    ///
    /// Pending optimistic effects on `key` are replayed on top of the fetched
    /// value. An invalidation that lands while the fetch is in flight leaves
    /// the entry stale; a logout or login discards the value altogether.
    pub async fn refetch(&self, key: &CacheKey) -> Result<CacheValue, SyncError> {
        let epoch = self.inner.cache.epoch(key);
        let generation = self.inflight().generation();
        debug!(key = %key, "fetching");
        let fetched = self.inner.remote.fetch(key).await.map_err(|source| {
            warn!(key = %key, error = %source, "fetch failed");
            SyncError::FetchFailed {
                key: key.clone(),
                source,
            }
        })?;

        let Some(stored) =
            self.inflight()
                .store_fetched(key, fetched, generation, &self.inner.cache)
        else {
            debug!(key = %key, "session changed while fetching, value dropped");
            return Err(SyncError::SessionChanged);
        };
        if self.inner.cache.epoch(key) != epoch {
            debug!(key = %key, "invalidated while fetching");
            self.inner.cache.invalidate(key);
        }
        Ok(stored)
    }

    pub async fn posts(&self) -> Result<Vec<Post>, SyncError> {
        self.query(CacheKey::Posts).await
    }

    pub async fn user_posts(&self, user_id: &str) -> Result<Vec<Post>, SyncError> {
        self.query(CacheKey::UserPosts(user_id.to_string())).await
    }

    pub async fn user(&self, user_id: &str) -> Result<User, SyncError> {
        self.query(CacheKey::User(user_id.to_string())).await
    }

    pub async fn current_user(&self) -> Result<User, SyncError> {
        self.query(CacheKey::CurrentUser).await
    }

    pub async fn connections(&self) -> Result<Vec<User>, SyncError> {
        self.query(CacheKey::Connections).await
    }

    pub async fn connection_requests(&self) -> Result<Vec<ConnectionRequest>, SyncError> {
        self.query(CacheKey::ConnectionRequests).await
    }

    pub async fn suggested_connections(&self) -> Result<Vec<User>, SyncError> {
        self.query(CacheKey::SuggestedConnections).await
    }

    pub async fn connection_status(&self, user_id: &str) -> Result<LinkState, SyncError> {
        let status: ConnectionStatus = self
            .query(CacheKey::ConnectionStatus(user_id.to_string()))
            .await?;
        Ok(status.status)
    }

    pub async fn is_connected(&self, user_id: &str) -> Result<bool, SyncError> {
        self.query(CacheKey::IsConnected(user_id.to_string())).await
    }

    // ========================================================================
    // Intents
    // ========================================================================

    /// Run `intent` through snapshot, optimistic apply, remote dispatch and
    /// confirm or revert.
    ///
    /// Intents from the same actor on the same target run one at a time, in
    /// arrival order. Dropping the returned future before it completes
    /// reverts the intent.
    pub async fn dispatch(&self, intent: Intent) -> Result<Receipt, SyncError> {
        intent.validate()?;
        let actor = self.inner.session.actor()?;
        let kind = intent.kind();
        let target = intent.target();

        let _lane = self
            .inner
            .queue
            .enter(IntentLane::new(actor.clone(), target.clone()))
            .await;
        // The session may have ended or changed hands while the lane was busy.
        if self.inner.session.actor()? != actor {
            debug!(%actor, %target, "session changed while queued");
            return Err(SyncError::SessionChanged);
        }

        let policy = Policy::for_intent(&intent, &actor);
        let pending = self.issue(kind, actor, target);

        if let (Reconciliation::ApplyBefore, Some(key)) =
            (policy.reconciliation, policy.projects_onto.as_ref())
        {
            pending.apply(key, &intent);
        }

        match self.inner.remote.dispatch(&intent).await {
            Ok(confirmation) => {
                let (id, current) = pending.confirm();
                // Not current: the intent outlived its session.
                if current {
                    self.reconcile(&policy, &confirmation).await;
                }
                Ok(Receipt {
                    id,
                    kind,
                    confirmation,
                })
            }
            Err(source) => {
                let id = pending.revert(&source);
                Err(SyncError::IntentFailed { id, kind, source })
            }
        }
    }

    pub async fn toggle_like(&self, post_id: &str) -> Result<Receipt, SyncError> {
        self.dispatch(Intent::like(post_id)).await
    }

    /// Like toggle on a post shown in another post collection, such as a
    /// profile's posts.
    pub async fn toggle_like_in(
        &self,
        post_id: &str,
        collection: CacheKey,
    ) -> Result<Receipt, SyncError> {
        self.dispatch(Intent::ToggleLike {
            post_id: post_id.to_string(),
            collection,
        })
        .await
    }

    pub async fn comment(&self, post_id: &str, content: &str) -> Result<Receipt, SyncError> {
        self.dispatch(Intent::comment(post_id, content)).await
    }

    pub async fn create_post(&self, post: NewPost) -> Result<Receipt, SyncError> {
        self.dispatch(Intent::CreatePost(post)).await
    }

    pub async fn send_connection_request(&self, user_id: &str) -> Result<Receipt, SyncError> {
        self.dispatch(Intent::SendConnectionRequest {
            user_id: user_id.to_string(),
        })
        .await
    }

    pub async fn accept_connection_request(&self, request_id: &str) -> Result<Receipt, SyncError> {
        self.dispatch(Intent::AcceptConnectionRequest {
            request_id: request_id.to_string(),
        })
        .await
    }

    pub async fn decline_connection_request(
        &self,
        request_id: &str,
    ) -> Result<Receipt, SyncError> {
        self.dispatch(Intent::DeclineConnectionRequest {
            request_id: request_id.to_string(),
        })
        .await
    }

    pub async fn remove_connection(&self, user_id: &str) -> Result<Receipt, SyncError> {
        self.dispatch(Intent::RemoveConnection {
            user_id: user_id.to_string(),
        })
        .await
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Receipt, SyncError> {
        self.dispatch(Intent::UpdateProfile(update)).await
    }

    /// Intents issued and not yet confirmed or reverted.
    pub fn in_flight(&self) -> usize {
        self.inflight().len()
    }

    /// Snapshots currently held for `key`.
    pub fn snapshots_on(&self, key: &CacheKey) -> usize {
        self.inflight().projected_on(key)
    }

    /// Whether an intent on the same target by the session user is in flight.
    pub fn is_busy(&self, intent: &Intent) -> bool {
        match self.inner.session.actor() {
            Ok(actor) => self
                .inner
                .queue
                .is_busy(&IntentLane::new(actor, intent.target())),
            Err(_) => false,
        }
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    pub async fn login(&self, credentials: Credentials) -> Result<User, SyncError> {
        self.authenticate(AuthRequest::Login(credentials)).await
    }

    pub async fn register(&self, registration: Registration) -> Result<User, SyncError> {
        self.authenticate(AuthRequest::Register(registration)).await
    }

    /// End the session and drop everything cached for it. Intents and
    /// fetches still running for it settle without touching the cache.
    pub fn logout(&self) -> Option<Session> {
        self.switch_session(None)
    }

    async fn authenticate(&self, request: AuthRequest) -> Result<User, SyncError> {
        let AuthResponse { token, user } = self
            .inner
            .remote
            .authenticate(&request)
            .await
            .inspect_err(|err| warn!(error = %err, "authentication failed"))?;

        self.switch_session(Some(Session::new(token, user.clone())));
        self.inner
            .cache
            .set(CacheKey::CurrentUser, CacheValue::User(user.clone()));
        Ok(user)
    }

    /// Detach in-flight work, clear the cache and swap the session, all
    /// under the arena lock so no fetch or revert lands in between.
    fn switch_session(&self, next: Option<Session>) -> Option<Session> {
        let mut inflight = self.inflight();
        let detached = inflight.reset();
        if detached > 0 {
            info!(detached, "pending intents detached from the previous session");
        }
        self.inner.cache.clear();
        let previous = self.inner.session.end();
        if let Some(session) = next {
            self.inner.session.begin(session);
        }
        previous
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn inflight(&self) -> MutexGuard<'_, InFlight> {
        lock(&self.inner.inflight)
    }

    fn issue(&self, kind: IntentKind, actor: String, target: String) -> Pending<'_, C> {
        let id = self.inflight().issue();
        debug!(intent = %id, %kind, %actor, %target, "intent issued");
        let pending = Pending {
            inflight: &self.inner.inflight,
            cache: &self.inner.cache,
            notifier: &self.inner.notifier,
            id,
            kind,
            actor,
            target,
            settled: false,
        };
        pending.notify(IntentPhase::Issued, None);
        pending
    }

    async fn reconcile(&self, policy: &Policy, confirmation: &Confirmation) {
        if let Confirmation::User(user) = confirmation {
            if self.inner.session.update_user(user.clone()) {
                info!(user_id = %user.id, "session user updated");
            }
        }

        let mut refetch = Vec::new();
        for key in &policy.invalidates {
            if self.inner.cache.invalidate(key) {
                refetch.push(key.clone());
            }
            self.inner.notifier.invalidated(key);
        }
        debug!(keys = ?policy.invalidates, "invalidated");

        if !self.inner.config.eager_refetch {
            return;
        }
        for key in refetch {
            // The next query retries a failed eager refetch.
            let _ = self.refetch(&key).await;
        }
    }
}

fn lock(inflight: &Mutex<InFlight>) -> MutexGuard<'_, InFlight> {
    inflight.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An issued intent that has not settled yet. Dropping it unsettled reverts
/// the intent.
struct Pending<'a, C: CacheStore> {
    inflight: &'a Mutex<InFlight>,
    cache: &'a C,
    notifier: &'a Notifier,
    id: IntentId,
    kind: IntentKind,
    actor: String,
    target: String,
    settled: bool,
}

impl<C: CacheStore> Pending<'_, C> {
    fn apply(&self, key: &CacheKey, intent: &Intent) {
        let effect = lock(self.inflight).apply(self.id, key, intent, &self.actor, self.cache);
        match effect {
            Some(effect) => {
                debug!(intent = %self.id, key = %key, ?effect, "applied optimistically");
                self.notify(IntentPhase::Applied, None);
            }
            None => debug!(intent = %self.id, key = %key, "nothing to project"),
        }
    }

    /// Returns the id and whether the intent still belongs to the current
    /// session.
    fn confirm(mut self) -> (IntentId, bool) {
        self.settled = true;
        let current = lock(self.inflight).confirm(self.id).is_some();
        debug!(intent = %self.id, kind = %self.kind, current, "intent confirmed");
        self.notify(IntentPhase::Confirmed, None);
        (self.id, current)
    }

    fn revert(mut self, cause: &RemoteError) -> IntentId {
        self.settled = true;
        self.rollback(cause.to_string());
        self.id
    }

    fn rollback(&self, reason: String) {
        let phase = lock(self.inflight).revert(self.id, self.cache);
        warn!(
            intent = %self.id,
            kind = %self.kind,
            target = %self.target,
            restored = phase == Some(IntentPhase::Applied),
            %reason,
            "intent reverted"
        );
        self.notify(IntentPhase::Reverted, Some(reason));
    }

    fn notify(&self, phase: IntentPhase, error: Option<String>) {
        self.notifier.intent(IntentEvent {
            id: self.id.get(),
            kind: self.kind,
            actor: self.actor.clone(),
            target: self.target.clone(),
            phase,
            error,
        });
    }
}

impl<C: CacheStore> Drop for Pending<'_, C> {
    fn drop(&mut self) {
        if !self.settled {
            self.rollback("dropped before the backend answered".to_string());
        }
    }
}
