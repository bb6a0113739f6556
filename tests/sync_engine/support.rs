//! Scripted in-memory backend for engine tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use tokio::sync::oneshot;
use valwera_sync::{
    AuthRequest, AuthResponse, CacheKey, CacheValue, Comment, Confirmation, ConnectionRequest,
    Intent, Post, Removal, RemoteError, RemoteStore, RequestStatus, Session, SessionContext,
    SyncEngine, User,
};

pub type TestEngine = SyncEngine<Arc<FakeRemote>>;

enum Step {
    Fail(RemoteError),
    Hold(oneshot::Receiver<Option<RemoteError>>),
}

/// Releases a held dispatch.
pub struct Gate(oneshot::Sender<Option<RemoteError>>);

impl Gate {
    pub fn confirm(self) {
        let _ = self.0.send(None);
    }

    pub fn fail(self, err: RemoteError) {
        let _ = self.0.send(Some(err));
    }
}

#[derive(Default)]
struct State {
    server: HashMap<CacheKey, CacheValue>,
    steps: VecDeque<Step>,
    fetch_gates: HashMap<CacheKey, oneshot::Receiver<()>>,
    fetches: Vec<CacheKey>,
    dispatched: Vec<Intent>,
    auth: Option<AuthResponse>,
}

/// Backend double. Dispatches confirm unless a step was scripted for them;
/// steps are consumed in the order dispatches arrive.
#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<State>,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Authoritative value served for `key`.
    pub fn serve(&self, key: CacheKey, value: CacheValue) {
        self.state.lock().unwrap().server.insert(key, value);
    }

    pub fn fail_next(&self, err: RemoteError) {
        self.state.lock().unwrap().steps.push_back(Step::Fail(err));
    }

    /// The next dispatch waits until the returned gate is released.
    pub fn hold_next(&self) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().steps.push_back(Step::Hold(rx));
        Gate(tx)
    }

    /// The next fetch of `key` waits until the sender fires.
    pub fn hold_fetch(&self, key: CacheKey) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().fetch_gates.insert(key, rx);
        tx
    }

    pub fn authenticate_as(&self, token: &str, user: User) {
        self.state.lock().unwrap().auth = Some(AuthResponse {
            token: token.to_string(),
            user,
        });
    }

    pub fn fetches(&self) -> Vec<CacheKey> {
        self.state.lock().unwrap().fetches.clone()
    }

    pub fn fetch_count(&self, key: &CacheKey) -> usize {
        self.fetches().iter().filter(|k| *k == key).count()
    }

    pub fn dispatched(&self) -> Vec<Intent> {
        self.state.lock().unwrap().dispatched.clone()
    }

    /// Wait until `n` dispatches have reached the backend.
    pub async fn wait_for_dispatches(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.dispatched().len() < n {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("dispatches never arrived");
    }

    /// Wait until `n` fetches have started.
    pub async fn wait_for_fetches(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.fetches().len() < n {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("fetches never arrived");
    }

    fn confirmation_for(&self, intent: &Intent) -> Confirmation {
        match intent {
            Intent::ToggleLike { post_id, .. } => Confirmation::Post(post(post_id, &[])),
            Intent::CreateComment { content, .. } => Confirmation::Comment(Comment {
                id: "c-new".into(),
                content: content.clone(),
                author: user("u1", "Ada Lovelace"),
                created_at: String::new(),
                updated_at: String::new(),
            }),
            Intent::CreatePost(new) => {
                let mut created = post("p-new", &[]);
                created.content = new.content.clone();
                Confirmation::Post(created)
            }
            Intent::SendConnectionRequest { .. } => Confirmation::Request(request("r-new", "u1")),
            Intent::AcceptConnectionRequest { request_id }
            | Intent::DeclineConnectionRequest { request_id } => {
                Confirmation::Request(request(request_id, "u2"))
            }
            Intent::RemoveConnection { .. } => Confirmation::Removed(Removal { success: true }),
            Intent::UpdateProfile(update) => {
                let mut updated = user("u1", "Ada Lovelace");
                if let Some(name) = &update.name {
                    updated.name = name.clone();
                }
                updated.headline = update.headline.clone();
                Confirmation::User(updated)
            }
        }
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn fetch(&self, key: &CacheKey) -> Result<CacheValue, RemoteError> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.fetches.push(key.clone());
            state.fetch_gates.remove(key)
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.state
            .lock()
            .unwrap()
            .server
            .get(key)
            .cloned()
            .ok_or_else(|| RemoteError::from_status(404, "Not found"))
    }

    async fn dispatch(&self, intent: &Intent) -> Result<Confirmation, RemoteError> {
        let step = {
            let mut state = self.state.lock().unwrap();
            state.dispatched.push(intent.clone());
            state.steps.pop_front()
        };
        let failure = match step {
            None => None,
            Some(Step::Fail(err)) => Some(err),
            Some(Step::Hold(rx)) => rx
                .await
                .unwrap_or_else(|_| Some(RemoteError::Transport("gate dropped".into()))),
        };
        match failure {
            Some(err) => Err(err),
            None => Ok(self.confirmation_for(intent)),
        }
    }

    async fn authenticate(&self, _request: &AuthRequest) -> Result<AuthResponse, RemoteError> {
        self.state
            .lock()
            .unwrap()
            .auth
            .clone()
            .ok_or_else(|| RemoteError::from_status(401, "Invalid credentials"))
    }
}

pub fn user(id: &str, name: &str) -> User {
    User::new(id, name)
}

pub fn post(id: &str, likes: &[&str]) -> Post {
    Post {
        id: id.into(),
        content: format!("post {id}"),
        author: user("u9", "Coach"),
        likes: likes.iter().map(|s| s.to_string()).collect(),
        comments: Vec::new(),
        created_at: String::new(),
        updated_at: String::new(),
        image: None,
    }
}

pub fn posts(items: &[(&str, &[&str])]) -> CacheValue {
    CacheValue::Posts(items.iter().map(|(id, likes)| post(id, likes)).collect())
}

pub fn request(id: &str, sender: &str) -> ConnectionRequest {
    ConnectionRequest {
        id: id.into(),
        sender: user(sender, "Sender"),
        recipient: user("u1", "Ada Lovelace"),
        status: RequestStatus::Pending,
        created_at: String::new(),
        updated_at: String::new(),
    }
}

pub fn jwt_with_exp(exp: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u1","exp":{exp}}}"#));
    format!("{header}.{payload}.sig")
}

/// Engine with `u1` logged in and nothing cached.
pub fn engine(remote: &Arc<FakeRemote>) -> TestEngine {
    let session = SessionContext::with_session(Session::new("token-u1", user("u1", "Ada Lovelace")));
    SyncEngine::new(remote.clone(), session)
}

/// Engine with `u1` logged in and `key` already fetched.
pub async fn engine_with(remote: &Arc<FakeRemote>, key: CacheKey, value: CacheValue) -> TestEngine {
    remote.serve(key.clone(), value);
    let engine = engine(remote);
    engine.refetch(&key).await.unwrap();
    engine
}
