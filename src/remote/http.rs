//! HTTP implementation of [`RemoteStore`] over the backend's REST API.
//!
//! Requires the `http` feature. Uses reqwest.
//!
//! ## Example
//!
//! ```ignore
//! use valwera_sync::{ClientConfig, HttpRemoteStore, SessionContext, SyncEngine};
//!
//! let session = SessionContext::new();
//! let remote = HttpRemoteStore::new(&ClientConfig::from_env(), session.clone())?;
//! let engine = SyncEngine::new(remote, session);
//! ```

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{CacheKey, CacheValue};
use crate::config::ClientConfig;
use crate::engine::{Confirmation, Intent};
use crate::model::{AuthRequest, AuthResponse};
use crate::session::SessionContext;

use super::error::{RemoteError, DEFAULT_MESSAGE};
use super::route::{Method, Route};
use super::store::RemoteStore;

/// Talks to the backend over HTTP, attaching the session's bearer credential.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: Client,
    config: ClientConfig,
    session: SessionContext,
}

impl HttpRemoteStore {
    pub fn new(config: &ClientConfig, session: SessionContext) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, config.clone(), session))
    }

    /// Use a preconfigured reqwest client.
    pub fn with_client(client: Client, config: ClientConfig, session: SessionContext) -> Self {
        Self {
            client,
            config,
            session,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `route` and return the decoded JSON body of a success response.
    pub async fn send(&self, route: Route) -> Result<Value, RemoteError> {
        let url = self.config.endpoint(&route.path);
        let mut request = match route.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(session) = self.session.current() {
            request = request.header(AUTHORIZATION, session.bearer());
        }
        if let Some(body) = &route.body {
            request = request.json(body);
        }

        debug!(method = %route.method, path = %route.path, "sending request");
        let response = request.send().await.map_err(|e| {
            warn!(method = %route.method, path = %route.path, error = %e, "request failed");
            RemoteError::Transport(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else if status.is_success() {
            serde_json::from_str(&text)?
        } else {
            serde_json::from_str(&text).unwrap_or(Value::Null)
        };

        if status.is_success() {
            return Ok(body);
        }

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_MESSAGE)
            .to_string();
        warn!(
            method = %route.method,
            path = %route.path,
            status = status.as_u16(),
            message = %message,
            "backend rejected request"
        );
        Err(RemoteError::from_status(status.as_u16(), message))
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch(&self, key: &CacheKey) -> Result<CacheValue, RemoteError> {
        let body = self.send(Route::fetch(key)).await?;
        Ok(CacheValue::decode(key, body)?)
    }

    async fn dispatch(&self, intent: &Intent) -> Result<Confirmation, RemoteError> {
        let body = self.send(Route::dispatch(intent)?).await?;
        Ok(Confirmation::decode(intent.kind(), body)?)
    }

    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthResponse, RemoteError> {
        let body = self.send(Route::authenticate(request)?).await?;
        Ok(serde_json::from_value(body)?)
    }
}
