use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::Settings;
use crate::error::{AuthError, ClientError};
use crate::session::TokenStore;

use super::envelope::{decode_body, decode_data};
use super::refresh::{RefreshGate, Ticket};

/// A replayable description of one API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::Protocol(format!("Failed to encode request body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Result of one trip to the server, with the token it was sent under.
struct Attempt {
    token: Option<String>,
    result: Result<Value, ClientError>,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    store: Arc<TokenStore>,
    gate: RefreshGate,
}

/// Authenticated API client.
///
/// Attaches the store's access token to each request and unwraps the
/// response envelope. A 401 triggers at most one token refresh across all
/// concurrent callers; requests that fail while it runs wait for it and are
/// replayed once with the new token. Cloning is cheap and clones share the
/// refresh state.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("timeout", &self.inner.timeout)
            .field("refreshing", &self.inner.gate.is_in_flight())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(http: reqwest::Client, settings: &Settings, store: Arc<TokenStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                base_url: settings.api_base_url.trim_end_matches('/').to_string(),
                timeout: settings.timeout,
                store,
                gate: RefreshGate::new(),
            }),
        }
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.inner.store
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.gate.is_in_flight()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(ApiRequest::get(path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::post(path).json(body)?).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::patch(path).json(body)?).await
    }

    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let data = self.execute_value(request).await?;
        decode_data(data)
    }

    /// Send `request` and return the envelope's `data`.
    ///
    /// Waits for the store to load the persisted session first; until then
    /// an absent token is not known to be absent.
    pub async fn execute_value(&self, request: ApiRequest) -> Result<Value, ClientError> {
        self.inner.store.hydrate().await;
        let attempt = self.send_once(&request).await;
        match attempt.result {
            Err(err) if err.is_unauthorized() => self.recover(&request, attempt.token).await,
            other => other,
        }
    }

    /// Handle a first 401. Whatever happens here, `request` is sent at most
    /// once more and a second 401 is returned as-is.
    async fn recover(
        &self,
        request: &ApiRequest,
        sent_token: Option<String>,
    ) -> Result<Value, ClientError> {
        let store = &self.inner.store;

        let ticket = self.inner.gate.enter(|| {
            let current = store.access_token();
            current.is_some() && current != sent_token
        });

        match ticket {
            Ticket::Replay => {
                tracing::debug!(path = %request.path, "Token rotated since request was sent; replaying");
                self.send_once(request).await.result
            }
            Ticket::Leader(lease) => {
                tracing::info!(path = %request.path, "Access token rejected; refreshing");
                let had_session = store.has_credentials();
                match store.refresh_tokens().await {
                    Ok(()) => {
                        let result = self.send_once(request).await.result;
                        let drained = lease.settle(Ok(()));
                        tracing::debug!(drained, "Token refresh complete");
                        result
                    }
                    Err(e) => {
                        // Nothing to sign out of when no credentials were held.
                        if had_session {
                            store.end_session(true).await;
                        }
                        let drained = lease.settle(Err(e.clone()));
                        tracing::warn!(drained, "Token refresh failed: {e}");
                        Err(ClientError::Auth(e))
                    }
                }
            }
            Ticket::Follower(waiter) => match waiter.await {
                Ok(Ok(())) => self.send_once(request).await.result,
                Ok(Err(e)) => Err(ClientError::Auth(e)),
                Err(_) => Err(ClientError::Auth(AuthError::RefreshAbandoned)),
            },
        }
    }

    async fn send_once(&self, request: &ApiRequest) -> Attempt {
        let token = self.inner.store.access_token();
        let result = self.dispatch(request, token.as_deref()).await;
        Attempt { token, result }
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.inner.base_url, request.path);
        let request_id = uuid::Uuid::new_v4().to_string();

        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), &url)
            .header("X-Request-Id", request_id.as_str());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            request_id = %request_id,
            authenticated = token.is_some(),
            "Sending request"
        );

        let response = builder
            .send()
            .await
            .map_err(|e| self.transport_error(&request.path, e))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&request.path, e))?;

        tracing::debug!(status, request_id = %request_id, "Received response");
        decode_body(status, &bytes)
    }

    fn transport_error(&self, path: &str, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout {
                path: path.to_string(),
                duration: self.inner.timeout,
            }
        } else {
            ClientError::Transport {
                path: path.to_string(),
                source: Box::new(e),
            }
        }
    }
}
