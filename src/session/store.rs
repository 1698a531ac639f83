use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::{broadcast, watch, Mutex};

use crate::auth::service::AuthService;
use crate::auth::types::{AuthResponse, SigninRequest, User, UserType};
use crate::error::AuthError;

use super::guard::{check_access, RouteAccess};
use super::storage::SessionStorage;
use super::{Session, SessionEvent};

/// Process-wide holder of the session.
///
/// Built with an empty session; [`TokenStore::hydrate`] then restores the
/// persisted record and fires the hydration signal exactly once. Every
/// mutation is persisted before it returns, in mutation order.
pub struct TokenStore {
    auth: AuthService,
    storage: Arc<dyn SessionStorage>,
    session: RwLock<Session>,
    write_lock: Mutex<()>,
    hydrated: watch::Sender<bool>,
    events: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("session", &*self.read())
            .field("hydrated", &self.is_hydrated())
            .finish_non_exhaustive()
    }
}

impl TokenStore {
    pub fn new(auth: AuthService, storage: Arc<dyn SessionStorage>) -> Self {
        let (hydrated, _) = watch::channel(false);
        let (events, _) = broadcast::channel(16);
        Self {
            auth,
            storage,
            session: RwLock::new(Session::default()),
            write_lock: Mutex::new(()),
            hydrated,
            events,
        }
    }

    /// Restore the persisted session. Only the first call loads anything.
    ///
    /// An unreadable record is logged and treated as absent; hydration
    /// still completes.
    pub async fn hydrate(&self) {
        if self.is_hydrated() {
            return;
        }
        let _write = self.write_lock.lock().await;
        self.hydrate_locked().await;
    }

    /// Caller holds `write_lock`.
    async fn hydrate_locked(&self) {
        if self.is_hydrated() {
            return;
        }

        match self.storage.load().await {
            Ok(Some(session)) => {
                tracing::debug!(
                    authenticated = session.is_authenticated,
                    "Restored persisted session"
                );
                *self.write() = session;
            }
            Ok(None) => tracing::debug!("No persisted session"),
            Err(e) => tracing::warn!("Ignoring unreadable persisted session: {e}"),
        }

        self.hydrated.send_replace(true);
    }

    pub fn is_hydrated(&self) -> bool {
        *self.hydrated.borrow()
    }

    pub async fn wait_hydrated(&self) {
        let mut rx = self.hydrated.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|hydrated| *hydrated).await;
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().refresh_token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated
    }

    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    /// True while either token is held.
    pub fn has_credentials(&self) -> bool {
        let session = self.read();
        session.access_token.is_some() || session.refresh_token.is_some()
    }

    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn route_access(&self, allowed: &[UserType]) -> RouteAccess {
        check_access(self.is_hydrated(), &self.read(), allowed)
    }

    pub async fn set_tokens(&self, access: String, refresh: Option<String>) {
        self.mutate(|s| {
            s.access_token = Some(access);
            s.refresh_token = refresh;
            s.is_authenticated = true;
        })
        .await;
    }

    /// Drop both tokens but keep the cached profile.
    pub async fn clear_auth(&self) {
        self.mutate(|s| {
            s.access_token = None;
            s.refresh_token = None;
            s.expires_at = None;
            s.is_authenticated = false;
        })
        .await;
    }

    pub async fn set_user(&self, user: User) {
        self.mutate(|s| s.user = Some(user)).await;
    }

    pub async fn signin(&self, credentials: &SigninRequest) -> Result<Session, AuthError> {
        let response = self.auth.signin(credentials).await?;
        if response.user.user_type != UserType::Affiliate {
            tracing::warn!(user_type = ?response.user.user_type, "Rejected non-affiliate sign-in");
            return Err(AuthError::AccessDenied(
                "Affiliate access required".to_string(),
            ));
        }

        let session = self.apply_auth_response(response, None).await;
        tracing::info!("Signed in");
        let _ = self.events.send(SessionEvent::SignedIn);
        Ok(session)
    }

    /// Exchange the held refresh token for a new pair.
    ///
    /// Any failure of the exchange clears the tokens before it is returned.
    pub async fn refresh_tokens(&self) -> Result<(), AuthError> {
        self.hydrate().await;
        let Some(refresh_token) = self.refresh_token() else {
            return Err(AuthError::NoRefreshToken);
        };

        match self.auth.refresh(&refresh_token).await {
            Ok(response) => {
                self.apply_auth_response(response, Some(refresh_token)).await;
                tracing::debug!("Access token refreshed");
                let _ = self.events.send(SessionEvent::Refreshed);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Token refresh failed: {e}");
                self.clear_auth().await;
                Err(e)
            }
        }
    }

    pub async fn sign_out(&self) {
        self.end_session(false).await;
    }

    pub(crate) async fn end_session(&self, forced: bool) {
        self.mutate(|s| *s = Session::default()).await;
        if forced {
            tracing::warn!("Session expired; sign-in required");
        } else {
            tracing::info!("Signed out");
        }
        let _ = self.events.send(SessionEvent::SignedOut { forced });
    }

    /// `fallback_refresh` is kept when the response carries no refresh token.
    async fn apply_auth_response(
        &self,
        response: AuthResponse,
        fallback_refresh: Option<String>,
    ) -> Session {
        let expires_at = chrono::Utc::now() + chrono::Duration::seconds(response.expires_in);
        let refresh = response.refresh_token.or(fallback_refresh);
        self.mutate(|s| {
            s.access_token = Some(response.access_token);
            s.refresh_token = refresh;
            s.is_authenticated = true;
            s.user = Some(response.user);
            s.expires_at = Some(expires_at);
        })
        .await
    }

    /// Apply `f` and persist the result. A store that was never hydrated
    /// loads the persisted record first, so the write cannot clobber it.
    async fn mutate<F>(&self, f: F) -> Session
    where
        F: FnOnce(&mut Session),
    {
        let _write = self.write_lock.lock().await;
        self.hydrate_locked().await;
        let snapshot = {
            let mut session = self.write();
            f(&mut session);
            session.clone()
        };
        if let Err(e) = self.storage.save(&snapshot).await {
            tracing::warn!("Failed to persist session: {e}");
        }
        snapshot
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}
