use std::sync::Arc;

use crate::affiliate::AffiliateService;
use crate::auth::{AuthService, ProfileService, SigninRequest, UserType};
use crate::config::{load_settings, Settings};
use crate::error::{AuthError, ClientError};
use crate::http::{build_http_client, ApiClient};
use crate::session::{FileStorage, RouteAccess, Session, SessionStorage, TokenStore};

/// Roles allowed to use the dashboard.
pub const DASHBOARD_ROLES: &[UserType] = &[UserType::Affiliate];

/// Everything a dashboard surface needs, wired once and passed around.
pub struct App {
    settings: Settings,
    client: ApiClient,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("settings", &self.settings)
            .field("client", &self.client)
            .finish()
    }
}

impl App {
    /// Load settings from every config source and hydrate the persisted session.
    pub async fn from_config(cli_config: Option<&str>) -> Result<Self, ClientError> {
        let settings = load_settings(cli_config)?;
        Self::with_settings(settings).await
    }

    pub async fn with_settings(settings: Settings) -> Result<Self, ClientError> {
        let storage = Arc::new(FileStorage::new(&settings.session_file));
        Self::with_storage(settings, storage).await
    }

    pub async fn with_storage(
        settings: Settings,
        storage: Arc<dyn SessionStorage>,
    ) -> Result<Self, ClientError> {
        let http = build_http_client(&settings)?;
        let auth = AuthService::new(http.clone(), &settings.api_base_url);
        let store = Arc::new(TokenStore::new(auth, storage));
        store.hydrate().await;
        let client = ApiClient::new(http, &settings, store);
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        self.client.store()
    }

    pub fn profiles(&self) -> ProfileService<'_> {
        ProfileService::new(&self.client)
    }

    pub fn affiliates(&self) -> AffiliateService<'_> {
        AffiliateService::new(&self.client)
    }

    pub async fn signin(&self, credentials: &SigninRequest) -> Result<Session, ClientError> {
        Ok(self.store().signin(credentials).await?)
    }

    pub async fn sign_out(&self) {
        self.store().sign_out().await;
    }

    /// Gate for surfaces that need an affiliate session.
    pub async fn require_session(&self) -> Result<(), ClientError> {
        self.store().wait_hydrated().await;
        match self.store().route_access(DASHBOARD_ROLES) {
            RouteAccess::Granted => Ok(()),
            RouteAccess::Forbidden => Err(ClientError::Auth(AuthError::AccessDenied(
                "Affiliate access required".to_string(),
            ))),
            RouteAccess::Pending | RouteAccess::SignInRequired => Err(ClientError::AuthRequired),
        }
    }
}
