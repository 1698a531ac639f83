pub mod http_mock;

use std::sync::Arc;

use partnerdash::{ApiClient, AuthService, MemoryStorage, Settings, TokenStore};

/// Build a client against `base_url` backed by in-memory session storage.
#[allow(dead_code)]
pub fn memory_client(base_url: &str, storage: Arc<MemoryStorage>) -> ApiClient {
    let settings = Settings::new(base_url, "/unused");
    let http = reqwest::Client::new();
    let store = Arc::new(TokenStore::new(
        AuthService::new(http.clone(), &settings.api_base_url),
        storage,
    ));
    ApiClient::new(http, &settings, store)
}

/// A store whose session lives in `storage`, not yet hydrated.
#[allow(dead_code)]
pub fn store_for(base_url: &str, storage: Arc<dyn partnerdash::SessionStorage>) -> TokenStore {
    TokenStore::new(AuthService::new(reqwest::Client::new(), base_url), storage)
}
