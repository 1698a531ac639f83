mod common;

use std::sync::Arc;
use std::time::Duration;

use partnerdash::auth::UserType;
use partnerdash::session::{FileStorage, RouteAccess};
use partnerdash::{AuthError, MemoryStorage, SessionStorage, SigninRequest};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::http_mock::{mount_login, mount_refresh, refresh_ok, unauthorized};

const ROLES: &[UserType] = &[UserType::Affiliate];

fn credentials() -> SigninRequest {
    SigninRequest::new("partner@example.com", "secret")
}

#[tokio::test]
async fn signin_survives_restart_through_session_file() {
    let server = MockServer::start().await;
    mount_login(&server, "at-1", Some("rt-1"), "AFFILIATE").await;

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("affiliate-auth-storage.json");

    let first = common::store_for(&server.uri(), Arc::new(FileStorage::new(&file)));
    first.hydrate().await;
    first.signin(&credentials()).await.unwrap();
    assert!(file.exists());

    let second = common::store_for(&server.uri(), Arc::new(FileStorage::new(&file)));
    assert_eq!(second.route_access(ROLES), RouteAccess::Pending);
    second.hydrate().await;

    assert_eq!(second.route_access(ROLES), RouteAccess::Granted);
    assert_eq!(second.access_token().as_deref(), Some("at-1"));
    assert_eq!(second.refresh_token().as_deref(), Some("rt-1"));
    assert_eq!(second.user().unwrap().email, "partner@example.com");
}

#[cfg(unix)]
#[tokio::test]
async fn session_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let server = MockServer::start().await;
    mount_login(&server, "at-1", Some("rt-1"), "AFFILIATE").await;

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("nested").join("session.json");
    let store = common::store_for(&server.uri(), Arc::new(FileStorage::new(&file)));
    store.hydrate().await;
    store.signin(&credentials()).await.unwrap();

    let mode = std::fs::metadata(&file).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[tokio::test]
async fn non_affiliate_signin_is_rejected_without_saving() {
    let server = MockServer::start().await;
    mount_login(&server, "at-1", Some("rt-1"), "ORG_ADMIN").await;

    let storage = Arc::new(MemoryStorage::new());
    let store = common::store_for(&server.uri(), storage.clone());
    store.hydrate().await;

    let err = store.signin(&credentials()).await.unwrap_err();
    assert!(matches!(err, AuthError::AccessDenied(_)), "got: {err:?}");
    assert!(!store.is_authenticated());
    assert!(store.access_token().is_none());
    assert_eq!(storage.save_count(), 0);
}

#[tokio::test]
async fn invalid_credentials_leave_state_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(unauthorized("Invalid email or password"))
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let store = common::store_for(&server.uri(), storage.clone());
    store.hydrate().await;

    let err = store.signin(&credentials()).await.unwrap_err();
    assert_eq!(
        err,
        AuthError::InvalidCredentials("Invalid email or password".into())
    );
    assert!(!store.is_authenticated());
    assert_eq!(storage.save_count(), 0);
}

#[tokio::test]
async fn refresh_without_new_refresh_token_keeps_the_old_one() {
    let server = MockServer::start().await;
    mount_refresh(&server, "rt-1", refresh_ok("at-2", None), Duration::ZERO, 1).await;

    let store = common::store_for(&server.uri(), Arc::new(MemoryStorage::new()));
    store.hydrate().await;
    store.set_tokens("at-1".into(), Some("rt-1".into())).await;

    store.refresh_tokens().await.unwrap();
    assert_eq!(store.access_token().as_deref(), Some("at-2"));
    assert_eq!(store.refresh_token().as_deref(), Some("rt-1"));
    assert!(store.snapshot().expires_at.is_some());
}

#[tokio::test]
async fn failed_refresh_clears_persisted_tokens() {
    let server = MockServer::start().await;
    mount_login(&server, "at-1", Some("rt-1"), "AFFILIATE").await;
    mount_refresh(&server, "rt-1", unauthorized("expired"), Duration::ZERO, 1).await;

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("session.json");
    let store = common::store_for(&server.uri(), Arc::new(FileStorage::new(&file)));
    store.hydrate().await;
    store.signin(&credentials()).await.unwrap();

    let err = store.refresh_tokens().await.unwrap_err();
    assert_eq!(err, AuthError::InvalidRefreshToken("expired".into()));

    let persisted = FileStorage::new(&file).load().await.unwrap().unwrap();
    assert!(persisted.access_token.is_none());
    assert!(persisted.refresh_token.is_none());
    assert!(!persisted.is_authenticated);
}

#[tokio::test]
async fn refresh_server_error_is_a_network_failure() {
    let server = MockServer::start().await;
    mount_refresh(
        &server,
        "rt-1",
        ResponseTemplate::new(503),
        Duration::ZERO,
        1,
    )
    .await;

    let store = common::store_for(&server.uri(), Arc::new(MemoryStorage::new()));
    store.hydrate().await;
    store.set_tokens("at-1".into(), Some("rt-1".into())).await;

    let err = store.refresh_tokens().await.unwrap_err();
    assert!(matches!(err, AuthError::Network(_)), "got: {err:?}");
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn waiters_are_released_once_hydration_completes() {
    let store = Arc::new(common::store_for(
        "http://127.0.0.1:9",
        Arc::new(MemoryStorage::new()),
    ));
    assert!(!store.is_hydrated());
    assert_eq!(store.route_access(ROLES), RouteAccess::Pending);

    let waiter = {
        let store = store.clone();
        tokio::spawn(async move {
            store.wait_hydrated().await;
            store.route_access(ROLES)
        })
    };
    store.hydrate().await;

    let access = tokio::time::timeout(Duration::from_secs(2), waiter)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(access, RouteAccess::SignInRequired);
}

#[tokio::test]
async fn corrupt_session_file_hydrates_as_signed_out() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("session.json");
    std::fs::write(&file, "{ not json").unwrap();

    let store = common::store_for("http://127.0.0.1:9", Arc::new(FileStorage::new(&file)));
    store.hydrate().await;

    assert!(store.is_hydrated());
    assert!(!store.is_authenticated());
    assert_eq!(store.route_access(ROLES), RouteAccess::SignInRequired);
}
