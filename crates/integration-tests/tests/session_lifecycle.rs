//! Session lifecycle against the mock storefront API.
//!
//! Exercises the real `HttpGateway` and `FileCredentialStore`: register,
//! login, restore-after-restart, revoked tokens, and logout under a dead
//! server.

use std::sync::Arc;

use quitanda_client::config::ClientConfig;
use quitanda_client::gateway::{ApiError, AuthFailure, HttpGateway};
use quitanda_client::session::storage::FileCredentialStore;
use quitanda_client::session::{RegisterProfile, SessionError, SessionStore};
use quitanda_integration_tests::{MockApi, init_tracing};

fn profile(email: &str) -> RegisterProfile {
    RegisterProfile {
        name: "Maria Souza".to_string(),
        email: email.to_string(),
        password: "super-secreta".to_string(),
        password_confirmation: "super-secreta".to_string(),
        phone: Some("11 99999-0000".to_string()),
    }
}

fn session_for(config: &ClientConfig) -> SessionStore {
    let gateway = Arc::new(HttpGateway::new(config));
    let storage = Arc::new(FileCredentialStore::new(config.credentials_path.clone()));
    SessionStore::new(gateway, storage)
}

#[tokio::test]
async fn test_register_login_logout_lifecycle() {
    init_tracing();
    let api = MockApi::start().await;
    let config = api.client_config("lifecycle");
    let session = session_for(&config);

    session.register(profile("maria@example.com")).await.unwrap();
    assert!(session.is_authenticated());
    assert_eq!(session.user().unwrap().name, "Maria Souza");

    session.logout().await;
    assert!(!session.is_authenticated());
    assert!(session.cached_user().is_none());

    // The account survives; a fresh login works.
    session
        .login("maria@example.com", "super-secreta")
        .await
        .unwrap();
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_duplicate_registration_is_classified() {
    init_tracing();
    let api = MockApi::start().await;
    let config = api.client_config("duplicate");
    let session = session_for(&config);

    session.register(profile("dupe@example.com")).await.unwrap();
    session.logout().await;

    let err = session.register(profile("dupe@example.com")).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Api(ApiError::Auth(AuthFailure::EmailAlreadyRegistered))
    ));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_wrong_password_is_classified() {
    init_tracing();
    let api = MockApi::start().await;
    let config = api.client_config("wrong-password");
    let session = session_for(&config);

    session.register(profile("ana@example.com")).await.unwrap();
    session.logout().await;

    let err = session
        .login("ana@example.com", "senha-errada-123")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Api(ApiError::Auth(AuthFailure::InvalidCredentials))
    ));
}

#[tokio::test]
async fn test_restore_after_restart() {
    init_tracing();
    let api = MockApi::start().await;
    let config = api.client_config("restore");

    let first = session_for(&config);
    first.register(profile("joao@example.com")).await.unwrap();
    drop(first);

    // A fresh store over the same credentials file models a restart. The
    // persisted user is available for display before restore completes.
    let second = session_for(&config);
    assert!(!second.is_authenticated());
    assert_eq!(second.cached_user().unwrap().name, "Maria Souza");

    assert!(second.restore().await);
    assert!(second.is_authenticated());
    assert_eq!(
        second.user().unwrap().email.as_str(),
        "joao@example.com"
    );

    // restore is idempotent.
    assert!(second.restore().await);
}

#[tokio::test]
async fn test_restore_with_revoked_token_discards_credentials() {
    init_tracing();
    let api = MockApi::start().await;
    let config = api.client_config("revoked");

    let first = session_for(&config);
    first.register(profile("clara@example.com")).await.unwrap();
    drop(first);

    api.state.revoke_all_tokens();

    let second = session_for(&config);
    assert!(!second.restore().await);
    assert!(!second.is_authenticated());
    // The stale credentials were discarded, so nothing is cached either.
    assert!(second.cached_user().is_none());
    assert!(!config.credentials_path.exists());
}

#[tokio::test]
async fn test_logout_clears_locally_when_server_is_down() {
    init_tracing();
    let api = MockApi::start().await;
    let config = api.client_config("dead-server");
    let session = session_for(&config);

    session.register(profile("rui@example.com")).await.unwrap();
    assert!(session.is_authenticated());

    // Kill the server: the remote logout becomes a connection error, which
    // must not block the local logout.
    api.shut_down();
    session.logout().await;

    assert!(!session.is_authenticated());
    assert!(session.token().is_none());
    assert!(!config.credentials_path.exists());
}
