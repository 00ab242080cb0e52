//! Session contract: login, restore and rejection

use std::sync::Arc;

use chrono::Duration;
use loan_desk::{
    models::Role,
    schemas::LoginForm,
    session::{AuthContext, FileTokenStore, TokenStore},
    AppError, ErrorCode,
};

use crate::support::{spawn, Backend, PASSWORD};

#[tokio::test]
async fn test_login_then_restore_from_file() {
    let backend = spawn(Backend::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileTokenStore::new(dir.path().join("token.json"), Duration::hours(24)));

    let (services, bearer) = backend.client();
    let mut session = AuthContext::new(Arc::clone(&services.auth), store.clone(), bearer);
    session.init().await.unwrap();
    assert!(!session.is_authenticated());

    let user = session.login(&LoginForm::new("itstaff", PASSWORD)).await.unwrap();
    assert_eq!(user.role, Role::It);
    assert_eq!(store.load().unwrap().as_deref(), Some("token-itstaff"));

    // A fresh process picks the session up from the stored token
    let (services, bearer) = backend.client();
    let mut restored = AuthContext::new(Arc::clone(&services.auth), store, bearer.clone());
    restored.init().await.unwrap();
    assert!(restored.is_authenticated());
    assert_eq!(restored.role(), Some(&Role::It));
    assert_eq!(bearer.get().await.as_deref(), Some("token-itstaff"));
}

#[tokio::test]
async fn test_rejected_token_is_cleared() {
    let backend = spawn(Backend::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileTokenStore::new(dir.path().join("token.json"), Duration::hours(24)));
    store.save("token-revoked").unwrap();

    let (services, bearer) = backend.client();
    let mut session = AuthContext::new(Arc::clone(&services.auth), store.clone(), bearer.clone());
    session.init().await.unwrap();

    assert!(!session.is_loading());
    assert!(!session.is_authenticated());
    assert_eq!(store.load().unwrap(), None);
    assert!(!bearer.is_set().await);
}

#[tokio::test]
async fn test_wrong_password_is_normalized() {
    let backend = spawn(Backend::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileTokenStore::new(dir.path().join("token.json"), Duration::hours(24)));

    let (services, bearer) = backend.client();
    let mut session = AuthContext::new(Arc::clone(&services.auth), store.clone(), bearer);

    match session.login(&LoginForm::new("admin", "not-the-password")).await {
        Err(AppError::Api(err)) => {
            assert_eq!(err.code, ErrorCode::Unauthorized);
            assert_eq!(err.message, "Invalid username or password");
        }
        other => panic!("expected an API error, got {:?}", other.map(|u| u.username.clone())),
    }
    assert!(!session.is_authenticated());
    assert_eq!(store.load().unwrap(), None);
}
