//! Shared fixtures for the mock API tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use nextstep_core::{ApiUrl, CredentialStore, MemoryCredentialStore};
use nextstep_http::{AuthClient, ClientConfig};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Route client logs to the test harness. Set `RUST_LOG` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Client configuration pointing at a mock server.
pub fn config_for(server: &MockServer) -> ClientConfig {
    let url = ApiUrl::new(format!("http://127.0.0.1:{}/api", server.address().port())).unwrap();
    ClientConfig::new(url).with_timeout(Duration::from_secs(5))
}

/// A client with an in-memory store, plus the store for inspection.
pub fn memory_client(server: &MockServer) -> (AuthClient, Arc<MemoryCredentialStore>) {
    init_tracing();
    let store = Arc::new(MemoryCredentialStore::new());
    let client = AuthClient::new(config_for(server), store.clone()).unwrap();
    (client, store)
}

/// The stored access token, if any.
pub fn stored_token(store: &dyn CredentialStore) -> Option<String> {
    store
        .get()
        .unwrap()
        .map(|s| s.credential.access_token().as_str().to_string())
}

pub fn user(id: i64, username: &str) -> Value {
    json!({
        "id": id,
        "email": format!("{username}@nextstep.dev"),
        "username": username,
        "role": "USER",
        "createdAt": "2024-03-01T09:30:00",
        "updatedAt": "2024-03-01T09:30:00.125"
    })
}

pub fn ok(message: &str, data: Value) -> Value {
    json!({ "success": true, "message": message, "data": data })
}

pub fn failure(message: &str, code: &str) -> Value {
    json!({ "success": false, "message": message, "data": null, "errorCode": code })
}

pub fn auth_body(token: &str, user: Value) -> Value {
    ok(
        "Login successful",
        json!({ "token": token, "refreshToken": format!("refresh-{token}"), "user": user }),
    )
}

/// Answer every login with `token` for user 1.
pub async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body(token, user(1, "alice"))))
        .mount(server)
        .await;
}
