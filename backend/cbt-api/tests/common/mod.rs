use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use cbt_exam_api::{
    config::Config,
    create_router,
    services::{remote_log::RemoteLogClient, seed, AppState},
    storage::LocalStore,
};

pub struct TestApp {
    pub router: Router,
    /// Shares the in-memory state with the app, so tests can inspect and
    /// craft persisted data directly.
    pub store: LocalStore,
    _data_dir: TempDir,
}

pub fn create_test_app() -> TestApp {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let data_dir = tempfile::tempdir().expect("Failed to create temp data dir");

    let config = Config {
        bind_addr: "127.0.0.1:0".to_string(),
        data_dir: data_dir.path().to_string_lossy().into_owned(),
        remote_log_url: None,
    };

    let store = LocalStore::open(data_dir.path()).expect("Failed to open test store");
    seed::ensure_seed_data(&store).expect("Failed to seed test store");

    let app_state = Arc::new(AppState {
        config,
        store: store.clone(),
        remote_log: RemoteLogClient::new(None),
    });

    TestApp {
        router: create_router(app_state),
        store,
        _data_dir: data_dir,
    }
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        json!({ "raw": String::from_utf8_lossy(&bytes).into_owned() })
    });
    (status, json)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        json!({ "raw": String::from_utf8_lossy(&bytes).into_owned() })
    });
    (status, json)
}

/// Registers a member and logs them in, returning the member id.
pub async fn register_and_login(app: &Router, name: &str, phone: &str) -> String {
    let (status, body) = post_json(
        app,
        "/api/v1/auth/register",
        json!({ "name": name, "phone": phone }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    let member_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "name": name, "phone": phone }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    member_id
}
