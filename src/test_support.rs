//! In-process stand-in for the shop backend.
//!
//! Each test starts its own server on an ephemeral port. The server records
//! every request it routes and answers the auth endpoints based on the
//! bearer token it receives.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::config::Config;
use crate::navigation::RecordingNavigator;
use crate::session::SessionHandle;
use crate::session_storage::in_memory::MemoryStore;
use crate::session_storage::{SessionStore, StoreError};
use crate::{SessionClient, TOKEN_KEY};

pub(crate) const ADMIN_TOKEN: &str = "admin-token";
pub(crate) const CUSTOMER_TOKEN: &str = "customer-token";
pub(crate) const EXPIRED_TOKEN: &str = "expired-token";
/// check-role blocks until [`MockBackend::release`] is called, then answers admin
pub(crate) const SLOW_TOKEN: &str = "slow-token";
/// check-role answers 500
pub(crate) const BROKEN_TOKEN: &str = "broken-token";
/// check-role answers 200 without a role
pub(crate) const GARBLED_TOKEN: &str = "garbled-token";
/// check-role blocks until [`MockBackend::release`] is called, then answers 500
pub(crate) const SLOW_BROKEN_TOKEN: &str = "slow-broken-token";

#[derive(Clone, Debug)]
pub(crate) struct Recorded {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    release: Arc<Notify>,
}

pub(crate) struct MockBackend {
    pub base_url: String,
    state: MockState,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = MockState::default();

        let app = Router::new()
            .route("/api/v1/auth/login", post(login))
            .route("/api/v1/auth/register", post(register))
            .route("/api/v1/auth/check-role", get(check_role))
            .route("/api/v1/orders", post(create_order))
            .route("/api/v1/products/{id}", put(acknowledge).delete(acknowledge))
            .route("/api/v1/profile", get(profile))
            .route("/api/v1/broken", get(broken))
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/api/v1"),
            state,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().clone()
    }

    /// Requests whose path, relative to `/api/v1`, equals `path`
    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        let full = format!("/api/v1{path}");
        self.requests()
            .into_iter()
            .filter(|r| r.path == full)
            .collect()
    }

    /// Lets one parked slow check-role request finish.
    pub fn release(&self) {
        self.state.release.notify_one();
    }

    pub async fn wait_for_request(&self, path: &str) {
        for _ in 0..400 {
            if !self.requests_to(path).is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no request to {path} arrived");
    }
}

/// A base URL nothing listens on.
pub(crate) async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api/v1")
}

pub(crate) fn client_for(
    base_url: &str,
    store: &MemoryStore,
    navigator: &RecordingNavigator,
) -> SessionClient {
    client_with_store(base_url, store.clone(), navigator)
}

pub(crate) fn client_with_store(
    base_url: &str,
    store: impl SessionStore + 'static,
    navigator: &RecordingNavigator,
) -> SessionClient {
    let config = Config::new(base_url).unwrap();
    SessionClient::builder(config, SessionHandle::new(store), navigator.clone())
        .build()
        .unwrap()
}

/// A memory store whose writes to one key always fail.
#[derive(Clone, Debug)]
pub(crate) struct FailingStore {
    pub entries: MemoryStore,
    fail_on: &'static str,
}

impl FailingStore {
    pub fn failing_on(key: &'static str) -> Self {
        Self {
            entries: MemoryStore::new(),
            fail_on: key,
        }
    }
}

impl SessionStore for FailingStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if key == self.fail_on {
            return Err(StoreError::Io {
                path: "session.json".into(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.entries.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key)
    }
}

pub(crate) fn store_with_token(token: &str) -> MemoryStore {
    let store = MemoryStore::new();
    store.set(TOKEN_KEY, token).unwrap();
    store
}

async fn record(State(state): State<MockState>, request: Request, next: Next) -> Response {
    state.requests.lock().push(Recorded {
        method: request.method().clone(),
        path: request.uri().path().to_string(),
        headers: request.headers().clone(),
    });
    next.run(request).await
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn check_role(State(state): State<MockState>, headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some(ADMIN_TOKEN) => Json(json!({"data": {"role": "admin"}})).into_response(),
        Some(CUSTOMER_TOKEN) => Json(json!({"data": {"role": "customer"}})).into_response(),
        Some(SLOW_TOKEN) => {
            state.release.notified().await;
            Json(json!({"data": {"role": "admin"}})).into_response()
        }
        Some(GARBLED_TOKEN) => Json(json!({"data": {}})).into_response(),
        Some(SLOW_BROKEN_TOKEN) => {
            state.release.notified().await;
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Some(BROKEN_TOKEN) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "database offline"})),
        )
            .into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid token"})),
        )
            .into_response(),
    }
}

async fn login(Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    match (username, password) {
        ("budi", "rahasia") => Json(json!({
            "success": true,
            "data": {"token": CUSTOMER_TOKEN, "user": {"id": 7, "role": "customer"}}
        }))
        .into_response(),
        ("ilham", "admin123") => Json(json!({
            "success": true,
            "data": {"token": ADMIN_TOKEN, "user": {"id": "1", "role": "admin"}}
        }))
        .into_response(),
        ("pending", _) => Json(json!({
            "success": false,
            "message": "Account awaiting approval"
        }))
        .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Invalid username or password"})),
        )
            .into_response(),
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["username"] == "flaky" {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    if body["username"] == "taken" {
        return (
            StatusCode::CONFLICT,
            Json(json!({"message": "Username already exists"})),
        )
            .into_response();
    }
    (
        StatusCode::CREATED,
        Json(json!({"success": true, "message": "registered"})),
    )
        .into_response()
}

async fn create_order() -> Response {
    (StatusCode::CREATED, Json(json!({"data": {"id": 99}}))).into_response()
}

async fn acknowledge() -> Response {
    Json(json!({"success": true})).into_response()
}

async fn profile(headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some(token) if token != EXPIRED_TOKEN => {
            Json(json!({"data": {"username": "budi"}})).into_response()
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Token expired"})),
        )
            .into_response(),
    }
}

async fn broken() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"message": "boom"})),
    )
        .into_response()
}
