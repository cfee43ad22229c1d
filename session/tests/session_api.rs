use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, Response, StatusCode};
use proptest::prelude::*;
use serde_json::{Value, json};

use session::handlers::handle;
use session::{MemoryStore, RevocationStore, SessionStore, StoreError};
use shared::{Clock, ManualClock, Role, TokenCodec};

const SECRET: &[u8] = b"integration-session-secret-01234";
const START: u64 = 1_700_000_000;

fn memory_sessions() -> (Arc<SessionStore<MemoryStore>>, ManualClock) {
    let clock = ManualClock::new(START);
    let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
    let sessions = SessionStore::new(
        TokenCodec::new(SECRET),
        MemoryStore::with_clock(shared_clock.clone()),
        Duration::from_secs(3_600),
        shared_clock,
    );
    (Arc::new(sessions), clock)
}

/// A backend whose every call fails, standing in for an unreachable redis.
#[derive(Debug)]
struct DownStore;

impl RevocationStore for DownStore {
    async fn register(&self, _key: &str, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn contains(&self, _key: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

fn down_sessions() -> Arc<SessionStore<DownStore>> {
    Arc::new(SessionStore::new(
        TokenCodec::new(SECRET),
        DownStore,
        Duration::from_secs(3_600),
        Arc::new(ManualClock::new(START)),
    ))
}

fn post(path: &str, body: Value) -> Request<Full<Bytes>> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

fn get(path: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

async fn read(resp: Response<Full<Bytes>>) -> (StatusCode, Value) {
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn call<S: RevocationStore>(
    sessions: &Arc<SessionStore<S>>,
    req: Request<Full<Bytes>>,
) -> (StatusCode, Value) {
    read(handle(req, sessions.clone()).await.unwrap()).await
}

async fn create<S: RevocationStore>(sessions: &Arc<SessionStore<S>>, id: u32, role: &str) -> String {
    let (status, body) = call(sessions, post("/session/create", json!({"id": id, "role": role}))).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn login_verify_logout_flow() {
    let (sessions, _) = memory_sessions();
    let token = create(&sessions, 42, "moderator").await;

    let (status, body) = call(&sessions, post("/session/verify", json!({"token": token}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "id": 42, "role": "moderator"}));

    let (status, body) = call(&sessions, post("/session/delete", json!({"token": token}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, body) = call(&sessions, post("/session/verify", json!({"token": token}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": false}));
}

#[tokio::test]
async fn garbage_token_verifies_as_not_ok() {
    let (sessions, _) = memory_sessions();
    let (status, body) = call(&sessions, post("/session/verify", json!({"token": "garbage"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": false}));
}

#[tokio::test]
async fn expired_session_verifies_as_not_ok() {
    let (sessions, clock) = memory_sessions();
    let token = create(&sessions, 7, "user").await;
    clock.advance(Duration::from_secs(3_601));

    let (_, body) = call(&sessions, post("/session/verify", json!({"token": token}))).await;
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn delete_of_garbage_is_invalid_token() {
    let (sessions, _) = memory_sessions();
    let (status, body) = call(&sessions, post("/session/delete", json!({"token": "garbage"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn delete_is_idempotent_over_the_wire() {
    let (sessions, _) = memory_sessions();
    let token = create(&sessions, 1, "user").await;
    for _ in 0..2 {
        let (status, _) = call(&sessions, post("/session/delete", json!({"token": token}))).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let (sessions, _) = memory_sessions();

    let (status, body) = call(&sessions, post("/session/create", json!({"id": 1, "role": "admin"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, _) = call(&sessions, post("/session/verify", json!({"tok": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (sessions, _) = memory_sessions();
    let (status, body) = call(&sessions, get("/session/list")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn health_reports_serving_with_memory_store() {
    let (sessions, _) = memory_sessions();
    let (status, body) = call(&sessions, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "SERVING"}));
}

#[tokio::test]
async fn store_outage_is_reported_not_hidden() {
    let sessions = down_sessions();

    let (status, body) = call(&sessions, post("/session/create", json!({"id": 1, "role": "user"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "STORE_UNAVAILABLE");
    assert!(!body.to_string().contains("refused"));

    let (status, body) = call(&sessions, get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "NOT_SERVING");
}

#[tokio::test]
async fn verify_during_outage_is_unavailable_not_rejected() {
    // Mint a well-signed token with a working store, then verify against a dead one.
    let (healthy, _) = memory_sessions();
    let token = create(&healthy, 3, "user").await;

    let sessions = down_sessions();
    let (status, body) = call(&sessions, post("/session/verify", json!({"token": token}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "STORE_UNAVAILABLE");
}

fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::User), Just(Role::Moderator)]
}

proptest! {
    #[test]
    fn verify_returns_what_create_was_given(id in any::<u32>(), role in role_strategy()) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async {
            let (sessions, _) = memory_sessions();
            let token = sessions.create(id, role).await.unwrap();
            assert_eq!(sessions.verify(&token).await.unwrap(), (id, role));
        });
    }
}
