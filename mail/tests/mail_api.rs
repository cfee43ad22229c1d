use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode};
use serde_json::{Value, json};

use mail::handlers::handle;
use mail::{MailError, MailService, Mailer, OutgoingMail};
use shared::token::{EmailLifetimes, EmailTokens};
use shared::types::MailConfig;
use shared::{ManualClock, TokenCodec};

const SECRET: &[u8] = b"integration-email-secret-0123456";
const START: u64 = 1_700_000_000;

/// Keeps every message instead of delivering it.
#[derive(Debug, Clone, Default)]
struct RecordingMailer {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
}

impl RecordingMailer {
    fn last(&self) -> OutgoingMail {
        self.sent.lock().unwrap().last().cloned().expect("no mail sent")
    }
}

impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<u16, MailError> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(202)
    }

    async fn check(&self) -> Result<(), MailError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct BrokenMailer;

impl Mailer for BrokenMailer {
    async fn send(&self, _mail: &OutgoingMail) -> Result<u16, MailError> {
        Err(MailError::Delivery("provider rejected api key".into()))
    }

    async fn check(&self) -> Result<(), MailError> {
        Err(MailError::Delivery("provider unreachable".into()))
    }
}

fn service<M: Mailer>(mailer: M) -> (Arc<MailService<M>>, ManualClock) {
    let clock = ManualClock::new(START);
    let tokens = EmailTokens::new(
        TokenCodec::new(SECRET),
        EmailLifetimes::default(),
        Arc::new(clock.clone()),
    );
    let config = MailConfig {
        confirm_url: "https://blog.example/confirm?token={token}".into(),
        reset_url: "https://blog.example/reset?token={token}".into(),
        ..MailConfig::default()
    };
    (Arc::new(MailService::new(tokens, mailer, &config)), clock)
}

fn request(method: Method, path: &str, body: Option<Value>) -> Request<Full<Bytes>> {
    let bytes = body.map(|b| Bytes::from(b.to_string())).unwrap_or_default();
    Request::builder()
        .method(method)
        .uri(path)
        .body(Full::new(bytes))
        .unwrap()
}

async fn call<M: Mailer>(
    service: &Arc<MailService<M>>,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let resp = handle(request(method, path, body), service.clone())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn token_from_link(mail: &OutgoingMail) -> String {
    let line = mail
        .body
        .lines()
        .find(|l| l.contains("token="))
        .expect("link in body");
    line.split("token=").nth(1).unwrap().trim().to_string()
}

fn ada() -> Value {
    json!({"id": 7, "email": "a@b.com", "name": "Ada"})
}

#[tokio::test]
async fn confirmation_mail_round_trip() {
    let mailer = RecordingMailer::default();
    let (svc, _) = service(mailer.clone());

    let (status, body) = call(&svc, Method::POST, "/mail/confirmation", Some(ada())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "OK", "code": 202}));

    let sent = mailer.last();
    assert_eq!(sent.to_email, "a@b.com");
    assert!(sent.body.contains("https://blog.example/confirm?token="));

    let token = token_from_link(&sent);
    let (status, body) = call(
        &svc,
        Method::POST,
        "/mail/verify",
        Some(json!({"token": token, "purpose": "confirmation"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"email": "a@b.com", "id": 7}));
}

#[tokio::test]
async fn reset_mail_carries_a_reset_token() {
    let mailer = RecordingMailer::default();
    let (svc, _) = service(mailer.clone());

    call(&svc, Method::POST, "/mail/password-reset", Some(ada())).await;
    let sent = mailer.last();
    assert!(sent.body.contains("https://blog.example/reset?token="));
    let token = token_from_link(&sent);

    let (status, _) = call(
        &svc,
        Method::POST,
        "/mail/verify",
        Some(json!({"token": token, "purpose": "password_reset"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &svc,
        Method::POST,
        "/mail/verify",
        Some(json!({"token": token, "purpose": "confirmation"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn reset_link_expires_after_an_hour() {
    let mailer = RecordingMailer::default();
    let (svc, clock) = service(mailer.clone());

    call(&svc, Method::POST, "/mail/password-reset", Some(ada())).await;
    let token = token_from_link(&mailer.last());
    let verify = json!({"token": token, "purpose": "password_reset"});

    clock.set(START + 59 * 60);
    let (status, _) = call(&svc, Method::POST, "/mail/verify", Some(verify.clone())).await;
    assert_eq!(status, StatusCode::OK);

    clock.set(START + 61 * 60);
    let (status, _) = call(&svc, Method::POST, "/mail/verify", Some(verify)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn link_can_be_followed_more_than_once() {
    let mailer = RecordingMailer::default();
    let (svc, _) = service(mailer.clone());

    call(&svc, Method::POST, "/mail/confirmation", Some(ada())).await;
    let verify = json!({"token": token_from_link(&mailer.last()), "purpose": "confirmation"});
    for _ in 0..2 {
        let (status, _) = call(&svc, Method::POST, "/mail/verify", Some(verify.clone())).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn wrong_purpose_and_garbage_look_the_same() {
    let mailer = RecordingMailer::default();
    let (svc, _) = service(mailer.clone());

    call(&svc, Method::POST, "/mail/confirmation", Some(ada())).await;
    let token = token_from_link(&mailer.last());

    let mismatch = call(
        &svc,
        Method::POST,
        "/mail/verify",
        Some(json!({"token": token, "purpose": "password_reset"})),
    )
    .await;
    let garbage = call(
        &svc,
        Method::POST,
        "/mail/verify",
        Some(json!({"token": "garbage", "purpose": "password_reset"})),
    )
    .await;
    assert_eq!(mismatch, garbage);
}

#[tokio::test]
async fn delivery_failure_is_bad_gateway() {
    let (svc, _) = service(BrokenMailer);
    let (status, body) = call(&svc, Method::POST, "/mail/confirmation", Some(ada())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "MAIL_DELIVERY_FAILED");
    assert!(!body.to_string().contains("api key"));
}

#[tokio::test]
async fn health_follows_the_mailer() {
    let (healthy, _) = service(RecordingMailer::default());
    let (status, body) = call(&healthy, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "SERVING");

    let (broken, _) = service(BrokenMailer);
    let (status, body) = call(&broken, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "NOT_SERVING");
}

#[tokio::test]
async fn bad_bodies_and_routes() {
    let (svc, _) = service(RecordingMailer::default());

    let (status, _) = call(
        &svc,
        Method::POST,
        "/mail/verify",
        Some(json!({"token": "t", "purpose": "delete_account"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &svc,
        Method::POST,
        "/mail/confirmation",
        Some(json!({"id": 1, "email": " ", "name": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&svc, Method::GET, "/mail/verify", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn confirmation_body_mentions_its_window() {
    let mailer = RecordingMailer::default();
    let (svc, _) = service(mailer.clone());
    call(&svc, Method::POST, "/mail/confirmation", Some(ada())).await;
    assert!(mailer.last().body.contains("72 hours"));
}
