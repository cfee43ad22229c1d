use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use tracing::{debug, warn};

use shared::rpc::{deliver_error_json, deliver_serialized_json, deliver_token_error, read_json};
use shared::types::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, VerifyRequest, VerifyResponse,
};

use crate::session::SessionStore;
use crate::store::RevocationStore;

fn bad_request(err: anyhow::Error) -> Result<Response<Full<Bytes>>> {
    warn!("Rejected request body: {:#}", err);
    deliver_error_json(
        "BAD_REQUEST",
        "Request body is not valid JSON for this call",
        StatusCode::BAD_REQUEST,
    )
}

pub async fn create<B, S>(req: Request<B>, sessions: &SessionStore<S>) -> Result<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    S: RevocationStore,
{
    let body: CreateRequest = match read_json(req.into_body()).await {
        Ok(body) => body,
        Err(e) => return bad_request(e),
    };

    match sessions.create(body.id, body.role).await {
        Ok(token) => deliver_serialized_json(&CreateResponse { token }, StatusCode::OK),
        Err(e) => deliver_token_error(&e),
    }
}

/// An unusable token is a normal answer here, not an error: `ok: false`.
pub async fn verify<B, S>(req: Request<B>, sessions: &SessionStore<S>) -> Result<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    S: RevocationStore,
{
    let body: VerifyRequest = match read_json(req.into_body()).await {
        Ok(body) => body,
        Err(e) => return bad_request(e),
    };

    match sessions.verify(&body.token).await {
        Ok((id, role)) => deliver_serialized_json(&VerifyResponse::accepted(id, role), StatusCode::OK),
        Err(e) if e.is_unauthenticated() => {
            debug!("Session rejected: {}", e.detail());
            deliver_serialized_json(&VerifyResponse::rejected(), StatusCode::OK)
        }
        Err(e) => deliver_token_error(&e),
    }
}

pub async fn delete<B, S>(req: Request<B>, sessions: &SessionStore<S>) -> Result<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    S: RevocationStore,
{
    let body: DeleteRequest = match read_json(req.into_body()).await {
        Ok(body) => body,
        Err(e) => return bad_request(e),
    };

    match sessions.delete(&body.token).await {
        Ok(()) => deliver_serialized_json(&DeleteResponse {}, StatusCode::OK),
        Err(e) => deliver_token_error(&e),
    }
}
