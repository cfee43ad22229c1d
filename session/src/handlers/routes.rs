use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use tracing::{debug, error};

use shared::rpc::{deliver_error_json, internal_error};

use crate::session::SessionStore;
use crate::store::RevocationStore;

use super::{health, session};

/// Entry point for every request the session service receives.
///
/// Generic over the body so tests can drive it with an in-memory body
/// instead of a live connection.
pub async fn handle<B, S>(
    req: Request<B>,
    sessions: Arc<SessionStore<S>>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    S: RevocationStore,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!("{} {}", method, path);

    let result = match (&method, path.as_str()) {
        (&Method::POST, "/session/create") => session::create(req, &sessions).await,
        (&Method::POST, "/session/verify") => session::verify(req, &sessions).await,
        (&Method::POST, "/session/delete") => session::delete(req, &sessions).await,
        (&Method::GET, "/health") => health::check(&sessions).await,
        _ => deliver_error_json("NOT_FOUND", "No such route", StatusCode::NOT_FOUND),
    };

    Ok(result.unwrap_or_else(|e| {
        error!("{} {} failed: {:#}", method, path, e);
        internal_error()
    }))
}
