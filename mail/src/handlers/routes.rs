use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use tracing::{debug, error};

use shared::EmailPurpose;
use shared::rpc::{deliver_error_json, internal_error};

use crate::mailer::Mailer;
use crate::service::MailService;

use super::{health, mail};

pub async fn handle<B, M>(
    req: Request<B>,
    service: Arc<MailService<M>>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    M: Mailer,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!("{} {}", method, path);

    let result = match (&method, path.as_str()) {
        (&Method::POST, "/mail/verify") => mail::verify(req, &service).await,
        (&Method::POST, "/mail/confirmation") => {
            mail::send(req, &service, EmailPurpose::Confirmation).await
        }
        (&Method::POST, "/mail/password-reset") => {
            mail::send(req, &service, EmailPurpose::PasswordReset).await
        }
        (&Method::GET, "/health") => health::check(&service).await,
        _ => deliver_error_json("NOT_FOUND", "No such route", StatusCode::NOT_FOUND),
    };

    Ok(result.unwrap_or_else(|e| {
        error!("{} {} failed: {:#}", method, path, e);
        internal_error()
    }))
}
