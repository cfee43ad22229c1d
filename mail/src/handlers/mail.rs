use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use tracing::{debug, warn};

use shared::EmailPurpose;
use shared::rpc::{deliver_error_json, deliver_serialized_json, deliver_token_error, read_json};
use shared::types::{EmailVerifyRequest, EmailVerifyResponse, MailRequest, MailResponse};

use crate::mailer::Mailer;
use crate::service::{MailService, SendError};

fn bad_request(err: anyhow::Error) -> Result<Response<Full<Bytes>>> {
    warn!("Rejected request body: {:#}", err);
    deliver_error_json(
        "BAD_REQUEST",
        "Request body is not valid JSON for this call",
        StatusCode::BAD_REQUEST,
    )
}

pub async fn verify<B, M>(req: Request<B>, service: &MailService<M>) -> Result<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    M: Mailer,
{
    let body: EmailVerifyRequest = match read_json(req.into_body()).await {
        Ok(body) => body,
        Err(e) => return bad_request(e),
    };

    match service.verify(&body.token, body.purpose) {
        Ok((email, id)) => {
            debug!(identity = id, purpose = %body.purpose, "Email token verified");
            deliver_serialized_json(&EmailVerifyResponse { email, id }, StatusCode::OK)
        }
        Err(e) => {
            debug!("Email token rejected: {}", e.detail());
            deliver_token_error(&e)
        }
    }
}

pub async fn send<B, M>(
    req: Request<B>,
    service: &MailService<M>,
    purpose: EmailPurpose,
) -> Result<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    M: Mailer,
{
    let body: MailRequest = match read_json(req.into_body()).await {
        Ok(body) => body,
        Err(e) => return bad_request(e),
    };

    if body.email.trim().is_empty() {
        return deliver_error_json(
            "BAD_REQUEST",
            "Recipient address is required",
            StatusCode::BAD_REQUEST,
        );
    }

    match service.send(purpose, &body).await {
        Ok(code) => deliver_serialized_json(
            &MailResponse {
                status: "OK".to_string(),
                code,
            },
            StatusCode::OK,
        ),
        Err(SendError::Token(e)) => deliver_token_error(&e),
        Err(SendError::Delivery(_)) => deliver_error_json(
            "MAIL_DELIVERY_FAILED",
            "The message could not be delivered",
            StatusCode::BAD_GATEWAY,
        ),
    }
}
