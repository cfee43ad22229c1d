use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use tracing::warn;

use shared::rpc::deliver_serialized_json;
use shared::types::{HealthResponse, ServingStatus};

use crate::mailer::Mailer;
use crate::service::MailService;

pub async fn check<M: Mailer>(service: &MailService<M>) -> Result<Response<Full<Bytes>>> {
    let (status, code, errors) = match service.mailer().check().await {
        Ok(()) => (ServingStatus::Serving, StatusCode::OK, vec![]),
        Err(e) => {
            warn!("Mail provider check failed: {}", e);
            (
                ServingStatus::NotServing,
                StatusCode::SERVICE_UNAVAILABLE,
                vec![e.to_string()],
            )
        }
    };

    deliver_serialized_json(&HealthResponse { status, errors }, code)
}
