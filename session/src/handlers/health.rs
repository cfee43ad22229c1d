use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use tracing::warn;

use shared::rpc::deliver_serialized_json;
use shared::types::{HealthResponse, ServingStatus};

use crate::session::SessionStore;
use crate::store::RevocationStore;

/// Serving only while the revocation store answers a ping.
pub async fn check<S: RevocationStore>(sessions: &SessionStore<S>) -> Result<Response<Full<Bytes>>> {
    match sessions.ping().await {
        Ok(()) => deliver_serialized_json(
            &HealthResponse {
                status: ServingStatus::Serving,
                errors: vec![],
            },
            StatusCode::OK,
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            deliver_serialized_json(
                &HealthResponse {
                    status: ServingStatus::NotServing,
                    errors: vec![format!("revocation store: {}", e)],
                },
                StatusCode::SERVICE_UNAVAILABLE,
            )
        }
    }
}
