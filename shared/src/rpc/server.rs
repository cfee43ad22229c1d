use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::{Request, Response};
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing::{debug, info, warn};

use super::timeout::TimeoutLayer;

/// Accept connections on `listener` forever, serving each one on its own
/// task with `handler` behind a per-request timeout.
///
/// Only returns when `accept` itself fails.
pub async fn serve<H, Fut>(listener: TcpListener, request_timeout: Duration, handler: H) -> Result<()>
where
    H: Fn(Request<Incoming>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<Full<Bytes>>, Infallible>> + Send + 'static,
{
    let local = listener
        .local_addr()
        .context("Failed to read listener address")?;
    info!("Listening on http://{}", local);

    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .context(format!("Failed to accept on {}", local))?;
        debug!("Accepted connection from {}", peer);

        let io = TokioIo::new(stream);
        let service = ServiceBuilder::new()
            .layer(TimeoutLayer::new(request_timeout))
            .service(tower::service_fn(handler.clone()));
        let service = TowerToHyperService::new(service);

        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .timer(TokioTimer::new())
                .serve_connection(io, service)
                .await
            {
                warn!("Error serving connection from {}: {:?}", peer, err);
            }
        });
    }
}
