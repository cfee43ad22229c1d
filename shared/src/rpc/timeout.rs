use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use tokio::time;
use tower::{Layer, Service};
use tracing::warn;

use super::json_response::{deliver_error_json, internal_error};

/// Per-request deadline for the session and mail services.
///
/// Wraps every handler in `serve`. A handler that is still waiting on the
/// revocation store or the mailer when `request_timeout_ms` runs out is
/// dropped, and the caller gets a 408 carrying the usual JSON error body
/// with code `REQUEST_TIMEOUT`. The gateway has its own, usually shorter,
/// deadline, so in practice this guards callers that talk to a service
/// directly.
#[derive(Clone, Debug)]
pub struct TimeoutLayer {
    duration: Duration,
}

impl TimeoutLayer {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            duration: self.duration,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TimeoutService<S> {
    inner: S,
    duration: Duration,
}

impl<S, ReqBody> Service<Request<ReqBody>> for TimeoutService<S>
where
    S: Service<Request<ReqBody>, Response = Response<Full<Bytes>>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = Response<Full<Bytes>>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let duration = self.duration;
        // Method and path only; token bodies never reach the log.
        let route = format!("{} {}", req.method(), req.uri().path());
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match time::timeout(duration, inner.call(req)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("{} abandoned after {:?}", route, duration);
                    Ok(deliver_error_json(
                        "REQUEST_TIMEOUT",
                        "The service did not answer in time",
                        StatusCode::REQUEST_TIMEOUT,
                    )
                    .unwrap_or_else(|_| internal_error()))
                }
            }
        })
    }
}
