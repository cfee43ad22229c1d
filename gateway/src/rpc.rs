use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use shared::types::ErrorResponse;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("call to {0} timed out")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status.
    #[error("service replied {status} {code}")]
    Status { status: u16, code: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("failed to build request: {0}")]
    Request(String),
}

impl RpcError {
    /// The service said the token is no good, as opposed to being unreachable.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }
}

/// JSON-over-HTTP client for one token service. Every call, including
/// reading the response body, is bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: Client<HttpConnector, Full<Bytes>>,
    base: String,
    timeout: Duration,
}

impl RpcClient {
    pub fn new(base: impl Into<String>, timeout: Duration) -> Self {
        let base: String = base.into();
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            base: base.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, RpcError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let json = serde_json::to_vec(body).map_err(|e| RpcError::Request(e.to_string()))?;
        let url = format!("{}{}", self.base, path);
        let request = Request::builder()
            .method(Method::POST)
            .uri(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(json)))
            .map_err(|e| RpcError::Request(e.to_string()))?;

        self.bounded(url, request).await
    }

    pub async fn get<Resp: DeserializeOwned>(&self, path: &str) -> Result<Resp, RpcError> {
        let url = format!("{}{}", self.base, path);
        let request = Request::builder()
            .method(Method::GET)
            .uri(&url)
            .body(Full::new(Bytes::new()))
            .map_err(|e| RpcError::Request(e.to_string()))?;

        self.bounded(url, request).await
    }

    async fn bounded<Resp: DeserializeOwned>(
        &self,
        url: String,
        request: Request<Full<Bytes>>,
    ) -> Result<Resp, RpcError> {
        match tokio::time::timeout(self.timeout, self.exchange(request)).await {
            Ok(result) => result,
            Err(_) => Err(RpcError::Timeout(url)),
        }
    }

    async fn exchange<Resp: DeserializeOwned>(
        &self,
        request: Request<Full<Bytes>>,
    ) -> Result<Resp, RpcError> {
        debug!("{} {}", request.method(), request.uri());
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?
            .to_bytes();

        if !status.is_success() {
            let code = serde_json::from_slice::<ErrorResponse>(&body)
                .map(|e| e.code)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("UNKNOWN").to_string());
            return Err(RpcError::Status {
                status: status.as_u16(),
                code,
            });
        }

        serde_json::from_slice(&body).map_err(|e| RpcError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slash() {
        let client = RpcClient::new("http://127.0.0.1:8081/", Duration::from_secs(1));
        assert_eq!(client.base, "http://127.0.0.1:8081");
    }

    #[test]
    fn only_401_counts_as_rejection() {
        assert!(
            RpcError::Status {
                status: 401,
                code: "INVALID_TOKEN".into()
            }
            .is_rejection()
        );
        assert!(
            !RpcError::Status {
                status: 503,
                code: "STORE_UNAVAILABLE".into()
            }
            .is_rejection()
        );
        assert!(!RpcError::Timeout("x".into()).is_rejection());
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = RpcClient::new(format!("http://{}", addr), Duration::from_secs(1));
        let err = client.get::<serde_json::Value>("/health").await.unwrap_err();
        assert!(matches!(err, RpcError::Transport(_)));
    }
}
