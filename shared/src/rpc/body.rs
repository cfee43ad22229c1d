use anyhow::{Context, Result, anyhow};
use http_body_util::{BodyExt, Limited};
use hyper::body::Body;
use serde::de::DeserializeOwned;

/// Largest request body either service accepts. Every RPC payload is a
/// token plus a handful of small fields.
pub const MAX_BODY_BYTES: usize = 16 * 1024;

/// Collect a request body (bounded by [`MAX_BODY_BYTES`]) and parse it.
pub async fn read_json<B, T>(body: B) -> Result<T>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    T: DeserializeOwned,
{
    let bytes = Limited::new(body, MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| anyhow!("Failed to read request body: {}", e))?
        .to_bytes();

    serde_json::from_slice(&bytes).context("Malformed JSON body")
}
