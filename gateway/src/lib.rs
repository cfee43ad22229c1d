//! Calling side of the token services.
//!
//! Request handlers in the gateway go through [`TokenClient`] to turn a
//! session cookie into an [`Identity`] or an email link into an
//! [`EmailAction`]. They never see tokens' claims.
pub mod api;
pub mod client;
pub mod cookies;
pub mod rpc;

pub use api::{HttpMailApi, HttpSessionApi, MailApi, SessionApi};
pub use client::{EmailAction, Identity, SessionResolution, TokenClient};
pub use cookies::{clear_cookie, get_cookie, session_cookie, token_from_query};
pub use rpc::{RpcClient, RpcError};
