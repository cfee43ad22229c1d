//! Mail service.
//!
//! Issues confirmation and password-reset tokens, mails them out as links
//! and verifies them when the link comes back through the gateway.
pub mod handlers;
pub mod mailer;
pub mod service;

use std::sync::Arc;

use anyhow::Result;
use hyper::Request;
use hyper::body::Incoming;
use tokio::net::TcpListener;

use shared::token::EmailTokens;
use shared::types::{ConfigError, MailConfig};
use shared::{SystemClock, TokenCodec};

pub use mailer::{LogMailer, MailError, Mailer, OutgoingMail};
pub use service::{MailService, SendError};

/// Build the mail service from `[mail]` with the wall clock.
pub fn build_service<M: Mailer>(config: &MailConfig, mailer: M) -> Result<MailService<M>, ConfigError> {
    let secret = config.signing_secret()?;
    let tokens = EmailTokens::new(
        TokenCodec::new(secret.as_bytes()),
        config.lifetimes(),
        Arc::new(SystemClock),
    );
    Ok(MailService::new(tokens, mailer, config))
}

/// Serve the mail RPC surface on `listener` until accept fails.
pub async fn run<M>(listener: TcpListener, service: Arc<MailService<M>>, config: &MailConfig) -> Result<()>
where
    M: Mailer + 'static,
{
    shared::rpc::serve(listener, config.request_timeout(), move |req: Request<Incoming>| {
        let service = service.clone();
        async move { handlers::handle(req, service).await }
    })
    .await
}
