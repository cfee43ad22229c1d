use thiserror::Error;
use tracing::{debug, info, warn};

use shared::token::{EmailTokens, fingerprint};
use shared::types::{MailConfig, MailRequest};
use shared::{EmailPurpose, TokenError};

use crate::mailer::{self, MailError, Mailer, OutgoingMail};

#[derive(Error, Debug)]
pub enum SendError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Delivery(#[from] MailError),
}

/// Issues purpose-bound email tokens, mails them out as links and verifies
/// them when the link is followed.
#[derive(Debug)]
pub struct MailService<M> {
    tokens: EmailTokens,
    mailer: M,
    confirm_url: String,
    reset_url: String,
    sender_name: String,
    sender_email: String,
}

impl<M: Mailer> MailService<M> {
    pub fn new(tokens: EmailTokens, mailer: M, config: &MailConfig) -> Self {
        Self {
            tokens,
            mailer,
            confirm_url: config.confirm_url.clone(),
            reset_url: config.reset_url.clone(),
            sender_name: config.sender_name.clone(),
            sender_email: config.sender_email.clone(),
        }
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    /// `(email, identity)` of a token that is valid for `purpose`.
    pub fn verify(&self, token: &str, purpose: EmailPurpose) -> Result<(String, u32), TokenError> {
        self.tokens.verify(token, purpose)
    }

    /// Mint a token for `purpose` and mail the link to the recipient.
    /// Returns the provider's status code.
    pub async fn send(&self, purpose: EmailPurpose, req: &MailRequest) -> Result<u16, SendError> {
        let token = self.tokens.issue(req.id, &req.email, purpose)?;

        let template = match purpose {
            EmailPurpose::Confirmation => &self.confirm_url,
            EmailPurpose::PasswordReset => &self.reset_url,
        };
        let link = mailer::link_for(template, &token);

        let mail = OutgoingMail {
            from_name: self.sender_name.clone(),
            from_email: self.sender_email.clone(),
            to_name: req.name.clone(),
            to_email: req.email.clone(),
            subject: mailer::subject(purpose).to_string(),
            body: mailer::render(
                purpose,
                &req.name,
                &link,
                self.tokens.lifetimes().for_purpose(purpose),
            ),
        };

        match self.mailer.send(&mail).await {
            Ok(code) => {
                info!(
                    identity = req.id,
                    purpose = %purpose,
                    status = code,
                    "Sent {} mail with token {}",
                    purpose,
                    fingerprint(&token)
                );
                debug!("Link built from template {}", template);
                Ok(code)
            }
            Err(e) => {
                warn!(identity = req.id, purpose = %purpose, "Failed to send mail: {}", e);
                Err(e.into())
            }
        }
    }
}
