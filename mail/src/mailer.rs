use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use shared::EmailPurpose;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

/// One rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from_name: String,
    pub from_email: String,
    pub to_name: String,
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// Delivery backend. `send` reports the provider's status code.
pub trait Mailer: Send + Sync {
    fn send(&self, mail: &OutgoingMail) -> impl Future<Output = Result<u16, MailError>> + Send;

    /// Whether the provider is reachable; drives the health check.
    fn check(&self) -> impl Future<Output = Result<(), MailError>> + Send;
}

/// Logs envelope data for every message instead of delivering it and
/// reports it as accepted (202). The body carries a live token link and is
/// never written out.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<u16, MailError> {
        info!(
            to = %mail.to_email,
            subject = %mail.subject,
            "Delivering mail from {} <{}>",
            mail.from_name,
            mail.from_email
        );
        debug!(body_len = mail.body.len(), "Mail body withheld from log");
        Ok(202)
    }

    async fn check(&self) -> Result<(), MailError> {
        Ok(())
    }
}

pub fn subject(purpose: EmailPurpose) -> &'static str {
    match purpose {
        EmailPurpose::Confirmation => "Please confirm your email",
        EmailPurpose::PasswordReset => "Reset your password",
    }
}

/// Plain-text body for `purpose`, addressed to `name`.
pub fn render(purpose: EmailPurpose, name: &str, link: &str, valid_for: Duration) -> String {
    let window = describe(valid_for);
    match purpose {
        EmailPurpose::Confirmation => format!(
            "Hi {name},\n\n\
             thanks for signing up. Please confirm your email address by opening\n\
             the link below within the next {window}:\n\n\
             {link}\n\n\
             If you did not create an account you can ignore this message.\n"
        ),
        EmailPurpose::PasswordReset => format!(
            "Hi {name},\n\n\
             someone asked to reset the password for your account. Open the link\n\
             below within the next {window} to choose a new one:\n\n\
             {link}\n\n\
             If this wasn't you, your password stays unchanged.\n"
        ),
    }
}

fn describe(window: Duration) -> String {
    let secs = window.as_secs();
    match (secs / 3_600, secs % 3_600) {
        (1, 0) => "hour".to_string(),
        (hours, 0) => format!("{} hours", hours),
        _ => format!("{} minutes", secs.div_ceil(60)),
    }
}

/// Substitute the URL-encoded token into a `{token}` link template.
pub fn link_for(template: &str, token: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(token.as_bytes()).collect();
    template.replace("{token}", &encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_substitutes_placeholder() {
        let link = link_for("https://blog.example/confirm?token={token}", "aaa.bbb.ccc");
        assert_eq!(link, "https://blog.example/confirm?token=aaa.bbb.ccc");
    }

    #[test]
    fn link_encodes_reserved_characters() {
        let link = link_for("/r?token={token}", "a+b/c=&d");
        assert_eq!(link, "/r?token=a%2Bb%2Fc%3D%26d");
    }

    #[test]
    fn bodies_carry_name_and_link() {
        for purpose in [EmailPurpose::Confirmation, EmailPurpose::PasswordReset] {
            let body = render(purpose, "Ada", "https://x/y?token=t", Duration::from_secs(3_600));
            assert!(body.starts_with("Hi Ada,"));
            assert!(body.contains("https://x/y?token=t"));
        }
    }

    #[test]
    fn validity_window_wording() {
        assert_eq!(describe(Duration::from_secs(3_600)), "hour");
        assert_eq!(describe(Duration::from_secs(72 * 3_600)), "72 hours");
        assert_eq!(describe(Duration::from_secs(900)), "15 minutes");
    }

    #[test]
    fn subjects_differ_by_purpose() {
        assert_ne!(
            subject(EmailPurpose::Confirmation),
            subject(EmailPurpose::PasswordReset)
        );
    }

    #[tokio::test]
    async fn log_mailer_accepts() {
        let mail = OutgoingMail {
            from_name: "Blog".into(),
            from_email: "noreply@blog.example".into(),
            to_name: "Ada".into(),
            to_email: "ada@example.com".into(),
            subject: "s".into(),
            body: "b".into(),
        };
        assert_eq!(LogMailer.send(&mail).await.unwrap(), 202);
        assert!(LogMailer.check().await.is_ok());
    }
}
