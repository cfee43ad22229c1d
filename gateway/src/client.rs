use tracing::{debug, error, info, warn};

use shared::types::{GatewayConfig, MailRequest, MailResponse, VerifyResponse};
use shared::{EmailPurpose, Role};

use crate::api::{HttpMailApi, HttpSessionApi, MailApi, SessionApi};
use crate::rpc::RpcError;

/// Who is making a request, as far as request handlers need to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: u32,
    pub role: Role,
}

impl Identity {
    pub fn is_moderator(&self) -> bool {
        self.role.is_moderator()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionResolution {
    Authenticated(Identity),
    Anonymous,
}

impl SessionResolution {
    pub fn identity(&self) -> Option<Identity> {
        match self {
            Self::Authenticated(identity) => Some(*identity),
            Self::Anonymous => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailAction {
    Accepted { email: String, id: u32 },
    Rejected,
}

/// The gateway's only view of the token services.
///
/// Every failure on the read path degrades to `Anonymous` or `Rejected`:
/// a slow or broken token service must never stop a page from rendering.
#[derive(Debug, Clone)]
pub struct TokenClient<S, M> {
    sessions: S,
    mail: M,
}

impl TokenClient<HttpSessionApi, HttpMailApi> {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            HttpSessionApi::from_config(config),
            HttpMailApi::from_config(config),
        )
    }
}

impl<S: SessionApi, M: MailApi> TokenClient<S, M> {
    pub fn new(sessions: S, mail: M) -> Self {
        Self { sessions, mail }
    }

    /// Resolve the session cookie value (if any) to an identity.
    pub async fn resolve_session(&self, cookie: Option<&str>) -> SessionResolution {
        let Some(token) = cookie.filter(|t| !t.is_empty()) else {
            return SessionResolution::Anonymous;
        };

        match self.sessions.verify(token).await {
            Ok(VerifyResponse {
                ok: true,
                id: Some(id),
                role: Some(role),
            }) => SessionResolution::Authenticated(Identity { id, role }),
            Ok(_) => {
                debug!("Session cookie not accepted");
                SessionResolution::Anonymous
            }
            Err(e) => {
                report("session verify", &e);
                SessionResolution::Anonymous
            }
        }
    }

    /// Resolve the `token` query parameter of an email link for `purpose`.
    pub async fn resolve_email_action(
        &self,
        token: Option<&str>,
        purpose: EmailPurpose,
    ) -> EmailAction {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return EmailAction::Rejected;
        };

        match self.mail.verify_token(token, purpose).await {
            Ok(resp) => EmailAction::Accepted {
                email: resp.email,
                id: resp.id,
            },
            Err(e) if e.is_rejection() => {
                debug!(purpose = %purpose, "Email link rejected");
                EmailAction::Rejected
            }
            Err(e) => {
                report("email verify", &e);
                EmailAction::Rejected
            }
        }
    }

    /// Start a session after the caller has checked credentials.
    pub async fn login(&self, identity: u32, role: Role) -> Result<String, RpcError> {
        let token = self.sessions.create(identity, role).await.inspect_err(|e| {
            report("session create", e);
        })?;
        info!(identity, role = %role, "Session started");
        Ok(token)
    }

    /// Revoke the session, if there is one. Failures are logged and
    /// swallowed; the caller clears the cookie either way.
    pub async fn logout(&self, cookie: Option<&str>) {
        let Some(token) = cookie.filter(|t| !t.is_empty()) else {
            return;
        };

        match self.sessions.delete(token).await {
            Ok(()) => info!("Session ended"),
            Err(e) if e.is_rejection() => debug!("Logout with an unusable session cookie"),
            Err(e) => report("session delete", &e),
        }
    }

    /// Ask the mail service to send a confirmation or reset link.
    pub async fn send_email(
        &self,
        purpose: EmailPurpose,
        request: &MailRequest,
    ) -> Result<MailResponse, RpcError> {
        self.mail
            .send(purpose, request)
            .await
            .inspect_err(|e| report("mail send", e))
    }
}

fn report(call: &str, err: &RpcError) {
    match err {
        RpcError::Timeout(_) => warn!("{} timed out: {}", call, err),
        RpcError::Status { status, .. } if *status < 500 => warn!("{} refused: {}", call, err),
        _ => error!("{} failed: {}", call, err),
    }
}
