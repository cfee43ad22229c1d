use std::future::Future;
use std::time::Duration;

use shared::types::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, EmailVerifyRequest,
    EmailVerifyResponse, GatewayConfig, MailRequest, MailResponse, VerifyRequest, VerifyResponse,
};
use shared::{EmailPurpose, Role};

use crate::rpc::{RpcClient, RpcError};

/// Calls the gateway makes to the session service.
pub trait SessionApi: Send + Sync {
    fn create(&self, id: u32, role: Role) -> impl Future<Output = Result<String, RpcError>> + Send;

    fn verify(&self, token: &str) -> impl Future<Output = Result<VerifyResponse, RpcError>> + Send;

    fn delete(&self, token: &str) -> impl Future<Output = Result<(), RpcError>> + Send;
}

/// Calls the gateway makes to the mail service.
pub trait MailApi: Send + Sync {
    fn verify_token(
        &self,
        token: &str,
        purpose: EmailPurpose,
    ) -> impl Future<Output = Result<EmailVerifyResponse, RpcError>> + Send;

    fn send(
        &self,
        purpose: EmailPurpose,
        request: &MailRequest,
    ) -> impl Future<Output = Result<MailResponse, RpcError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpSessionApi {
    rpc: RpcClient,
}

impl HttpSessionApi {
    pub fn new(base: impl Into<String>, timeout: Duration) -> Self {
        Self {
            rpc: RpcClient::new(base, timeout),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.session_service.clone(), config.rpc_timeout())
    }
}

impl SessionApi for HttpSessionApi {
    async fn create(&self, id: u32, role: Role) -> Result<String, RpcError> {
        let resp: CreateResponse = self
            .rpc
            .post("/session/create", &CreateRequest { id, role })
            .await?;
        Ok(resp.token)
    }

    async fn verify(&self, token: &str) -> Result<VerifyResponse, RpcError> {
        self.rpc
            .post(
                "/session/verify",
                &VerifyRequest {
                    token: token.to_string(),
                },
            )
            .await
    }

    async fn delete(&self, token: &str) -> Result<(), RpcError> {
        let _: DeleteResponse = self
            .rpc
            .post(
                "/session/delete",
                &DeleteRequest {
                    token: token.to_string(),
                },
            )
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct HttpMailApi {
    rpc: RpcClient,
}

impl HttpMailApi {
    pub fn new(base: impl Into<String>, timeout: Duration) -> Self {
        Self {
            rpc: RpcClient::new(base, timeout),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.mail_service.clone(), config.rpc_timeout())
    }
}

impl MailApi for HttpMailApi {
    async fn verify_token(
        &self,
        token: &str,
        purpose: EmailPurpose,
    ) -> Result<EmailVerifyResponse, RpcError> {
        self.rpc
            .post(
                "/mail/verify",
                &EmailVerifyRequest {
                    token: token.to_string(),
                    purpose,
                },
            )
            .await
    }

    async fn send(&self, purpose: EmailPurpose, request: &MailRequest) -> Result<MailResponse, RpcError> {
        let path = match purpose {
            EmailPurpose::Confirmation => "/mail/confirmation",
            EmailPurpose::PasswordReset => "/mail/password-reset",
        };
        self.rpc.post(path, request).await
    }
}
