use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::token::EmailLifetimes;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Minimum accepted length for a signing secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest lifetime accepted for any token, in minutes (one year).
pub const MAX_TTL_MINUTES: u64 = 366 * 24 * 60;

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_session_port")]
    pub port: u16,
    /// HMAC key for session tokens.
    ///
    /// Prefer the `SESSION_SECRET` environment variable; this field is the
    /// fallback. Read once at startup. Rotating it invalidates every live
    /// session.
    pub secret: Option<String>,
    #[serde(default = "default_session_ttl")]
    pub ttl_minutes: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_mail_port")]
    pub port: u16,
    /// HMAC key for email tokens. `EMAIL_SECRET` takes priority.
    ///
    /// Keep it different from the session secret.
    pub secret: Option<String>,
    #[serde(default = "default_confirmation_ttl")]
    pub confirmation_ttl_hours: u64,
    #[serde(default = "default_reset_ttl")]
    pub password_reset_ttl_minutes: u64,
    /// Link template for confirmation mails; `{token}` is replaced.
    #[serde(default = "default_confirm_url")]
    pub confirm_url: String,
    /// Link template for password-reset mails; `{token}` is replaced.
    #[serde(default = "default_reset_url")]
    pub reset_url: String,
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
    #[serde(default = "default_sender_email")]
    pub sender_email: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    #[serde(default = "default_session_service")]
    pub session_service: String,
    #[serde(default = "default_mail_service")]
    pub mail_service: String,
    /// Deadline for every call from the gateway to a token service.
    #[serde(default = "default_rpc_timeout")]
    pub rpc_timeout_ms: u64,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default)]
    pub secure_cookies: bool,
    /// Max-Age for the session cookie. Must equal `session.ttl_minutes`.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_minutes: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackendKind {
    Memory,
    Redis,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackendKind,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// `REDIS_PASSWORD` takes priority.
    pub redis_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Env var first, config field second; empty strings count as unset.
fn resolve_secret(env_var: &str, field: &Option<String>) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(|| field.clone())
        .filter(|s| !s.is_empty())
}

fn require_secret(env_var: &str, field_name: &str, value: Option<String>) -> Result<String, ConfigError> {
    match value {
        None => Err(ConfigError::InvalidConfig(format!(
            "{} must be set via the {} env var or the {} config field",
            field_name, env_var, field_name
        ))),
        Some(secret) if secret.len() < MIN_SECRET_LEN => Err(ConfigError::InvalidConfig(format!(
            "{} must be at least {} characters long",
            field_name, MIN_SECRET_LEN
        ))),
        Some(secret) => Ok(secret),
    }
}

impl SessionConfig {
    /// Full bind address, e.g. `"127.0.0.1:8081"`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes.saturating_mul(60))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn resolved_secret(&self) -> Option<String> {
        resolve_secret("SESSION_SECRET", &self.secret)
    }

    /// The signing secret, or an error when it is missing or too short.
    pub fn signing_secret(&self) -> Result<String, ConfigError> {
        require_secret("SESSION_SECRET", "session.secret", self.resolved_secret())
    }
}

impl MailConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn lifetimes(&self) -> EmailLifetimes {
        EmailLifetimes {
            confirmation: Duration::from_secs(self.confirmation_ttl_hours.saturating_mul(60 * 60)),
            password_reset: Duration::from_secs(self.password_reset_ttl_minutes.saturating_mul(60)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn resolved_secret(&self) -> Option<String> {
        resolve_secret("EMAIL_SECRET", &self.secret)
    }

    pub fn signing_secret(&self) -> Result<String, ConfigError> {
        require_secret("EMAIL_SECRET", "mail.secret", self.resolved_secret())
    }
}

impl GatewayConfig {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_minutes.saturating_mul(60))
    }
}

impl StoreConfig {
    pub fn resolved_password(&self) -> Option<String> {
        resolve_secret("REDIS_PASSWORD", &self.redis_password)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_session_port(),
            secret: None,
            ttl_minutes: default_session_ttl(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_mail_port(),
            secret: None,
            confirmation_ttl_hours: default_confirmation_ttl(),
            password_reset_ttl_minutes: default_reset_ttl(),
            confirm_url: default_confirm_url(),
            reset_url: default_reset_url(),
            sender_name: default_sender_name(),
            sender_email: default_sender_email(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            session_service: default_session_service(),
            mail_service: default_mail_service(),
            rpc_timeout_ms: default_rpc_timeout(),
            cookie_name: default_cookie_name(),
            secure_cookies: false,
            session_ttl_minutes: default_session_ttl(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            redis_url: default_redis_url(),
            redis_password: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

pub fn default_bind() -> String {
    "127.0.0.1".to_string()
}

pub fn default_session_port() -> u16 {
    8081
}

pub fn default_mail_port() -> u16 {
    8082
}

pub fn default_session_ttl() -> u64 {
    60
}

pub fn default_confirmation_ttl() -> u64 {
    72
}

pub fn default_reset_ttl() -> u64 {
    60
}

pub fn default_request_timeout() -> u64 {
    5_000
}

pub fn default_rpc_timeout() -> u64 {
    1_000
}

pub fn default_confirm_url() -> String {
    "http://localhost:8080/auth/confirm?token={token}".to_string()
}

pub fn default_reset_url() -> String {
    "http://localhost:8080/auth/reset?token={token}".to_string()
}

pub fn default_sender_name() -> String {
    "The microlog team".to_string()
}

pub fn default_sender_email() -> String {
    "team@microlog.co".to_string()
}

pub fn default_session_service() -> String {
    "http://127.0.0.1:8081".to_string()
}

pub fn default_mail_service() -> String {
    "http://127.0.0.1:8082".to_string()
}

pub fn default_cookie_name() -> String {
    "session_token".to_string()
}

pub fn default_store_backend() -> StoreBackendKind {
    StoreBackendKind::Memory
}

pub fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}
