use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use crate::types::service_config::{AppConfig, ConfigError, MAX_TTL_MINUTES};

pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    info!("Loading configuration from: {}", path.display());

    let contents = fs::read_to_string(path)?;
    debug!("Processing file: {}", path.display());

    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    let config = parse_config(&contents)?;
    info!("Configuration loaded successfully");

    Ok(config)
}

/// Parse and validate a TOML document. Secrets are not checked here; each
/// service asks for its own secret when it starts.
pub fn parse_config(contents: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(contents)?;

    validate_config(&config)?;
    debug!("Config validated");

    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.session.ttl_minutes == 0 {
        return Err(ConfigError::InvalidConfig(
            "session.ttl_minutes must be greater than 0".into(),
        ));
    }

    if config.mail.confirmation_ttl_hours == 0 || config.mail.password_reset_ttl_minutes == 0 {
        return Err(ConfigError::InvalidConfig(
            "email token lifetimes must be greater than 0".into(),
        ));
    }

    let confirmation_minutes = config
        .mail
        .confirmation_ttl_hours
        .checked_mul(60)
        .filter(|m| *m <= MAX_TTL_MINUTES);
    let Some(confirmation_minutes) = confirmation_minutes else {
        return Err(ConfigError::InvalidConfig(format!(
            "mail.confirmation_ttl_hours must not exceed {} hours",
            MAX_TTL_MINUTES / 60
        )));
    };

    for (name, minutes) in [
        ("session.ttl_minutes", config.session.ttl_minutes),
        ("mail.password_reset_ttl_minutes", config.mail.password_reset_ttl_minutes),
        ("gateway.session_ttl_minutes", config.gateway.session_ttl_minutes),
    ] {
        if minutes > MAX_TTL_MINUTES {
            return Err(ConfigError::InvalidConfig(format!(
                "{} must not exceed {} minutes",
                name, MAX_TTL_MINUTES
            )));
        }
    }

    // A reset link that outlives a confirmation link is almost certainly a
    // unit mix-up.
    if config.mail.password_reset_ttl_minutes > confirmation_minutes {
        return Err(ConfigError::InvalidConfig(
            "mail.password_reset_ttl_minutes must not exceed the confirmation lifetime".into(),
        ));
    }

    for (name, template) in [
        ("mail.confirm_url", &config.mail.confirm_url),
        ("mail.reset_url", &config.mail.reset_url),
    ] {
        if !template.contains("{token}") {
            return Err(ConfigError::InvalidConfig(format!(
                "{} must contain a {{token}} placeholder",
                name
            )));
        }
    }

    if config.gateway.rpc_timeout_ms == 0 {
        return Err(ConfigError::InvalidConfig(
            "gateway.rpc_timeout_ms must be greater than 0".into(),
        ));
    }

    // The cookie must not outlive the session it carries, nor expire first.
    if config.gateway.session_ttl_minutes != config.session.ttl_minutes {
        return Err(ConfigError::InvalidConfig(format!(
            "gateway.session_ttl_minutes ({}) must equal session.ttl_minutes ({})",
            config.gateway.session_ttl_minutes, config.session.ttl_minutes
        )));
    }

    if config.gateway.cookie_name.is_empty() {
        return Err(ConfigError::InvalidConfig(
            "gateway.cookie_name cannot be empty".into(),
        ));
    }

    Ok(())
}
