pub mod json_error;
pub mod rpc;
pub mod service_config;

pub use self::json_error::ErrorResponse;
pub use self::rpc::*;
pub use self::service_config::{
    AppConfig, ConfigError, GatewayConfig, MailConfig, SessionConfig, StoreBackendKind,
    StoreConfig, MAX_TTL_MINUTES,
};
