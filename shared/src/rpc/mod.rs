//! JSON-over-HTTP plumbing shared by the session and mail services.
pub mod body;
pub mod json_response;
pub mod server;
pub mod timeout;

pub use body::{MAX_BODY_BYTES, read_json};
pub use json_response::{
    deliver_error_json, deliver_serialized_json, deliver_token_error, internal_error,
};
pub use server::serve;
pub use timeout::{TimeoutLayer, TimeoutService};
