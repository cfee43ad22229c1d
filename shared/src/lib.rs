pub mod clock;
pub mod config;
pub mod logging;
pub mod rpc;
pub mod token;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use token::{EmailPurpose, Role, TokenCodec, TokenError};
