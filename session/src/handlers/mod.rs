pub mod health;
pub mod routes;
pub mod session;

pub use routes::handle;
