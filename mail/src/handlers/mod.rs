pub mod health;
pub mod mail;
pub mod routes;

pub use routes::handle;
