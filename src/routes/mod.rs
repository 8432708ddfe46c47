mod auth;
mod health_check;

pub use auth::{login, logout, me, refresh};
pub use health_check::health_check;
