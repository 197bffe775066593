mod account;
mod auth;
mod health_check;

pub use account::{get_current_account, logout};
pub use auth::{login, refresh, register};
pub use health_check::health_check;
