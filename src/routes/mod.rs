mod auth;
mod health_check;
mod users;
mod webhooks;

pub use auth::{login, refresh, revoke, LoginRequest, LoginResponse, TokenResponse};
pub use health_check::health_check;
pub use users::{current_user, register, RegisterRequest};
pub use webhooks::webhook;
