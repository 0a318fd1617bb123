pub mod auth;

pub use auth::{AuthMiddleware, ACCESS_TOKEN_COOKIE};
