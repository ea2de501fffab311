//! Typed wrappers over the backend endpoints the session layer depends on.

pub mod auth;

pub use auth::{AuthApi, AuthError, LoginArea, RegistrationForm};
