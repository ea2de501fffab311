//! # toko-session
//!
//! The session layer of the Toko Ilham storefront and admin console: one
//! shared HTTP client that carries the customer's credentials to the REST
//! backend, and a route guard that checks the customer's role again on
//! every protected navigation.
//!
//! ## Features
//!
//! - Bearer token injection from a persisted session
//! - Idempotency keys on POST requests
//! - Session teardown and a single login redirect on 401
//! - Role-gated route guard with loading, granted and denied states
//! - Login, admin login, registration and logout flows
//!
//! See the [docs](crate::docs) module for comprehensive documentation.

pub mod api;
pub mod client;
pub mod config;
pub mod docs;
pub mod error;
pub mod guard;
pub mod idempotency;
pub mod navigation;
pub mod routes;
pub mod session;
pub mod session_storage;
pub mod utilities;

#[cfg(test)]
mod test_support;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub use crate::api::{AuthApi, AuthError, LoginArea, RegistrationForm};
pub use crate::client::{ApiRequest, ApiResponse, Envelope, SessionClient, SessionClientBuilder};
pub use crate::config::{Config, ConfigError};
pub use crate::error::ClientError;
pub use crate::guard::{AccessRequirement, GuardState, MountedGuard, Rendered, RouteGuard};
pub use crate::navigation::{Navigation, Navigator, RecordingNavigator, TracingNavigator};
pub use crate::session::{Role, Session, SessionHandle, UserId, ROLE_KEY, TOKEN_KEY, USER_ID_KEY};
pub use crate::session_storage::file::FileStore;
pub use crate::session_storage::in_memory::MemoryStore;
pub use crate::session_storage::{SessionStore, StoreError};

/// Installs the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. With `json` set,
/// events are written as one JSON object per line.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt_layer.json()).init();
    } else {
        registry.with(fmt_layer).init();
    }
}
