//! # toko-session Documentation
//!
//! This module gives an overview of the crate's architecture, components
//! and the flows they take part in.
//!
//! ## Overview
//!
//! The Toko Ilham storefront and admin console talk to a REST backend. All of
//! that traffic goes through one [`SessionClient`](crate::SessionClient),
//! and every protected page is wrapped in a
//! [`RouteGuard`](crate::RouteGuard). Both read and write the same three
//! persisted fields: `token`, `role` and `userId`.
//!
//! ## Architecture
//!
//! - **client**: the shared HTTP client with bearer, idempotency and 401 handling
//! - **guard**: per-navigation role verification
//! - **api**: login, admin login, registration, role check and logout
//! - **session** / **session_storage**: the persisted identity fields and their stores
//! - **navigation**: the redirect capability injected into client and guard
//! - **routes**: login targets and protected paths
//! - **config**: environment-driven settings
//!
//! ## Usage
//!
//! ### Basic Setup
//!
//! ```ignore
//! let config = Config::from_env()?;
//! let session = SessionHandle::new(FileStore::open(config.session_file())?);
//! let client = SessionClient::builder(config, session, navigator).build()?;
//! ```
//!
//! ### Request Flow
//!
//! 1. A page builds an [`ApiRequest`](crate::ApiRequest) with a relative path
//! 2. The client attaches `Authorization: Bearer <token>` when a token is stored
//! 3. POST requests without an `Idempotency-Key` get a fresh 24 hex character key
//! 4. A 2xx reply is returned as is; anything else becomes a
//!    [`ClientError`](crate::ClientError)
//! 5. On 401 the session is cleared and the user is sent to `/login` once
//!
//! ### Guard Flow
//!
//! 1. The guard is mounted with an access requirement and the current location
//! 2. Without a token it is denied at once, with no request sent
//! 3. Otherwise it calls `GET /auth/check-role` and stores the returned role
//! 4. Admin routes need the `admin` role; other protected routes need any
//!    verified session
//! 5. A denied mount redirects to `/login/admin` or `/login`, carrying the
//!    location it was guarding
//!
//! ```ignore
//! let mounted = guard.mount(AccessRequirement::Authenticated, "/dashboard");
//! mounted.verify().await;
//! let page = mounted.render(|| dashboard());
//! ```
//!
//! ## Command Line
//!
//! The `toko-session` binary drives the same flows against a live backend,
//! keeping the session in `TOKO_SESSION_FILE`:
//!
//! ```text
//! toko-session login budi
//! toko-session visit /dashboard
//! toko-session request post /orders --data '{"productId": 3}'
//! toko-session logout
//! ```
