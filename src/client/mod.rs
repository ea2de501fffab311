//! The shared HTTP client.
//!
//! Every request the application makes goes through one [`SessionClient`].
//! Outgoing requests get the stored bearer token and, for POST, an
//! idempotency key. A 401 from the server ends the session: the stored
//! fields are cleared and the user is sent to the login page once, however
//! many requests fail together.

mod request;


pub use request::{ApiRequest, ApiResponse, Envelope};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::ClientError;
use crate::idempotency::{self, EntropySource, OsEntropy, IDEMPOTENCY_KEY_HEADER};
use crate::navigation::{Navigation, Navigator};
use crate::routes;
use crate::session::SessionHandle;
use crate::utilities::Utilities;

#[derive(Clone, Debug)]
pub struct SessionClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    session: SessionHandle,
    navigator: Arc<dyn Navigator>,
    entropy: Arc<dyn EntropySource>,
    redirect_pending: AtomicBool,
}

pub struct SessionClientBuilder {
    config: Config,
    session: SessionHandle,
    navigator: Arc<dyn Navigator>,
    entropy: Arc<dyn EntropySource>,
}

impl SessionClientBuilder {
    pub fn with_entropy(mut self, entropy: impl EntropySource + 'static) -> Self {
        self.entropy = Arc::new(entropy);
        self
    }

    pub fn build(self) -> Result<SessionClient, ClientError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(self.config.timeout())
            .cookie_store(self.config.sends_credentials())
            .default_headers(default_headers)
            .build()
            .map_err(|source| ClientError::Build { source })?;

        debug!(
            base_url = %self.config.api_base_url(),
            timeout_ms = self.config.timeout().as_millis() as u64,
            credentials = self.config.sends_credentials(),
            "built session client"
        );

        Ok(SessionClient {
            inner: Arc::new(ClientInner {
                http,
                base_url: self.config.api_base_url().clone(),
                session: self.session,
                navigator: self.navigator,
                entropy: self.entropy,
                redirect_pending: AtomicBool::new(false),
            }),
        })
    }
}

impl SessionClient {
    pub fn builder(
        config: Config,
        session: SessionHandle,
        navigator: impl Navigator + 'static,
    ) -> SessionClientBuilder {
        SessionClientBuilder {
            config,
            session,
            navigator: Arc::new(navigator),
            entropy: Arc::new(OsEntropy),
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.inner.session
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Whether a 401 has already sent the user to the login page and no new
    /// session has been established since.
    pub fn redirect_pending(&self) -> bool {
        self.inner.redirect_pending.load(Ordering::Acquire)
    }

    pub(crate) fn navigate(&self, navigation: Navigation) {
        self.inner.navigator.navigate(navigation);
    }

    /// Called by the login flows once a new session has been stored.
    pub(crate) fn session_established(&self) {
        self.inner.redirect_pending.store(false, Ordering::Release);
    }

    /// Resolves the URL and applies the credential and idempotency headers.
    pub fn prepare(&self, request: ApiRequest) -> Result<reqwest::Request, ClientError> {
        let ApiRequest {
            method,
            path,
            query,
            mut headers,
            body,
        } = request;

        let raw_url = Utilities::combine_url(self.inner.base_url.as_str(), &path);
        let url = Url::parse(&raw_url).map_err(|source| ClientError::InvalidUrl {
            url: raw_url.clone(),
            source,
        })?;

        if let Some(token) = self.inner.session.token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ClientError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        if method == Method::POST && !headers.contains_key(IDEMPOTENCY_KEY_HEADER) {
            let key = idempotency::generate(self.inner.entropy.as_ref());
            if let Ok(value) = HeaderValue::from_str(&key) {
                headers.insert(HeaderName::from_static(IDEMPOTENCY_KEY_HEADER), value);
            }
        }

        let mut builder = self.inner.http.request(method, url).headers(headers);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        builder.build().map_err(|source| ClientError::Build { source })
    }

    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let request = self.prepare(request)?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let response = self
            .inner
            .http
            .execute(request)
            .await
            .map_err(|source| ClientError::Transport { source })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport { source })?
            .to_vec();

        debug!(%method, %path, status = status.as_u16(), "response received");

        if status.is_success() {
            return Ok(ApiResponse {
                status,
                headers,
                body,
            });
        }

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
        }
        Err(ClientError::from_status(status, body))
    }

    /// Sends the request and decodes the JSON body into `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        self.send(request).await?.json()
    }

    fn handle_unauthorized(&self) {
        if let Err(err) = self.inner.session.clear() {
            warn!(error = %err, "could not clear rejected session");
        }

        if self.inner.redirect_pending.swap(true, Ordering::AcqRel) {
            debug!("login redirect already pending");
            return;
        }

        info!(path = routes::CUSTOMER_LOGIN, "session rejected by server, redirecting to login");
        self.navigate(Self::unauthorized_navigation());
    }

    /// The redirect issued when the server rejects the session.
    pub fn unauthorized_navigation() -> Navigation {
        Navigation::document(routes::CUSTOMER_LOGIN)
    }
}
