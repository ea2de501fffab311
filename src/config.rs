//! Configuration management for the session client.
//!
//! Settings come from environment variables with defaults suitable for a
//! local backend. Everything here is fixed once the client is built.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::utilities::Utilities;

/// Environment variable names
pub const API_BASE_URL_VAR: &str = "TOKO_API_BASE_URL";
pub const STATIC_BASE_URL_VAR: &str = "TOKO_STATIC_BASE_URL";
pub const WITH_CREDENTIALS_VAR: &str = "TOKO_WITH_CREDENTIALS";
pub const SESSION_FILE_VAR: &str = "TOKO_SESSION_FILE";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api/v1";

/// Every request made by the client is bounded by this timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    api_base_url: Url,
    static_base_url: Url,
    with_credentials: bool,
    session_file: PathBuf,
}

impl Config {
    /// Create a configuration for the given API base URL, deriving the rest
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        let api_base_url = parse_url(API_BASE_URL_VAR, api_base_url)?;
        let static_base_url = parse_url(
            STATIC_BASE_URL_VAR,
            &Utilities::static_base_url(api_base_url.as_str()),
        )?;

        Ok(Self {
            api_base_url,
            static_base_url,
            with_credentials: true,
            session_file: default_session_file(),
        })
    }

    /// Create a new configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create a new configuration from an arbitrary variable lookup
    ///
    /// # Arguments
    ///
    /// * `lookup` - Returns the value of a variable, or `None` when unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base = lookup(API_BASE_URL_VAR)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = parse_url(API_BASE_URL_VAR, &api_base)?;

        let static_base = lookup(STATIC_BASE_URL_VAR)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| Utilities::static_base_url(&api_base));
        let static_base_url = parse_url(STATIC_BASE_URL_VAR, &static_base)?;

        let with_credentials = match lookup(WITH_CREDENTIALS_VAR) {
            None => true,
            Some(value) => match value.as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: WITH_CREDENTIALS_VAR,
                        value,
                    })
                }
            },
        };

        let session_file = match lookup(SESSION_FILE_VAR).filter(|v| !v.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_session_file(),
        };

        Ok(Config {
            api_base_url,
            static_base_url,
            with_credentials,
            session_file,
        })
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }

    pub fn with_credentials(mut self, enabled: bool) -> Self {
        self.with_credentials = enabled;
        self
    }

    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    /// Root of the backend for static assets such as product images
    pub fn static_base_url(&self) -> &Url {
        &self.static_base_url
    }

    pub fn sends_credentials(&self) -> bool {
        self.with_credentials
    }

    pub fn timeout(&self) -> Duration {
        REQUEST_TIMEOUT
    }

    pub fn session_file(&self) -> &PathBuf {
        &self.session_file
    }
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        name,
        value: value.to_string(),
        source,
    })
}

fn default_session_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("toko-session")
        .join("session.json")
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A URL setting could not be parsed
    #[error("Invalid URL in {name} ({value}): {source}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
    /// A setting has a value outside its accepted set
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}
