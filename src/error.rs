//! Error handling for the session client.
//!
//! Every failure the client can report is a [`ClientError`]. HTTP failures
//! keep the status and body so callers can present the server's message.

use http::StatusCode;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid request url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("stored token cannot be sent as a header")]
    InvalidToken,
    #[error("could not build http client: {source}")]
    Build {
        #[source]
        source: reqwest::Error,
    },
    #[error("request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
    #[error("server responded with {status}{}", message_suffix(.message))]
    Status {
        status: StatusCode,
        message: Option<String>,
        body: Vec<u8>,
    },
    #[error("could not decode response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode request body: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl ClientError {
    pub(crate) fn from_status(status: StatusCode, body: Vec<u8>) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            message: Option<String>,
        }

        let message = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty());

        ClientError::Status {
            status,
            message,
            body,
        }
    }

    /// The HTTP status, for errors that carry one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport { source } => source.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// The `message` field of a JSON error body, if the server sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}
