use serde_json::Value;

use crate::Headers;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Network, timeout or DNS failure from `reqwest`; no response was received.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    /// Non-success HTTP status with the response as received.
    #[error("request failed with status code {status}")]
    Http {
        status: u16,
        headers: Headers,
        body: Value,
    },
    /// Credentials are unavailable or the request could not be signed.
    #[error("signing error: {0}")]
    Signing(String),
    /// The request parameters are structurally invalid.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl RequestError {
    /// Whether another attempt could change the outcome.
    ///
    /// Signing and input errors describe the request itself, so they fail
    /// on the first attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Http { .. })
    }

    /// Structured payload carried by the error, if the server sent one.
    pub fn response_body(&self) -> Option<&Value> {
        match self {
            Self::Http { body, .. } => Some(body),
            _ => None,
        }
    }
}
