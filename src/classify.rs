//! Classification of a final failure for reporting at the runner boundary.

use std::error::Error as _;

use serde_json::Value;

use crate::{Headers, RequestError};

/// Summary reported when the server answered with a failure status.
pub const SERVER_RESPONDED_SUMMARY: &str = "request failed";

/// How a failed request ended, for reporting only.
#[derive(Clone, Debug, PartialEq)]
pub enum ClassifiedError {
    /// The server answered with a non-success status.
    ServerResponded {
        status_code: u16,
        body: Value,
        headers: Headers,
    },
    /// The request was sent but no response arrived.
    NoResponse { request: String },
    /// The request could not be built or signed.
    SetupFailure {
        message: String,
        trace: Option<String>,
    },
}

/// Sorts a final error into exactly one [`ClassifiedError`] category.
pub fn classify(err: &RequestError) -> ClassifiedError {
    match err {
        RequestError::Http {
            status,
            headers,
            body,
        } => ClassifiedError::ServerResponded {
            status_code: *status,
            body: body.clone(),
            headers: headers.clone(),
        },
        RequestError::Transport(inner) => {
            let url = inner
                .url()
                .map(|url| url.to_string())
                .unwrap_or_else(|| "<unknown>".to_owned());
            ClassifiedError::NoResponse {
                request: format!("{url}: {}", render_chain(inner)),
            }
        }
        RequestError::Signing(_) | RequestError::InvalidInput(_) => {
            ClassifiedError::SetupFailure {
                message: err.to_string(),
                trace: err.source().map(render_chain),
            }
        }
    }
}

impl ClassifiedError {
    /// Logs the details of the failure and returns the one-line summary the
    /// runner should mark the step failed with.
    pub fn report(&self) -> String {
        match self {
            Self::ServerResponded {
                status_code,
                body,
                headers,
            } => {
                tracing::info!("body {body}");
                tracing::info!("status {status_code}");
                tracing::info!(
                    "headers {}",
                    serde_json::to_string(headers).unwrap_or_default()
                );
                SERVER_RESPONDED_SUMMARY.to_owned()
            }
            Self::NoResponse { request } => request.clone(),
            Self::SetupFailure { message, trace } => {
                if let Some(trace) = trace {
                    tracing::error!("{trace}");
                }
                message.clone()
            }
        }
    }
}

fn render_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
