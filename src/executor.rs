use std::{future::Future, time::Duration};

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method,
};
use serde_json::Value;

use crate::{signer::RequestSigner, Headers, RequestError, RequestSpec, ResponseResult, Result};

/// Fixed per-attempt timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(3_000);

/// Performs one attempt of a request.
///
/// Implementations must not retry; [`crate::request_with_retries`] owns that.
pub trait Execute {
    fn execute(&self, spec: &RequestSpec) -> impl Future<Output = Result<ResponseResult>> + Send;
}

/// Signs and sends requests over `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpExecutor {
    http: reqwest::Client,
    signer: RequestSigner,
}

impl HttpExecutor {
    pub fn new(signer: RequestSigner) -> Self {
        Self {
            http: reqwest::Client::new(),
            signer,
        }
    }

    /// Signs `spec` at the current time and sends it once.
    ///
    /// Any status outside 2xx/3xx is returned as [`RequestError::Http`] with
    /// the response as received; transport failures are returned unchanged.
    pub async fn send(&self, spec: &RequestSpec) -> Result<ResponseResult> {
        let signed = self.signer.sign(spec)?;
        let method = Method::from_bytes(signed.method.as_bytes()).map_err(|err| {
            RequestError::InvalidInput(format!("invalid method '{}': {err}", signed.method))
        })?;
        let headers = to_header_map(&signed.headers)?;

        tracing::debug!(method = %signed.method, url = %signed.url, "sending signed request");

        let mut request = self
            .http
            .request(method, &signed.url)
            .headers(headers)
            .timeout(REQUEST_TIMEOUT);
        if !signed.body.is_empty() {
            request = request.body(signed.body);
        }

        let response = request.send().await.map_err(RequestError::Transport)?;
        let status = response.status();
        let headers = from_header_map(response.headers());
        let text = response.text().await.map_err(RequestError::Transport)?;
        let body = parse_body(text);

        if !(status.is_success() || status.is_redirection()) {
            return Err(RequestError::Http {
                status: status.as_u16(),
                headers,
                body,
            });
        }

        Ok(ResponseResult {
            body,
            headers,
            status_code: status.as_u16(),
        })
    }
}

impl Execute for HttpExecutor {
    fn execute(&self, spec: &RequestSpec) -> impl Future<Output = Result<ResponseResult>> + Send {
        self.send(spec)
    }
}

fn to_header_map(headers: &Headers) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|err| RequestError::InvalidInput(format!("invalid header name '{key}': {err}")))?;
        let value = HeaderValue::from_str(value).map_err(|err| {
            RequestError::InvalidInput(format!("invalid value for header '{key}': {err}"))
        })?;
        map.append(name, value);
    }
    Ok(map)
}

fn from_header_map(headers: &HeaderMap) -> Headers {
    let mut out = Headers::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        out.entry(name.as_str().to_owned())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    out
}

/// JSON bodies are decoded; anything else is kept as a string value.
fn parse_body(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
