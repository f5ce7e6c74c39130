use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::signer::DEFAULT_SERVICE;

/// Header mapping keyed by name, as supplied by the caller.
pub type Headers = BTreeMap<String, String>;

/// Parameters of the single request this crate sends.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestSpec {
    /// Absolute URL including scheme, host and path.
    pub url: String,
    /// HTTP verb, validated at signing time.
    pub method: String,
    pub headers: Option<Headers>,
    /// Serialized to a JSON string before signing and sending.
    pub payload: Option<Value>,
    pub region: String,
    pub service: String,
}

impl RequestSpec {
    /// Creates a `GET` request for `url` signed for `region`.
    pub fn new(url: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_owned(),
            headers: None,
            payload: None,
            region: region.into(),
            service: DEFAULT_SERVICE.to_owned(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_headers(mut self, headers: Option<Headers>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Overrides the signing service, `execute-api` by default.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }
}

/// Response of a successful attempt.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResponseResult {
    pub body: Value,
    pub headers: Headers,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}
