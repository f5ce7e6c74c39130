//! AWS Signature Version 4 (`AWS4-HMAC-SHA256`) request signing.
//!
//! Canonicalization and signature math are delegated to `aws-sigv4` with its
//! default settings: double percent-encoded paths, `.`/`..`/`//` path
//! normalization and a signed `x-amz-security-token` when one is present.

use std::{fmt, sync::Arc, time::SystemTime};

use aws_credential_types::Credentials as AwsCredentials;
use aws_sigv4::{
    http_request::{sign, SignableBody, SignableRequest, SigningParams, SigningSettings},
    sign::v4,
};
use aws_smithy_runtime_api::client::identity::Identity;
use chrono::{DateTime, Utc};
use url::Url;

use crate::{credentials::CredentialProvider, Headers, RequestError, RequestSpec, Result};

/// Service identifier of API Gateway's `execute-api` endpoints.
pub const DEFAULT_SERVICE: &str = "execute-api";

const METHODS: &[&str] = &[
    "GET", "HEAD", "POST", "PUT", "DELETE", "PATCH", "OPTIONS", "CONNECT", "TRACE",
];
const PROVIDER_NAME: &str = "apigw-request";

/// A request ready to be sent: signed headers plus the exact body that was signed.
#[derive(Clone, Debug, PartialEq)]
pub struct SignedRequest {
    pub method: String,
    pub url: String,
    pub host: String,
    pub path: String,
    pub region: String,
    pub service: String,
    pub headers: Headers,
    /// JSON-serialized payload; empty when the request has no payload.
    pub body: String,
}

impl SignedRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Hex signature from the `Authorization` header.
    pub fn signature(&self) -> Option<&str> {
        self.header("authorization")?
            .rsplit_once("Signature=")
            .map(|(_, signature)| signature)
    }
}

/// Signs [`RequestSpec`]s with credentials from a [`CredentialProvider`].
#[derive(Clone)]
pub struct RequestSigner {
    credentials: Arc<dyn CredentialProvider>,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("credentials", &"<redacted>")
            .finish()
    }
}

impl RequestSigner {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { credentials }
    }

    /// Signs `spec` at the current wall-clock time.
    pub fn sign(&self, spec: &RequestSpec) -> Result<SignedRequest> {
        self.sign_at(spec, Utc::now())
    }

    /// Signs `spec` as of `now`.
    ///
    /// The output is deterministic for the same spec, credentials and instant.
    pub fn sign_at(&self, spec: &RequestSpec, now: DateTime<Utc>) -> Result<SignedRequest> {
        let method = normalize_method(&spec.method)?;
        let url = Url::parse(&spec.url)
            .map_err(|err| RequestError::InvalidInput(format!("invalid url '{}': {err}", spec.url)))?;
        let host = host_of(&url)?;
        let region = spec.region.trim();
        if region.is_empty() {
            return Err(RequestError::InvalidInput("missing signing region".to_owned()));
        }
        let service = match spec.service.trim() {
            "" => DEFAULT_SERVICE,
            service => service,
        };
        let body = match &spec.payload {
            Some(payload) => serde_json::to_string(payload).map_err(|err| {
                RequestError::InvalidInput(format!("payload is not serializable: {err}"))
            })?,
            None => String::new(),
        };
        let credentials = self.credentials.credentials()?;

        let mut headers = spec.headers.clone().unwrap_or_default();
        headers.retain(|key, _| {
            !key.eq_ignore_ascii_case("authorization")
                && !key.eq_ignore_ascii_case("x-amz-date")
                && !key.eq_ignore_ascii_case("x-amz-security-token")
        });
        if !has_header(&headers, "host") {
            headers.insert("Host".to_owned(), host.clone());
        }
        if !body.is_empty() && !has_header(&headers, "content-type") {
            headers.insert("Content-Type".to_owned(), "application/json".to_owned());
        }

        let instructions = {
            let identity = Identity::from(AwsCredentials::new(
                credentials.access_key_id.as_str(),
                credentials.secret_access_key.as_str(),
                credentials.session_token.clone(),
                None,
                PROVIDER_NAME,
            ));
            let params: SigningParams<'_> = v4::SigningParams::builder()
                .identity(&identity)
                .region(region)
                .name(service)
                .time(SystemTime::from(now))
                .settings(SigningSettings::default())
                .build()
                .map_err(|err| RequestError::Signing(format!("invalid signing parameters: {err}")))?
                .into();
            let signable = SignableRequest::new(
                &method,
                url.as_str(),
                headers.iter().map(|(key, value)| (key.as_str(), value.as_str())),
                SignableBody::Bytes(body.as_bytes()),
            )
            .map_err(|err| RequestError::Signing(format!("request cannot be signed: {err}")))?;
            let (instructions, _signature) = sign(signable, &params)
                .map_err(|err| RequestError::Signing(format!("request cannot be signed: {err}")))?
                .into_parts();
            instructions
        };

        for (name, value) in instructions.headers() {
            headers.insert(name.to_owned(), value.to_owned());
        }

        Ok(SignedRequest {
            method,
            url: url.to_string(),
            host,
            path: url.path().to_owned(),
            region: region.to_owned(),
            service: service.to_owned(),
            headers,
            body,
        })
    }
}

fn normalize_method(method: &str) -> Result<String> {
    let upper = method.trim().to_ascii_uppercase();
    if METHODS.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(RequestError::InvalidInput(format!(
            "unsupported http method '{method}'"
        )))
    }
}

fn host_of(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| RequestError::InvalidInput(format!("url '{url}' has no host")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    })
}

fn has_header(headers: &Headers, name: &str) -> bool {
    headers.keys().any(|key| key.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    use super::{RequestSigner, DEFAULT_SERVICE};
    use crate::{
        credentials::{CredentialProvider, Credentials, StaticCredentialProvider},
        Headers, RequestError, RequestSpec, Result,
    };

    struct NoCredentials;

    impl CredentialProvider for NoCredentials {
        fn credentials(&self) -> Result<Credentials> {
            Err(RequestError::Signing("no credentials".to_owned()))
        }
    }

    fn signer(access_key_id: &str, secret: &str) -> RequestSigner {
        RequestSigner::new(Arc::new(StaticCredentialProvider::new(Credentials::new(
            access_key_id,
            secret,
        ))))
    }

    fn example_spec() -> RequestSpec {
        let headers: Headers = [("x-test".to_owned(), "bar".to_owned())].into();
        RequestSpec::new("https://example.com/foo", "us-east-99")
            .with_headers(Some(headers))
            .with_payload(json!({ "foo": "bar" }))
    }

    #[test]
    fn matches_aws_get_vanilla_vector() {
        let signer = signer("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");
        let spec = RequestSpec::new("https://example.amazonaws.com/", "us-east-1")
            .with_service("service");
        let at = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();

        let signed = signer.sign_at(&spec, at).unwrap();

        assert_eq!(signed.header("x-amz-date"), Some("20150830T123600Z"));
        assert_eq!(
            signed.header("authorization"),
            Some(
                "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, \
                 SignedHeaders=host;x-amz-date, \
                 Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
            )
        );
    }

    #[test]
    fn signed_request_carries_expected_fields() {
        let signed = signer("test-key-id", "test-secret-access-key")
            .sign(&example_spec())
            .unwrap();

        assert_eq!(signed.body, r#"{"foo":"bar"}"#);
        assert_eq!(signed.method, "GET");
        assert_eq!(signed.service, DEFAULT_SERVICE);
        assert_eq!(signed.region, "us-east-99");
        assert_eq!(signed.path, "/foo");
        assert_eq!(signed.header("x-test"), Some("bar"));
        assert_eq!(signed.header("host"), Some("example.com"));
        assert_eq!(signed.header("content-type"), Some("application/json"));
        assert_eq!(signed.header("x-amz-date").map(str::len), Some(16));

        let authorization = signed.header("authorization").unwrap();
        let parts: Vec<&str> = authorization.split(", ").collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].starts_with("AWS4-HMAC-SHA256 Credential=test-key-id/"));
        assert!(parts[0].ends_with("/us-east-99/execute-api/aws4_request"));
        assert_eq!(
            parts[1],
            "SignedHeaders=content-type;host;x-amz-date;x-test"
        );
        assert_eq!(signed.signature().map(str::len), Some(64));
    }

    #[test]
    fn signature_is_deterministic_per_instant() {
        let signer = signer("test-key-id", "test-secret-access-key");
        let spec = example_spec();
        let first = Utc.with_ymd_and_hms(2022, 12, 18, 16, 38, 5).unwrap();
        let second = first + Duration::seconds(1);

        let a = signer.sign_at(&spec, first).unwrap();
        let b = signer.sign_at(&spec, first).unwrap();
        let c = signer.sign_at(&spec, second).unwrap();

        assert_eq!(a, b);
        assert_ne!(a.signature(), c.signature());
        assert_eq!(c, signer.sign_at(&spec, second).unwrap());
    }

    #[test]
    fn different_secret_changes_signature() {
        let at = Utc.with_ymd_and_hms(2022, 12, 18, 16, 38, 5).unwrap();
        let a = signer("key", "one").sign_at(&example_spec(), at).unwrap();
        let b = signer("key", "two").sign_at(&example_spec(), at).unwrap();
        assert_ne!(a.signature(), b.signature());
    }

    #[test]
    fn string_payload_is_double_encoded() {
        let spec = RequestSpec::new("https://example.com", "us-east-1").with_payload("abc");
        let signed = signer("k", "s").sign(&spec).unwrap();
        assert_eq!(signed.body, "\"abc\"");
    }

    #[test]
    fn absent_payload_signs_empty_body() {
        let spec = RequestSpec::new("https://example.com", "us-east-1");
        let signed = signer("k", "s").sign(&spec).unwrap();
        assert_eq!(signed.body, "");
        assert_eq!(signed.header("content-type"), None);
        assert_eq!(signed.path, "/");
    }

    #[test]
    fn session_token_is_added_and_signed() {
        let creds = Credentials::new("k", "s").with_session_token("session");
        let signer = RequestSigner::new(Arc::new(StaticCredentialProvider::new(creds)));
        let spec = RequestSpec::new("https://example.com/", "us-east-1");
        let signed = signer.sign(&spec).unwrap();

        assert_eq!(signed.header("x-amz-security-token"), Some("session"));
        assert!(signed
            .header("authorization")
            .unwrap()
            .contains("SignedHeaders=host;x-amz-date;x-amz-security-token,"));
    }

    #[test]
    fn host_includes_explicit_port() {
        let spec = RequestSpec::new("http://127.0.0.1:8080/stage/items", "us-east-1");
        let signed = signer("k", "s").sign(&spec).unwrap();
        assert_eq!(signed.host, "127.0.0.1:8080");
        assert_eq!(signed.header("host"), Some("127.0.0.1:8080"));
    }

    #[test]
    fn method_is_normalized_and_validated() {
        let spec = RequestSpec::new("https://example.com", "us-east-1").with_method("put");
        assert_eq!(signer("k", "s").sign(&spec).unwrap().method, "PUT");

        let spec = spec.with_method("FETCH");
        assert!(matches!(
            signer("k", "s").sign(&spec),
            Err(RequestError::InvalidInput(_))
        ));
    }

    #[test]
    fn malformed_url_is_invalid_input() {
        let spec = RequestSpec::new("not a url", "us-east-1");
        assert!(matches!(
            signer("k", "s").sign(&spec),
            Err(RequestError::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_region_is_invalid_input() {
        let spec = RequestSpec::new("https://example.com", "  ");
        assert!(matches!(
            signer("k", "s").sign(&spec),
            Err(RequestError::InvalidInput(_))
        ));
    }

    #[test]
    fn missing_credentials_is_signing_error() {
        let signer = RequestSigner::new(Arc::new(NoCredentials));
        let spec = RequestSpec::new("https://example.com", "us-east-1");
        assert!(matches!(signer.sign(&spec), Err(RequestError::Signing(_))));
    }

    #[test]
    fn caller_authorization_header_is_replaced() {
        let headers: Headers = [("authorization".to_owned(), "Bearer nope".to_owned())].into();
        let spec = RequestSpec::new("https://example.com", "us-east-1").with_headers(Some(headers));
        let signed = signer("k", "s").sign(&spec).unwrap();

        let auth: Vec<_> = signed
            .headers
            .keys()
            .filter(|key| key.eq_ignore_ascii_case("authorization"))
            .collect();
        assert_eq!(auth.len(), 1);
        assert!(signed.header("authorization").unwrap().starts_with("AWS4-HMAC-SHA256"));
    }

    #[test]
    fn empty_path_segments_are_normalized_before_signing() {
        let signer = signer("test-key-id", "test-secret-access-key");
        let at = Utc.with_ymd_and_hms(2022, 12, 18, 16, 38, 5).unwrap();
        let doubled = RequestSpec::new("https://example.com/prod//items", "us-east-1");
        let single = RequestSpec::new("https://example.com/prod/items", "us-east-1");

        let doubled = signer.sign_at(&doubled, at).unwrap();
        let single = signer.sign_at(&single, at).unwrap();

        assert_eq!(doubled.path, "/prod//items");
        assert_eq!(doubled.signature(), single.signature());
    }

    #[test]
    fn encoded_path_segments_are_signed_double_encoded() {
        let signer = signer("test-key-id", "test-secret-access-key");
        let at = Utc.with_ymd_and_hms(2022, 12, 18, 16, 38, 5).unwrap();
        let encoded = RequestSpec::new("https://example.com/prod/a%20b", "us-east-1");
        let plain = RequestSpec::new("https://example.com/prod/a20b", "us-east-1");

        let encoded = signer.sign_at(&encoded, at).unwrap();
        assert_eq!(encoded.path, "/prod/a%20b");
        assert_ne!(
            encoded.signature(),
            signer.sign_at(&plain, at).unwrap().signature()
        );
    }
}
