use std::fmt;

use crate::{RequestError, Result};

pub const ACCESS_KEY_ID_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN_VAR: &str = "AWS_SESSION_TOKEN";

/// AWS credentials used to sign requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Source of signing credentials, consulted once per signature.
pub trait CredentialProvider: Send + Sync {
    fn credentials(&self) -> Result<Credentials>;
}

/// Reads credentials from the standard AWS environment variables.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvCredentialProvider;

impl CredentialProvider for EnvCredentialProvider {
    fn credentials(&self) -> Result<Credentials> {
        let access_key_id = non_empty_var(ACCESS_KEY_ID_VAR).ok_or_else(|| {
            RequestError::Signing(format!("missing {ACCESS_KEY_ID_VAR} environment variable"))
        })?;
        let secret_access_key = non_empty_var(SECRET_ACCESS_KEY_VAR).ok_or_else(|| {
            RequestError::Signing(format!(
                "missing {SECRET_ACCESS_KEY_VAR} environment variable"
            ))
        })?;

        Ok(Credentials {
            access_key_id,
            secret_access_key,
            session_token: non_empty_var(SESSION_TOKEN_VAR),
        })
    }
}

/// Fixed credentials, mostly useful in tests and embedded callers.
#[derive(Clone, Debug)]
pub struct StaticCredentialProvider(Credentials);

impl StaticCredentialProvider {
    pub fn new(credentials: Credentials) -> Self {
        Self(credentials)
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn credentials(&self) -> Result<Credentials> {
        Ok(self.0.clone())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
