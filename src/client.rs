use std::{fmt, sync::Arc};

use crate::{
    credentials::{CredentialProvider, Credentials, EnvCredentialProvider, StaticCredentialProvider},
    executor::HttpExecutor,
    retry::request_with_retries,
    signer::RequestSigner,
    RequestSpec, ResponseResult, Result, RetryOptions,
};

#[derive(Clone)]
/// Signs and sends requests to SigV4-protected endpoints, with retries.
pub struct ApiGatewayClient {
    executor: HttpExecutor,
    options: RetryOptions,
}

impl fmt::Debug for ApiGatewayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiGatewayClient")
            .field("credentials", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}

impl ApiGatewayClient {
    /// Creates a client that signs with fixed credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self::with_provider(Arc::new(StaticCredentialProvider::new(credentials)))
    }

    /// Creates a client that asks `provider` for credentials on every attempt.
    pub fn with_provider(provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            executor: HttpExecutor::new(RequestSigner::new(provider)),
            options: RetryOptions::default(),
        }
    }

    /// Creates a client that reads credentials from the environment.
    ///
    /// Reads `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and the optional
    /// `AWS_SESSION_TOKEN` at signing time, so missing variables surface as
    /// [`crate::RequestError::Signing`] on the first attempt.
    pub fn from_env() -> Self {
        Self::with_provider(Arc::new(EnvCredentialProvider))
    }

    /// Applies retry options.
    pub fn with_options(mut self, opts: RetryOptions) -> Self {
        self.options = opts;
        self
    }

    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    /// Sends `spec`, retrying with the client's [`RetryOptions`].
    pub async fn request(&self, spec: &RequestSpec) -> Result<ResponseResult> {
        request_with_retries(&self.executor, spec, &self.options).await
    }

    /// Sends `spec` with explicit retry settings.
    pub async fn request_with_retries(
        &self,
        spec: &RequestSpec,
        max_retries: u32,
        base_delay_ms: u64,
    ) -> Result<ResponseResult> {
        let options = RetryOptions {
            max_retries,
            base_delay_ms,
        };
        request_with_retries(&self.executor, spec, &options).await
    }

    /// Sends `spec` exactly once, without retries.
    pub async fn send_once(&self, spec: &RequestSpec) -> Result<ResponseResult> {
        self.executor.send(spec).await
    }
}
