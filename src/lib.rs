//! `apigw-request` sends one SigV4-signed HTTP request to an AWS API Gateway
//! endpoint and retries failures on a fixed backoff schedule.
//!
//! The pieces compose as:
//! - [`parse_header_lines`] turns `key: value` lines into [`Headers`]
//! - [`RequestSigner`] signs a [`RequestSpec`] with AWS SigV4
//! - [`HttpExecutor`] sends one signed attempt
//! - [`request_with_retries`] drives attempts and backoff
//! - [`classify`] sorts a final error for reporting
//!
//! [`ApiGatewayClient`] wires them together.

pub mod action;
mod classify;
mod client;
pub mod credentials;
mod error;
mod executor;
mod headers;
#[cfg(test)]
mod log_capture;
mod options;
mod retry;
mod signer;
mod types;

pub use classify::{classify, ClassifiedError, SERVER_RESPONDED_SUMMARY};
pub use client::ApiGatewayClient;
pub use credentials::{CredentialProvider, Credentials, EnvCredentialProvider, StaticCredentialProvider};
pub use error::RequestError;
pub use executor::{Execute, HttpExecutor, REQUEST_TIMEOUT};
pub use headers::{parse_header_block, parse_header_lines};
pub use options::RetryOptions;
pub use retry::{backoff_delay, request_with_retries, RetryState};
pub use signer::{RequestSigner, SignedRequest, DEFAULT_SERVICE};
pub use types::{Headers, RequestSpec, ResponseResult};

pub type Result<T> = std::result::Result<T, RequestError>;
