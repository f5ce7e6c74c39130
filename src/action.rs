//! Binding between the runner's named inputs/outputs and the client.
//!
//! Inputs arrive as `INPUT_<NAME>` environment variables (name upper-cased,
//! spaces replaced by `_`). Outputs are appended to the file named by
//! `GITHUB_OUTPUT`, or printed as workflow commands when it is unset.

use std::{fs::OpenOptions, io::Write, path::Path, process::ExitCode};

use anyhow::{bail, Context};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    classify::classify, headers::parse_header_block, ApiGatewayClient, Headers, RequestError,
    RequestSpec, ResponseResult, Result, RetryOptions,
};

/// Inputs of one step invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionInputs {
    pub url: String,
    pub method: String,
    pub headers: Option<Headers>,
    pub payload: Option<String>,
    pub region: String,
    pub max_retries: u32,
}

impl ActionInputs {
    /// Reads inputs from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads inputs through `lookup`, which maps an environment variable
    /// name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let input = |name: &str| {
            lookup(&input_var(name))
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let required = |name: &str| {
            input(name).ok_or_else(|| {
                RequestError::InvalidInput(format!("input required and not supplied: {name}"))
            })
        };

        let region = input("aws-region")
            .or_else(|| input("region"))
            .or_else(|| lookup("AWS_REGION").filter(|v| !v.trim().is_empty()))
            .or_else(|| lookup("AWS_DEFAULT_REGION").filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| {
                RequestError::InvalidInput("input required and not supplied: aws-region".to_owned())
            })?;

        let max_retries = match input("max-retries") {
            Some(raw) => raw.parse::<u32>().map_err(|err| {
                RequestError::InvalidInput(format!("invalid max-retries '{raw}': {err}"))
            })?,
            None => RetryOptions::default().max_retries,
        };

        Ok(Self {
            url: required("url")?,
            method: required("method")?,
            headers: input("headers").as_deref().and_then(parse_header_block),
            payload: input("payload"),
            region: region.trim().to_owned(),
            max_retries,
        })
    }

    /// The payload is passed on as a JSON string, so it is serialized again
    /// when signed.
    pub fn to_spec(&self) -> RequestSpec {
        let spec = RequestSpec::new(self.url.clone(), self.region.clone())
            .with_method(self.method.clone())
            .with_headers(self.headers.clone());
        match &self.payload {
            Some(payload) => spec.with_payload(payload.clone()),
            None => spec,
        }
    }

    pub fn retry_options(&self) -> RetryOptions {
        RetryOptions::default().with_max_retries(self.max_retries)
    }
}

fn input_var(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// Outputs set on success.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionOutputs {
    pub status_code: String,
    pub headers: String,
    pub body: String,
}

impl From<&ResponseResult> for ActionOutputs {
    fn from(res: &ResponseResult) -> Self {
        let body = match &res.body {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        Self {
            status_code: res.status_code.to_string(),
            headers: serde_json::to_string(&res.headers).unwrap_or_else(|_| "{}".to_owned()),
            body,
        }
    }
}

impl ActionOutputs {
    fn pairs(&self) -> [(&'static str, &str); 3] {
        [
            ("status-code", self.status_code.as_str()),
            ("headers", self.headers.as_str()),
            ("body", self.body.as_str()),
        ]
    }

    /// Writes outputs to `GITHUB_OUTPUT`, or stdout when it is unset.
    pub fn write_to_runner(&self) -> anyhow::Result<()> {
        match std::env::var_os("GITHUB_OUTPUT") {
            Some(path) if !path.is_empty() => self.write_to_file(Path::new(&path)),
            _ => {
                for (name, value) in self.pairs() {
                    println!("::set-output name={name}::{}", escape_data(value));
                }
                Ok(())
            }
        }
    }

    /// Appends outputs to `path` in the multiline `name<<delimiter` form.
    pub fn write_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());

        let mut buf = String::new();
        for (name, value) in self.pairs() {
            if value.contains(&delimiter) {
                bail!("output '{name}' contains the delimiter {delimiter}");
            }
            buf.push_str(&format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening output file {}", path.display()))?;
        file.write_all(buf.as_bytes())
            .with_context(|| format!("writing output file {}", path.display()))?;
        Ok(())
    }
}

/// Marks the step failed with `message`.
pub fn set_failed(message: &str) {
    println!("::error::{}", escape_data(message));
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Runs the step end to end and returns the process exit code.
pub async fn run() -> ExitCode {
    let inputs = match ActionInputs::from_env() {
        Ok(inputs) => inputs,
        Err(err) => return fail(&err),
    };

    let client = ApiGatewayClient::from_env().with_options(inputs.retry_options());
    let res = match client.request(&inputs.to_spec()).await {
        Ok(res) => res,
        Err(err) => return fail(&err),
    };

    tracing::info!(status = res.status_code, "request succeeded");
    if let Err(err) = ActionOutputs::from(&res).write_to_runner() {
        set_failed(&format!("{err:#}"));
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn fail(err: &RequestError) -> ExitCode {
    let summary = classify(err).report();
    set_failed(&summary);
    ExitCode::FAILURE
}
