use std::time::Duration;

use tokio::time::sleep;

use crate::{executor::Execute, RequestError, RequestSpec, ResponseResult, Result, RetryOptions};

/// Delay before retry number `attempt`: `(1 + attempt) * 2 * base_delay_ms`.
///
/// The schedule is linear and unjittered: with a 1000 ms base the first
/// three retries wait 4, 6 and 8 seconds.
pub fn backoff_delay(attempt: u32, base_delay_ms: u64) -> Duration {
    let factor = (1 + u64::from(attempt)).saturating_mul(2);
    Duration::from_millis(factor.saturating_mul(base_delay_ms))
}

/// Retry bookkeeping for one top-level call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RetryState {
    attempt: u32,
    max_retries: u32,
    base_delay_ms: u64,
}

impl RetryState {
    /// A zero `base_delay_ms` is raised to 1 ms so retries never spin.
    pub fn new(options: &RetryOptions) -> Self {
        Self {
            attempt: 0,
            max_retries: options.max_retries,
            base_delay_ms: options.base_delay_ms.max(1),
        }
    }

    /// Number of failures recorded so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Records a failed attempt.
    ///
    /// Returns the wait before the next attempt, or `None` once retries are
    /// exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_retries {
            return None;
        }
        self.attempt += 1;
        Some(backoff_delay(self.attempt, self.base_delay_ms))
    }
}

/// Runs `spec` through `executor`, retrying failures with [`backoff_delay`].
///
/// Every attempt reuses the same `spec`; the executor signs it again each
/// time. Signing and input errors are returned on the first attempt. Once
/// retries are exhausted the last error is returned exactly as the executor
/// produced it.
pub async fn request_with_retries<E>(
    executor: &E,
    spec: &RequestSpec,
    options: &RetryOptions,
) -> Result<ResponseResult>
where
    E: Execute,
{
    let mut state = RetryState::new(options);
    loop {
        let err = match executor.execute(spec).await {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };
        if !err.is_retryable() {
            return Err(err);
        }
        let Some(delay) = state.next_delay() else {
            return Err(err);
        };

        log_retry(&err, &state);
        sleep(delay).await;
    }
}

fn log_retry(err: &RequestError, state: &RetryState) {
    tracing::info!(
        "request failed with \"{err}\" - retry {} / {}...",
        state.attempt(),
        state.max_retries()
    );
    let response = err
        .response_body()
        .map(|body| body.to_string())
        .unwrap_or_else(|| "undefined".to_owned());
    tracing::info!("response: {response}");
}
