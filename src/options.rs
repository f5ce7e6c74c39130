/// Configures retry behavior around a single request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RetryOptions {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Base delay in milliseconds for the backoff schedule.
    pub base_delay_ms: u64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
        }
    }
}

impl RetryOptions {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }
}
