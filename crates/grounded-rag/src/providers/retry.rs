//! Exponential-backoff retry for provider requests

use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::{ProviderHttpConfig, RETRY_BASE_DELAY_SECS};
use crate::error::{Error, Result};

/// A failed request attempt, classified for retry
#[derive(Debug)]
pub enum AttemptError {
    /// Connection failure, timeout, 429 or 5xx
    Transient(Error),
    /// Anything a resend cannot fix (other 4xx, unparseable body)
    Permanent(Error),
}

impl AttemptError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: StatusCode, error: Error) -> Self {
        if is_retryable_status(status) {
            Self::Transient(error)
        } else {
            Self::Permanent(error)
        }
    }

    /// Classify a failure to send the request or receive a response
    pub fn from_send(source: &reqwest::Error, error: Error) -> Self {
        if source.is_timeout() || source.is_connect() {
            Self::Transient(error)
        } else {
            Self::Permanent(error)
        }
    }

    fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    fn into_error(self) -> Error {
        match self {
            Self::Transient(e) | Self::Permanent(e) => e,
        }
    }
}

impl From<Error> for AttemptError {
    fn from(error: Error) -> Self {
        Self::Permanent(error)
    }
}

/// Statuses worth resending: rate limiting and server errors
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// How often and how patiently to retry a failed request
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ProviderHttpConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_secs(RETRY_BASE_DELAY_SECS),
        }
    }

    /// Run `operation` until it succeeds, fails permanently or retries are exhausted
    pub async fn run<F, Fut, T>(&self, label: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, AttemptError>>,
    {
        let mut attempt = 0;

        loop {
            let failure = match operation().await {
                Ok(result) => return Ok(result),
                Err(failure) => failure,
            };

            if !failure.is_transient() {
                return Err(failure.into_error());
            }
            if attempt >= self.max_retries {
                return Err(failure.into_error());
            }

            let delay = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
            tracing::warn!(
                "{} failed (attempt {}/{}): {}, retrying in {:?}",
                label,
                attempt + 1,
                self.max_retries.saturating_add(1),
                failure.into_error(),
                delay
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}
