//! Bounded retries with exponential backoff around single remote calls.
//!
//! Failures are classified before deciding what to do next:
//!
//! - a rate limit carrying a parseable wait sleeps for that wait plus a small
//!   margin, unless the wait exceeds the ceiling, in which case the call fails
//!   with [`RepomonError::QuotaExhausted`];
//! - transient failures (network errors, 5xx responses, messages mentioning
//!   timeouts or connection problems) back off exponentially;
//! - everything else fails on the first attempt.

use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::error::RepomonError;

/// Longest rate-limit wait honoured before giving up, in seconds.
pub const MAX_RATE_LIMIT_WAIT_SECS: u64 = 3_600;

const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(MAX_RATE_LIMIT_WAIT_SECS);
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_WAIT_MARGIN: Duration = Duration::from_secs(2);
const RATE_LIMIT_CODE: &str = "RateLimitReached";
const TRANSIENT_MARKERS: [&str; 6] = ["timeout", "connection", "500", "502", "503", "504"];

/// Compiled once; `None` only if the pattern itself is rejected.
static WAIT_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Please wait (\d+) second").ok());

/// How a failed attempt should be followed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Surface the error immediately.
    Fail,
    /// Sleep for the exponential backoff delay and try again.
    Backoff,
    /// Sleep for the remote-supplied wait plus the margin and try again.
    Wait(Duration),
    /// The remote asked for a wait beyond the ceiling.
    Exhausted {
        /// Requested wait in seconds.
        wait_seconds: u64,
    },
}

/// Retry policy wrapping one remote call at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    wait_margin: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            wait_margin: DEFAULT_WAIT_MARGIN,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given attempt budget and initial backoff.
    ///
    /// An attempt budget of zero is treated as one attempt.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            base_delay,
            wait_margin: DEFAULT_WAIT_MARGIN,
        }
    }

    /// Returns a policy that adds `margin` to every remote-supplied wait.
    #[must_use]
    pub const fn with_wait_margin(mut self, margin: Duration) -> Self {
        self.wait_margin = margin;
        self
    }

    /// Maximum number of attempts per call.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Classifies a failure into the follow-up the policy will take.
    #[must_use]
    pub fn classify(&self, error: &RepomonError) -> RetryDecision {
        match error {
            RepomonError::RateLimited {
                retry_after: Some(wait),
                ..
            } if *wait > MAX_RATE_LIMIT_WAIT => RetryDecision::Exhausted {
                wait_seconds: wait.as_secs(),
            },
            RepomonError::RateLimited {
                retry_after: Some(wait),
                ..
            } => RetryDecision::Wait(*wait),
            RepomonError::Network { .. } => RetryDecision::Backoff,
            RepomonError::Api {
                status: Some(status),
                ..
            } if *status >= 500 => RetryDecision::Backoff,
            RepomonError::Api {
                status: None,
                message,
            } if is_retryable_message(Some(message)) => RetryDecision::Backoff,
            _ => RetryDecision::Fail,
        }
    }

    /// Runs `call` until it succeeds, the failure is not retryable, or the
    /// attempt budget is spent.
    ///
    /// # Errors
    ///
    /// Returns the last failure observed, or
    /// [`RepomonError::QuotaExhausted`] when a rate-limit wait exceeds the
    /// ceiling.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, RepomonError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RepomonError>>,
    {
        let mut attempt = 1;
        let mut backoff = self.base_delay;

        loop {
            let error = match call().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let pause = match self.classify(&error) {
                RetryDecision::Fail => return Err(error),
                RetryDecision::Exhausted { wait_seconds } => {
                    warn!(operation, wait_seconds, "rate limit wait exceeds ceiling");
                    return Err(RepomonError::QuotaExhausted { wait_seconds });
                }
                _ if attempt >= self.max_attempts => return Err(error),
                RetryDecision::Wait(wait) => wait.saturating_add(self.wait_margin),
                RetryDecision::Backoff => {
                    let current = backoff;
                    backoff = backoff.saturating_mul(2);
                    current
                }
            };

            warn!(
                operation,
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = u64::try_from(pause.as_millis()).unwrap_or(u64::MAX),
                %error,
                "retrying after failure"
            );
            tokio::time::sleep(pause).await;
            attempt += 1;
        }
    }
}

/// Reports whether an error message describes a transient failure.
///
/// Absent messages are never retryable.
#[must_use]
pub fn is_retryable_message(message: Option<&str>) -> bool {
    message.is_some_and(|text| {
        let lowered = text.to_lowercase();
        TRANSIENT_MARKERS
            .iter()
            .any(|marker| lowered.contains(marker))
    })
}

/// Outcome of inspecting a rate-limit response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitWait {
    /// Retry after the given wait.
    RetryAfter(Duration),
    /// The wait exceeds [`MAX_RATE_LIMIT_WAIT_SECS`]; do not retry.
    Exhausted {
        /// Requested wait in seconds.
        wait_seconds: u64,
    },
    /// The body did not carry a machine-readable wait.
    Unknown,
}

impl RateLimitWait {
    /// Whether the caller should retry.
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        matches!(self, Self::RetryAfter(_))
    }

    /// Wait to apply before retrying, zero when not retrying.
    #[must_use]
    pub const fn wait(&self) -> Duration {
        match self {
            Self::RetryAfter(wait) => *wait,
            Self::Exhausted { .. } | Self::Unknown => Duration::ZERO,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    error: RateLimitDetail,
}

#[derive(Debug, Deserialize)]
struct RateLimitDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Extracts the wait-time from a `RateLimitReached` response body.
///
/// The body must be JSON of the form
/// `{"error": {"code": "RateLimitReached", "message": "... Please wait N seconds ..."}}`.
#[must_use]
pub fn parse_rate_limit_wait(body: &str) -> RateLimitWait {
    let Ok(parsed) = serde_json::from_str::<RateLimitBody>(body) else {
        return RateLimitWait::Unknown;
    };
    if parsed.error.code != RATE_LIMIT_CODE {
        return RateLimitWait::Unknown;
    }
    let Some(pattern) = WAIT_PATTERN.as_ref() else {
        return RateLimitWait::Unknown;
    };
    let Some(seconds) = pattern
        .captures(&parsed.error.message)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse::<u64>().ok())
    else {
        return RateLimitWait::Unknown;
    };

    if seconds > MAX_RATE_LIMIT_WAIT_SECS {
        RateLimitWait::Exhausted {
            wait_seconds: seconds,
        }
    } else {
        RateLimitWait::RetryAfter(Duration::from_secs(seconds))
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
