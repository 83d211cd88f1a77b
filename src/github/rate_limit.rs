//! Core API quota snapshot fetched after GitHub refuses a request.

use chrono::{DateTime, Utc};

/// Remaining GitHub core API quota and when it resets.
///
/// # Example
///
/// ```
/// use repomon::github::RateLimitInfo;
///
/// let info = RateLimitInfo::new(5000, 0, 1_700_000_000);
/// assert!(info.is_exhausted());
/// assert_eq!(info.describe(), "0/5000 requests remaining, resets at 2023-11-14 22:13:20 UTC");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    limit: u32,
    remaining: u32,
    reset_at: u64,
}

impl RateLimitInfo {
    /// Creates a new snapshot; `reset_at` is a Unix timestamp.
    #[must_use]
    pub const fn new(limit: u32, remaining: u32, reset_at: u64) -> Self {
        Self {
            limit,
            remaining,
            reset_at,
        }
    }

    /// Maximum requests allowed in the current window.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Requests left in the current window.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Unix timestamp when the window resets.
    #[must_use]
    pub const fn reset_at(&self) -> u64 {
        self.reset_at
    }

    /// Returns true if no requests remain.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Reset time as a UTC timestamp, when representable.
    #[must_use]
    pub fn reset_time(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.reset_at)
            .ok()
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
    }

    /// Operator-facing summary used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        let reset = self.reset_time().map_or_else(
            || self.reset_at.to_string(),
            |time| time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        format!(
            "{}/{} requests remaining, resets at {reset}",
            self.remaining, self.limit
        )
    }
}
