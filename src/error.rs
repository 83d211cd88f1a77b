//! Error types shared by every stage of report generation.

use std::time::Duration;

use thiserror::Error;

use crate::github::rate_limit::RateLimitInfo;

/// Errors surfaced while validating input, talking to GitHub, summarizing,
/// or rendering the report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepomonError {
    /// A required or malformed run parameter was supplied.
    #[error("invalid parameter `{parameter}`: {reason}")]
    InvalidParameters {
        /// Name of the offending parameter as the operator typed it.
        parameter: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The repository identifier could not be parsed.
    #[error("repository identifier is invalid: {0}")]
    InvalidRepository(String),

    /// The authentication token was missing.
    #[error("GitHub token is required (use --token, GITHUB_TOKEN, or `gh auth login`)")]
    MissingToken,

    /// The authentication token was rejected by GitHub.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// GitHub error message returned with the 401/403 response.
        message: String,
    },

    /// The requested repository does not exist or is not visible.
    #[error("repository not found: {repository}")]
    RepositoryNotFound {
        /// `owner/name` of the repository that was requested.
        repository: String,
    },

    /// A secondary resource returned 404.
    #[error("not found: {message}")]
    NotFound {
        /// Detail describing the missing resource.
        message: String,
    },

    /// GitHub or the summarization endpoint returned an error response.
    #[error("API error{}: {message}", status_suffix(.status))]
    Api {
        /// HTTP status code when the failure carried one.
        status: Option<u16>,
        /// Response detail describing the failure.
        message: String,
    },

    /// Networking failed while calling a remote service.
    #[error("network error: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// GitHub refused the request because the API quota is spent.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Rate limit info when it could be fetched after the failure.
        rate_limit: Option<RateLimitInfo>,
        /// Error message from GitHub.
        message: String,
    },

    /// The summarization endpoint asked the caller to slow down.
    #[error("summarization rate limited: {message}")]
    RateLimited {
        /// Wait the endpoint asked for, when it could be parsed.
        retry_after: Option<Duration>,
        /// Response detail.
        message: String,
    },

    /// The summarization endpoint's quota will not recover within the run.
    #[error("summarization quota exhausted (retry in {wait_seconds}s)")]
    QuotaExhausted {
        /// Wait the endpoint asked for, in seconds.
        wait_seconds: u64,
    },

    /// The summarizer returned something unusable.
    #[error("summarization failed: {message}")]
    Summarization {
        /// Details about the failure.
        message: String,
    },

    /// A prompt or report template failed to load or render.
    #[error("template error: {message}")]
    Template {
        /// Details about the template failure.
        message: String,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },
}

impl RepomonError {
    /// Builds an [`RepomonError::InvalidParameters`] value.
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameters {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Human-readable classification printed ahead of the error detail.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::InvalidParameters { .. } | Self::InvalidRepository(_) => "Invalid parameters",
            Self::MissingToken | Self::Authentication { .. } => "Authentication error",
            Self::RepositoryNotFound { .. } | Self::NotFound { .. } => "Not found",
            Self::Api { .. } => "GitHub API error",
            Self::Network { .. } => "Network error",
            Self::RateLimitExceeded { .. } => "Rate limit exceeded",
            Self::RateLimited { .. } | Self::QuotaExhausted { .. } | Self::Summarization { .. } => {
                "Summarization error"
            }
            Self::Template { .. } => "Template error",
            Self::Configuration { .. } => "Configuration error",
            Self::Io { .. } => "I/O error",
        }
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            Self::NotFound { .. } | Self::RepositoryNotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Rewrites a top-level `NotFound` into a repository-level failure.
    #[must_use]
    pub fn for_repository(self, repository: &str) -> Self {
        match self {
            Self::NotFound { .. } => Self::RepositoryNotFound {
                repository: repository.to_owned(),
            },
            other => other,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" (status {code})")).unwrap_or_default()
}

impl From<std::io::Error> for RepomonError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}
