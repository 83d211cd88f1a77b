//! Maps Octocrab failures onto [`RepomonError`].

use http::StatusCode;

use crate::error::RepomonError;

/// Checks if a GitHub error status indicates an authentication failure.
const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// Checks if an octocrab error represents a network/transport issue.
const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// Checks whether the GitHub error represents a rate limit error based on the
/// HTTP status and message / documentation URL content.
pub(super) fn is_rate_limit_error(source: &octocrab::GitHubError) -> bool {
    let is_rate_limit_status = matches!(
        source.status_code,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    );

    let message_indicates_rate_limit = source.message.to_lowercase().contains("rate limit")
        || source
            .documentation_url
            .as_deref()
            .is_some_and(|url| url.contains("rate-limit"));

    is_rate_limit_status && message_indicates_rate_limit
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> RepomonError {
    if let octocrab::Error::GitHub { source, .. } = error {
        let status = source.status_code;
        let detail = format!(
            "{operation} failed: GitHub returned {status} {message}",
            message = source.message
        );
        return if status == StatusCode::NOT_FOUND {
            RepomonError::NotFound { message: detail }
        } else if is_auth_failure(status) {
            RepomonError::Authentication { message: detail }
        } else {
            RepomonError::Api {
                status: Some(status.as_u16()),
                message: detail,
            }
        };
    }

    if is_network_error(error) {
        return RepomonError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    RepomonError::Api {
        status: None,
        message: format!("{operation} failed: {error}"),
    }
}
