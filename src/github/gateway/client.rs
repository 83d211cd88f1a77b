//! Octocrab client construction for the repository gateway.

use std::time::Duration;

use http::Uri;
use octocrab::Octocrab;

use crate::error::RepomonError;
use crate::github::locator::PersonalAccessToken;

use super::error_mapping::map_octocrab_error;

/// Per-request timeout applied to every GitHub call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds an authenticated Octocrab client for the given API base URL.
///
/// # Errors
///
/// Returns `RepomonError::InvalidRepository` when the base URI cannot be
/// parsed or `RepomonError::Api` when Octocrab fails to construct a client.
pub(super) fn build_octocrab_client(
    token: &PersonalAccessToken,
    api_base: &str,
) -> Result<Octocrab, RepomonError> {
    let base_uri: Uri = api_base
        .parse::<Uri>()
        .map_err(|error| RepomonError::InvalidRepository(error.to_string()))?;

    Octocrab::builder()
        .set_connect_timeout(Some(REQUEST_TIMEOUT))
        .set_read_timeout(Some(REQUEST_TIMEOUT))
        .personal_token(token.as_ref())
        .base_uri(base_uri)
        .map_err(|error| RepomonError::Api {
            status: None,
            message: format!("build client failed: {error}"),
        })?
        .build()
        .map_err(|error| map_octocrab_error("build client", &error))
}
