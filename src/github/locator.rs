//! Repository identifiers, API base derivation, and token validation.

use url::Url;

use crate::error::RepomonError;

const GITHUB_HOST: &str = "github.com";
const GITHUB_API: &str = "https://api.github.com";
const GITHUB_WEB: &str = "https://github.com";

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    pub(crate) fn new(value: &str) -> Result<Self, RepomonError> {
        if value.is_empty() {
            return Err(RepomonError::InvalidRepository(
                "repository owner is empty".to_owned(),
            ));
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub(crate) fn new(value: &str) -> Result<Self, RepomonError> {
        let trimmed = value.strip_suffix(".git").unwrap_or(value);
        if trimmed.is_empty() {
            return Err(RepomonError::InvalidRepository(
                "repository name is empty".to_owned(),
            ));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns `RepomonError::MissingToken` when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, RepomonError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(RepomonError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

fn invalid_url(error: &url::ParseError) -> RepomonError {
    RepomonError::InvalidRepository(error.to_string())
}

/// Derives the API and web base URLs for a host.
///
/// `github.com` maps to the public API; every other host is treated as a
/// GitHub Enterprise server serving its API under `/api/v3`.
fn derive_bases(scheme: &str, host: &str, port: Option<u16>) -> Result<(Url, Url), RepomonError> {
    if host.eq_ignore_ascii_case(GITHUB_HOST) {
        let api = Url::parse(GITHUB_API).map_err(|error| invalid_url(&error))?;
        let web = Url::parse(GITHUB_WEB).map_err(|error| invalid_url(&error))?;
        return Ok((api, web));
    }

    let authority = if host.contains(':') {
        format!("[{host}]")
    } else {
        host.to_owned()
    };
    let mut web = Url::parse(&format!("{scheme}://{authority}"))
        .map_err(|error| invalid_url(&error))?;
    web.set_port(port)
        .map_err(|()| RepomonError::InvalidRepository("invalid port".to_owned()))?;

    let mut api = web.clone();
    api.set_path("api/v3");
    Ok((api, web))
}

/// A GitHub repository and the API base used to reach it.
///
/// # Example
///
/// ```
/// use repomon::github::RepositoryLocator;
///
/// let locator = RepositoryLocator::from_identifier("octo/repo")
///     .expect("should parse repository identifier");
/// assert_eq!(locator.full_name(), "octo/repo");
/// assert_eq!(locator.api_base().as_str(), "https://api.github.com/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocator {
    api_base: Url,
    web_base: Url,
    owner: RepositoryOwner,
    repository: RepositoryName,
}

impl RepositoryLocator {
    /// Creates a repository locator on `github.com`.
    ///
    /// # Errors
    ///
    /// Returns `RepomonError::InvalidRepository` when owner or repo is empty.
    pub fn from_owner_repo(owner: &str, repo: &str) -> Result<Self, RepomonError> {
        let validated_owner = RepositoryOwner::new(owner)?;
        let repository = RepositoryName::new(repo)?;
        let (api_base, web_base) = derive_bases("https", GITHUB_HOST, None)?;

        Ok(Self {
            api_base,
            web_base,
            owner: validated_owner,
            repository,
        })
    }

    /// Parses a repository URL in the form `https://host/<owner>/<repo>`.
    ///
    /// # Errors
    ///
    /// Returns `RepomonError::InvalidRepository` when the URL cannot be parsed
    /// or its path is not `/owner/repo`.
    pub fn parse(input: &str) -> Result<Self, RepomonError> {
        let parsed = Url::parse(input).map_err(|error| invalid_url(&error))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| RepomonError::InvalidRepository("URL must include a host".to_owned()))?;

        let mut segments = parsed
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|segment| !segment.is_empty());
        let (Some(owner_segment), Some(repository_segment), None) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(RepomonError::InvalidRepository(format!(
                "expected /owner/repo in `{input}`"
            )));
        };

        let owner = RepositoryOwner::new(owner_segment)?;
        let repository = RepositoryName::new(repository_segment)?;
        let (api_base, web_base) = derive_bases(parsed.scheme(), host, parsed.port())?;

        Ok(Self {
            api_base,
            web_base,
            owner,
            repository,
        })
    }

    /// Accepts `owner/repo`, `github.com/owner/repo`, or a full repository URL.
    ///
    /// # Errors
    ///
    /// Returns `RepomonError::InvalidRepository` when the identifier matches
    /// none of the accepted shapes.
    pub fn from_identifier(input: &str) -> Result<Self, RepomonError> {
        let trimmed = input.trim().trim_end_matches('/');
        if trimmed.contains("://") {
            return Self::parse(trimmed);
        }

        let parts: Vec<&str> = trimmed.split('/').collect();
        match parts.as_slice() {
            [owner, repo] => Self::from_owner_repo(owner, repo),
            [host, _, _] if host.contains('.') => Self::parse(&format!("https://{trimmed}")),
            _ => Err(RepomonError::InvalidRepository(format!(
                "expected owner/repo or a repository URL, got `{input}`"
            ))),
        }
    }

    /// API base URL derived from the repository host.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    /// `owner/name` form of the repository.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner.as_str(), self.repository.as_str())
    }

    /// Browser URL of the repository.
    #[must_use]
    pub fn html_url(&self) -> String {
        format!(
            "{}/{}",
            self.web_base.as_str().trim_end_matches('/'),
            self.full_name()
        )
    }

    /// Browser URL of a user's profile on the repository's host.
    #[must_use]
    pub fn profile_url(&self, login: &str) -> String {
        format!("{}/{login}", self.web_base.as_str().trim_end_matches('/'))
    }

    pub(crate) fn repo_path(&self, suffix: &str) -> String {
        format!("/repos/{}/{suffix}", self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{PersonalAccessToken, RepositoryLocator};
    use crate::error::RepomonError;

    #[rstest]
    #[case::short_form("octo/repo", "https://api.github.com/", "https://github.com/octo/repo")]
    #[case::url("https://github.com/octo/repo", "https://api.github.com/", "https://github.com/octo/repo")]
    #[case::git_suffix("https://github.com/octo/repo.git", "https://api.github.com/", "https://github.com/octo/repo")]
    #[case::trailing_slash("https://github.com/octo/repo/", "https://api.github.com/", "https://github.com/octo/repo")]
    #[case::bare_host("github.com/octo/repo", "https://api.github.com/", "https://github.com/octo/repo")]
    #[case::enterprise("https://ghe.example.com/octo/repo", "https://ghe.example.com/api/v3", "https://ghe.example.com/octo/repo")]
    #[case::enterprise_port("https://ghe.example.com:8443/octo/repo", "https://ghe.example.com:8443/api/v3", "https://ghe.example.com:8443/octo/repo")]
    fn identifiers_resolve_api_and_web_bases(
        #[case] input: &str,
        #[case] api_base: &str,
        #[case] html_url: &str,
    ) {
        let locator = RepositoryLocator::from_identifier(input).expect("identifier should parse");

        assert_eq!(locator.full_name(), "octo/repo");
        assert_eq!(locator.api_base().as_str(), api_base);
        assert_eq!(locator.html_url(), html_url);
    }

    #[rstest]
    #[case::single_segment("octo")]
    #[case::empty_owner("/repo")]
    #[case::too_deep("https://github.com/octo/repo/pulls")]
    #[case::blank("   ")]
    fn malformed_identifiers_are_rejected(#[case] input: &str) {
        let error = RepositoryLocator::from_identifier(input).expect_err("should reject");
        assert!(
            matches!(error, RepomonError::InvalidRepository(_)),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn repo_paths_are_rooted_at_repository() {
        let locator = RepositoryLocator::from_owner_repo("octo", "repo").expect("valid locator");

        assert_eq!(locator.repo_path("branches"), "/repos/octo/repo/branches");
        assert_eq!(locator.profile_url("hubot"), "https://github.com/hubot");
    }

    #[rstest]
    #[case::empty("")]
    #[case::whitespace("  \n")]
    fn blank_tokens_are_missing(#[case] token: &str) {
        assert_eq!(
            PersonalAccessToken::new(token),
            Err(RepomonError::MissingToken)
        );
    }

    #[test]
    fn tokens_are_trimmed() {
        let token = PersonalAccessToken::new("  ghp_example \n").expect("token should be valid");
        assert_eq!(token.value(), "ghp_example");
    }
}
