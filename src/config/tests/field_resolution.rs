//! Tests for field resolution methods (`require_repository`,
//! `resolve_token`, `contributor_filter`, `summarizer_settings`).

use rstest::rstest;

use crate::RepomonConfig;
use crate::error::RepomonError;
use crate::github::locator::PersonalAccessToken;

fn github_token() -> PersonalAccessToken {
    PersonalAccessToken::new("ghp_example").expect("token should be valid")
}

#[rstest]
#[case::owner_repo("octo/repo", "https://api.github.com/")]
#[case::url("https://github.com/octo/repo.git", "https://api.github.com/")]
#[case::enterprise("https://ghe.example.com/octo/repo", "https://ghe.example.com/api/v3")]
fn require_repository_accepts_identifiers(#[case] repo: &str, #[case] api_base: &str) {
    let config = RepomonConfig {
        repo: Some(repo.to_owned()),
        ..Default::default()
    };

    let locator = config.require_repository().expect("repository should parse");

    assert_eq!(locator.full_name(), "octo/repo");
    assert_eq!(locator.api_base().as_str(), api_base);
}

#[rstest]
#[case::absent(None)]
#[case::blank(Some("  "))]
fn require_repository_rejects_missing_values(#[case] repo: Option<&str>) {
    let config = RepomonConfig {
        repo: repo.map(ToOwned::to_owned),
        ..Default::default()
    };

    let error = config.require_repository().expect_err("repository is missing");

    assert!(matches!(
        error,
        RepomonError::InvalidParameters { ref parameter, .. } if parameter == "repo"
    ));
}

#[rstest]
fn require_repository_rejects_malformed_values() {
    let config = RepomonConfig {
        repo: Some("just-a-name".to_owned()),
        ..Default::default()
    };

    let error = config.require_repository().expect_err("identifier is malformed");

    assert!(matches!(error, RepomonError::InvalidRepository(_)));
}

#[rstest]
#[case::configured_wins(Some("config-token"), Some("env-token"), Some("gh-token"), "config-token")]
#[case::environment_next(None, Some("env-token"), Some("gh-token"), "env-token")]
#[case::gh_cli_last(None, None, Some("gh-token\n"), "gh-token")]
#[case::blank_config_skipped(Some("  "), Some("env-token"), None, "env-token")]
fn tokens_resolve_in_order(
    #[case] configured: Option<&str>,
    #[case] environment: Option<&str>,
    #[case] gh_cli: Option<&str>,
    #[case] expected: &str,
) {
    let config = RepomonConfig {
        token: configured.map(ToOwned::to_owned),
        ..Default::default()
    };

    let token = config
        .resolve_token_from(environment.map(ToOwned::to_owned), || {
            gh_cli.map(ToOwned::to_owned)
        })
        .expect("a token source is available");

    assert_eq!(token.value(), expected);
}

#[rstest]
fn missing_tokens_are_reported() {
    let config = RepomonConfig::default();

    let error = config
        .resolve_token_from(None, || None)
        .expect_err("no token source is available");

    assert_eq!(error, RepomonError::MissingToken);
}

#[rstest]
fn resolve_token_reads_github_token_environment() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", Some("legacy-token"))]);
    let config = RepomonConfig::default();

    let token = config.resolve_token().expect("GITHUB_TOKEN should be used");

    assert_eq!(token.value(), "legacy-token");
}

#[rstest]
fn contributor_filter_mirrors_configuration() {
    let config = RepomonConfig {
        exclude_bots: true,
        user: Some(" alice ".to_owned()),
        ..Default::default()
    };

    let filter = config.contributor_filter();

    assert!(filter.exclude_bots);
    assert_eq!(filter.user.as_deref(), Some("alice"));
}

#[rstest]
fn summarizer_settings_are_absent_when_disabled() {
    let config = RepomonConfig {
        no_ai: true,
        ..Default::default()
    };

    assert!(
        config
            .summarizer_settings_from(&github_token(), Some("sk-test".to_owned()))
            .is_none()
    );
}

#[rstest]
#[case::explicit_key(Some("explicit"), Some("sk-env"), "explicit")]
#[case::openai_environment(None, Some("sk-env"), "sk-env")]
#[case::github_token_fallback(None, None, "ghp_example")]
fn summarizer_key_falls_back_to_github_token(
    #[case] explicit: Option<&str>,
    #[case] environment: Option<&str>,
    #[case] expected: &str,
) {
    let config = RepomonConfig {
        ai_api_key: explicit.map(ToOwned::to_owned),
        ..Default::default()
    };

    let settings = config
        .summarizer_settings_from(&github_token(), environment.map(ToOwned::to_owned))
        .expect("summaries are enabled");

    assert_eq!(settings.api_key, expected);
}

#[rstest]
fn summarizer_settings_use_configured_endpoint_and_model() {
    let config = RepomonConfig {
        ai_base_url: Some("http://localhost:8080/v1".to_owned()),
        model: "gpt-4o-mini".to_owned(),
        ..Default::default()
    };

    let settings = config
        .summarizer_settings_from(&github_token(), None)
        .expect("summaries are enabled");

    assert_eq!(settings.base_url, "http://localhost:8080/v1");
    assert_eq!(settings.model, "gpt-4o-mini");
}

#[rstest]
#[case::configured("german", "german")]
#[case::blank("  ", "english")]
fn language_defaults_to_english(#[case] configured: &str, #[case] expected: &str) {
    let config = RepomonConfig {
        language: configured.to_owned(),
        ..Default::default()
    };

    assert_eq!(config.language(), expected);
}
