//! Run configuration loaded from CLI, environment, and files.
//!
//! Values are merged with ortho-config's layered approach, lowest to highest
//! precedence:
//!
//! 1. **Defaults** – built-in values
//! 2. **Configuration file** – `.repomon.toml` in the current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `REPOMON_*`
//! 4. **Command-line arguments**
//!
//! # Configuration File
//!
//! ```toml
//! repo = "octocat/hello-world"
//! days = 7
//! exclude_bots = true
//! language = "english"
//! model = "gpt-4o"
//! ```

use std::env;
use std::process::Command;

use chrono::{DateTime, Utc};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ai::enrich::DEFAULT_LANGUAGE;
use crate::ai::openai::{DEFAULT_MODEL, OpenAiConfig};
use crate::collect::ContributorFilter;
use crate::error::RepomonError;
use crate::github::locator::{PersonalAccessToken, RepositoryLocator};
use crate::report::model::Period;

const DEFAULT_DAYS: u32 = 1;

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use repomon::RepomonConfig;
/// use ortho_config::OrthoConfig;
///
/// let config = RepomonConfig::load().expect("failed to load configuration");
/// let repository = config.require_repository().expect("repository required");
/// let period = config.resolve_period(chrono::Utc::now()).expect("valid period");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "REPOMON",
    discovery(
        dotfile_name = ".repomon.toml",
        config_file_name = "repomon.toml",
        app_name = "repomon"
    )
)]
pub struct RepomonConfig {
    /// Repository as `owner/repo` or a repository URL.
    ///
    /// Can be provided via:
    /// - CLI: `--repo <REPO>` or `-r <REPO>`
    /// - Environment: `REPOMON_REPO`
    /// - Config file: `repo = "..."`
    #[ortho_config(cli_short = 'r')]
    pub repo: Option<String>,

    /// Report on the last N days, ending now.
    ///
    /// Defaults to one day when neither `days` nor a date range is given.
    #[ortho_config(cli_short = 'd')]
    pub days: Option<u32>,

    /// First day of the window, `YYYY-MM-DD`. Requires `to`.
    #[ortho_config(cli_short = 'f')]
    pub from: Option<String>,

    /// Last day of the window, `YYYY-MM-DD`, inclusive. Requires `from`.
    #[ortho_config(cli_short = 't')]
    pub to: Option<String>,

    /// Only report contributions by this login.
    #[ortho_config(cli_short = 'u')]
    pub user: Option<String>,

    /// Drop contributions by automation accounts.
    #[ortho_config(cli_short = 'x')]
    pub exclude_bots: bool,

    /// Summarization model.
    #[ortho_config(cli_short = 'm')]
    pub model: String,

    /// Language the summaries are written in.
    #[ortho_config(cli_short = 'l')]
    pub language: String,

    /// Skip summary generation entirely.
    ///
    /// Note: `REPOMON_NO_AI` is not read because `ortho_config` does not load
    /// boolean values from the environment.
    #[ortho_config(cli_short = 'n')]
    pub no_ai: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[ortho_config(cli_short = 'v')]
    pub verbose: bool,

    /// GitHub personal access token.
    ///
    /// Can be provided via:
    /// - CLI: `--token <TOKEN>` or `-k <TOKEN>`
    /// - Environment: `REPOMON_TOKEN` or `GITHUB_TOKEN`
    /// - `gh auth token` when neither is set
    #[ortho_config(cli_short = 'k')]
    pub token: Option<String>,

    /// Base URL of the OpenAI-compatible summarization endpoint.
    #[ortho_config(cli_short = 'B')]
    pub ai_base_url: Option<String>,

    /// API key for the summarization endpoint; defaults to the GitHub token.
    #[ortho_config(cli_short = 'K')]
    pub ai_api_key: Option<String>,

    /// Path of a minijinja template replacing the built-in report layout.
    #[ortho_config(cli_short = 'T')]
    pub template: Option<String>,

    /// Directory holding `{name}.prompt.yml` overrides.
    #[ortho_config(cli_short = 'P')]
    pub prompts_dir: Option<String>,

    /// Write the report to this file instead of standard output.
    #[ortho_config(cli_short = 'o')]
    pub output: Option<String>,
}

impl Default for RepomonConfig {
    fn default() -> Self {
        Self {
            repo: None,
            days: None,
            from: None,
            to: None,
            user: None,
            exclude_bots: false,
            model: DEFAULT_MODEL.to_owned(),
            language: DEFAULT_LANGUAGE.to_owned(),
            no_ai: false,
            verbose: false,
            token: None,
            ai_base_url: None,
            ai_api_key: None,
            template: None,
            prompts_dir: None,
            output: None,
        }
    }
}

impl RepomonConfig {
    /// Parses the configured repository.
    ///
    /// # Errors
    ///
    /// Returns [`RepomonError::InvalidParameters`] when no repository is
    /// configured and [`RepomonError::InvalidRepository`] when it is malformed.
    pub fn require_repository(&self) -> Result<RepositoryLocator, RepomonError> {
        let repo = self
            .repo
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                RepomonError::invalid_parameter("repo", "a repository is required (use --repo or -r)")
            })?;
        RepositoryLocator::from_identifier(repo)
    }

    /// Resolves the reporting window relative to `now`.
    ///
    /// # Errors
    ///
    /// Returns [`RepomonError::InvalidParameters`] when `days` is combined
    /// with dates, when only one date is given, when a date is malformed, when
    /// `from` is after `to`, or when `days` is zero.
    pub fn resolve_period(&self, now: DateTime<Utc>) -> Result<Period, RepomonError> {
        match (self.days, self.from.as_deref(), self.to.as_deref()) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(RepomonError::invalid_parameter(
                "days",
                "cannot be combined with --from/--to",
            )),
            (None, Some(from), Some(to)) => Period::parse_dates(from, to),
            (None, Some(_), None) => Err(RepomonError::invalid_parameter(
                "to",
                "--from requires --to",
            )),
            (None, None, Some(_)) => Err(RepomonError::invalid_parameter(
                "from",
                "--to requires --from",
            )),
            (days, None, None) => Period::last_days(days.unwrap_or(DEFAULT_DAYS), now),
        }
    }

    /// Resolves the GitHub token from configuration, `GITHUB_TOKEN`, or the
    /// GitHub CLI, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`RepomonError::MissingToken`] when no source yields a
    /// non-blank token.
    pub fn resolve_token(&self) -> Result<PersonalAccessToken, RepomonError> {
        self.resolve_token_from(env::var("GITHUB_TOKEN").ok(), gh_auth_token)
    }

    fn resolve_token_from(
        &self,
        github_token: Option<String>,
        gh_cli: impl FnOnce() -> Option<String>,
    ) -> Result<PersonalAccessToken, RepomonError> {
        let token = non_blank(self.token.clone())
            .or_else(|| non_blank(github_token))
            .or_else(|| non_blank(gh_cli()))
            .ok_or(RepomonError::MissingToken)?;
        PersonalAccessToken::new(token)
    }

    /// Contributor filter built from `exclude_bots` and `user`.
    #[must_use]
    pub fn contributor_filter(&self) -> ContributorFilter {
        ContributorFilter {
            exclude_bots: self.exclude_bots,
            user: non_blank(self.user.clone()),
        }
    }

    /// Summarizer endpoint settings, or `None` when summaries are disabled.
    ///
    /// The key comes from `ai_api_key`, then `OPENAI_API_KEY`, then the
    /// GitHub token.
    #[must_use]
    pub fn summarizer_settings(&self, github_token: &PersonalAccessToken) -> Option<OpenAiConfig> {
        self.summarizer_settings_from(github_token, env::var("OPENAI_API_KEY").ok())
    }

    fn summarizer_settings_from(
        &self,
        github_token: &PersonalAccessToken,
        openai_key: Option<String>,
    ) -> Option<OpenAiConfig> {
        if self.no_ai {
            return None;
        }
        let key = non_blank(self.ai_api_key.clone())
            .or_else(|| non_blank(openai_key))
            .unwrap_or_else(|| github_token.value().to_owned());

        let mut settings = OpenAiConfig::new(key);
        if let Some(base_url) = non_blank(self.ai_base_url.clone()) {
            settings = settings.with_base_url(base_url);
        }
        if let Some(model) = non_blank(Some(self.model.clone())) {
            settings = settings.with_model(model);
        }
        Some(settings)
    }

    /// Summary language, falling back to English when blank.
    #[must_use]
    pub fn language(&self) -> &str {
        let language = self.language.trim();
        if language.is_empty() {
            DEFAULT_LANGUAGE
        } else {
            language
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

fn gh_auth_token() -> Option<String> {
    let output = Command::new("gh").args(["auth", "token"]).output().ok()?;
    if !output.status.success() {
        debug!(status = %output.status, "`gh auth token` did not return a token");
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

#[cfg(test)]
mod tests;
