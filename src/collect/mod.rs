//! Concurrent collection of repository activity.
//!
//! [`RepositoryCollector::collect`] runs five independent fetches at once:
//! active branches with their commits, open pull requests, pull requests
//! updated in the window, open issues and issues closed in the window. Each
//! fetch returns its own collection and the results are assembled into a
//! [`ReportData`] once all of them have finished. Any top-level failure fails
//! the whole collection; per-branch, per-commit and per-review failures
//! degrade to empty or zero values instead.

mod branches;
mod issues;
mod pull_requests;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::RepomonError;
use crate::github::authors::AuthorCache;
use crate::github::gateway::RepositoryDataGateway;
use crate::github::locator::RepositoryLocator;
use crate::github::records::UserRecord;
use crate::report::model::{Author, Period, ReportData};
use crate::retry::RetryPolicy;

/// Which contributors make it into the report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributorFilter {
    /// Drop contributions by automation accounts.
    pub exclude_bots: bool,
    /// Keep only contributions by this exact login.
    pub user: Option<String>,
}

impl ContributorFilter {
    /// Whether contributions by `author` are kept.
    #[must_use]
    pub fn admits(&self, author: &Author) -> bool {
        if self.exclude_bots && author.is_bot {
            return false;
        }
        self.user
            .as_deref()
            .is_none_or(|login| login == author.login)
    }
}

/// Concurrency ceilings for the nested fan-outs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionLimits {
    /// Branches whose commits are fetched at once.
    pub branches: usize,
    /// Per-commit stats requests in flight per branch.
    pub commit_stats: usize,
    /// Pull requests whose author and reviews are resolved at once.
    pub pull_requests: usize,
    /// Issues whose author is resolved at once.
    pub issues: usize,
}

impl Default for CollectionLimits {
    fn default() -> Self {
        Self {
            branches: 4,
            commit_stats: 10,
            pull_requests: 5,
            issues: 5,
        }
    }
}

/// Collects one [`ReportData`] through a [`RepositoryDataGateway`].
pub struct RepositoryCollector<'a, G: ?Sized> {
    gateway: &'a G,
    retry: RetryPolicy,
    filter: ContributorFilter,
    limits: CollectionLimits,
    authors: AuthorCache,
}

impl<'a, G> RepositoryCollector<'a, G>
where
    G: RepositoryDataGateway + ?Sized,
{
    /// Creates a collector with the default retry policy and limits.
    #[must_use]
    pub fn new(gateway: &'a G, filter: ContributorFilter) -> Self {
        Self {
            gateway,
            retry: RetryPolicy::default(),
            filter,
            limits: CollectionLimits::default(),
            authors: AuthorCache::new(),
        }
    }

    /// Replaces the retry policy applied to every remote call.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the concurrency ceilings.
    #[must_use]
    pub const fn with_limits(mut self, limits: CollectionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Collects every section of the report for `repository` over `period`.
    ///
    /// Statistics are left at their defaults; see [`crate::report::stats`].
    ///
    /// # Errors
    ///
    /// Returns the first top-level fetch failure. A missing repository is
    /// reported as [`RepomonError::RepositoryNotFound`].
    pub async fn collect(
        &self,
        repository: &RepositoryLocator,
        period: Period,
    ) -> Result<ReportData, RepomonError> {
        let full_name = repository.full_name();
        info!(
            repository = %full_name,
            period = %period.describe(),
            "collecting repository activity"
        );

        let (branches, open_pull_requests, updated_pull_requests, open_issues, closed_issues) =
            tokio::try_join!(
                self.active_branches(repository, &period),
                self.open_pull_requests(repository),
                self.updated_pull_requests(repository, &period),
                self.open_issues(repository),
                self.closed_issues(repository, &period),
            )
            .map_err(|error| error.for_repository(&full_name))?;

        info!(
            branches = branches.len(),
            open_pull_requests = open_pull_requests.len(),
            updated_pull_requests = updated_pull_requests.len(),
            open_issues = open_issues.len(),
            closed_issues = closed_issues.len(),
            "collection finished"
        );

        let mut data =
            ReportData::empty(full_name, repository.html_url(), period, Utc::now());
        data.branches = branches;
        data.open_pull_requests = open_pull_requests;
        data.updated_pull_requests = updated_pull_requests;
        data.open_issues = open_issues;
        data.closed_issues = closed_issues;
        Ok(data)
    }

    /// Resolves the author of a pull request or issue through the cache,
    /// looking the account up on a miss. A failed lookup keeps the login
    /// with an empty display name.
    async fn resolve_author(
        &self,
        repository: &RepositoryLocator,
        user: Option<&UserRecord>,
    ) -> Author {
        let Some(account) = user.filter(|record| !record.login.is_empty()) else {
            return Author::default();
        };
        self.authors
            .get_or_resolve(&account.login, move || async move {
                let name = match self
                    .retry
                    .run("look up user", || self.gateway.user(&account.login))
                    .await
                {
                    Ok(record) => record.name.unwrap_or_default(),
                    Err(error) => {
                        warn!(login = %account.login, %error, "user lookup failed");
                        String::new()
                    }
                };
                Author {
                    name,
                    ..account_author(repository, account)
                }
            })
            .await
    }
}

/// Author built from an embedded account record without a remote lookup.
fn account_author(repository: &RepositoryLocator, user: &UserRecord) -> Author {
    Author {
        login: user.login.clone(),
        name: user.name.clone().unwrap_or_default(),
        profile_url: repository.profile_url(&user.login),
        is_bot: user.is_bot(),
    }
}
