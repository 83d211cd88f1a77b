//! Gateways for reading repository activity through Octocrab.
//!
//! The collector only talks to [`RepositoryDataGateway`], so tests can swap
//! in a mock while the Octocrab implementation handles real HTTP requests.

mod client;
mod error_mapping;
mod repository;

pub use repository::OctocrabRepositoryGateway;

use async_trait::async_trait;

use crate::error::RepomonError;
use crate::github::locator::RepositoryLocator;
use crate::github::records::{
    BranchRecord, CommitRecord, CommitStats, IssueRecord, PullRequestRecord, ReviewRecord,
    UserRecord,
};
use crate::report::model::Period;

/// Largest page size GitHub accepts.
pub const MAX_PER_PAGE: u8 = 100;

/// Which pull request listing to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestQuery {
    /// Every open pull request, all pages.
    Open,
    /// The most recently updated pull requests in any state, one page.
    RecentlyUpdated,
}

/// Issue state filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    /// Open issues in default order.
    Open,
    /// Closed issues, most recently updated first.
    Closed,
}

impl IssueState {
    /// Returns the API query value for this state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// One page of the issue listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueQuery {
    /// State filter.
    pub state: IssueState,
    /// 1-based page number.
    pub page: u32,
    /// Page size, at most [`MAX_PER_PAGE`].
    pub per_page: u8,
}

impl IssueQuery {
    /// First full-size page for `state`.
    #[must_use]
    pub const fn first(state: IssueState) -> Self {
        Self {
            state,
            page: 1,
            per_page: MAX_PER_PAGE,
        }
    }

    /// The page after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            ..self
        }
    }
}

/// Remote source of repository activity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryDataGateway: Send + Sync {
    /// List every branch, in the order GitHub returns them.
    async fn list_branches(
        &self,
        locator: &RepositoryLocator,
    ) -> Result<Vec<BranchRecord>, RepomonError>;

    /// List the commits reachable from `branch` authored within `period`.
    async fn list_commits(
        &self,
        locator: &RepositoryLocator,
        branch: &str,
        period: &Period,
    ) -> Result<Vec<CommitRecord>, RepomonError>;

    /// Fetch line-change totals for one commit.
    async fn commit_stats(
        &self,
        locator: &RepositoryLocator,
        sha: &str,
    ) -> Result<CommitStats, RepomonError>;

    /// List pull requests.
    async fn list_pull_requests(
        &self,
        locator: &RepositoryLocator,
        query: PullRequestQuery,
    ) -> Result<Vec<PullRequestRecord>, RepomonError>;

    /// Fetch one page of issues; the listing also contains pull requests.
    async fn list_issues(
        &self,
        locator: &RepositoryLocator,
        query: IssueQuery,
    ) -> Result<Vec<IssueRecord>, RepomonError>;

    /// List the reviews on one pull request.
    async fn list_reviews(
        &self,
        locator: &RepositoryLocator,
        number: u64,
    ) -> Result<Vec<ReviewRecord>, RepomonError>;

    /// Look up an account by login.
    async fn user(&self, login: &str) -> Result<UserRecord, RepomonError>;
}
