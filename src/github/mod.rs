//! GitHub access for activity reports.
//!
//! Wraps Octocrab to resolve repository identifiers, validate personal access
//! tokens and read branches, commits, pull requests, issues and reviews. All
//! failures surface as [`crate::RepomonError`] so callers can classify them
//! without touching Octocrab internals.

pub mod authors;
pub mod gateway;
pub mod locator;
pub mod rate_limit;
pub mod records;

pub use authors::AuthorCache;
pub use gateway::{
    IssueQuery, IssueState, OctocrabRepositoryGateway, PullRequestQuery, RepositoryDataGateway,
};
pub use locator::{PersonalAccessToken, RepositoryLocator, RepositoryName, RepositoryOwner};
pub use rate_limit::RateLimitInfo;
pub use records::is_bot;

#[cfg(test)]
pub use gateway::MockRepositoryDataGateway;
