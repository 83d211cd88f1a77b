//! Octocrab-backed repository data gateway.

use async_trait::async_trait;
use chrono::SecondsFormat;
use octocrab::{FromResponse, Octocrab, Page};
use serde::de::DeserializeOwned;

use crate::error::RepomonError;
use crate::github::locator::{PersonalAccessToken, RepositoryLocator};
use crate::github::rate_limit::RateLimitInfo;
use crate::github::records::{
    BranchRecord, CommitDetailRecord, CommitRecord, CommitStats, IssueRecord, PullRequestRecord,
    ReviewRecord, UserRecord,
};
use crate::report::model::Period;

use super::client::build_octocrab_client;
use super::error_mapping::{is_rate_limit_error, map_octocrab_error};
use super::{IssueQuery, IssueState, MAX_PER_PAGE, PullRequestQuery, RepositoryDataGateway};

type Query = Vec<(&'static str, String)>;

/// Octocrab-backed repository gateway.
pub struct OctocrabRepositoryGateway {
    client: Octocrab,
}

impl OctocrabRepositoryGateway {
    /// Creates a new gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Builds an Octocrab client for the given token and repository locator.
    ///
    /// # Errors
    ///
    /// Returns `RepomonError::InvalidRepository` when the base URI cannot be
    /// parsed or `RepomonError::Api` when Octocrab fails to construct a
    /// client.
    pub fn for_token(
        token: &PersonalAccessToken,
        locator: &RepositoryLocator,
    ) -> Result<Self, RepomonError> {
        let octocrab = build_octocrab_client(token, locator.api_base().as_str())?;
        Ok(Self::new(octocrab))
    }

    async fn get_one<R: FromResponse>(
        &self,
        operation: &str,
        path: &str,
        query: &Query,
    ) -> Result<R, RepomonError> {
        match self.client.get(path, Some(query)).await {
            Ok(value) => Ok(value),
            Err(error) => Err(self
                .map_octocrab_error_with_rate_limit(operation, &error)
                .await),
        }
    }

    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        query: &Query,
    ) -> Result<Vec<T>, RepomonError> {
        let first: Page<T> = self.get_one(operation, path, query).await?;
        match self.client.all_pages(first).await {
            Ok(items) => Ok(items),
            Err(error) => Err(self
                .map_octocrab_error_with_rate_limit(operation, &error)
                .await),
        }
    }

    async fn map_octocrab_error_with_rate_limit(
        &self,
        operation: &str,
        error: &octocrab::Error,
    ) -> RepomonError {
        match error {
            octocrab::Error::GitHub { source, .. } if is_rate_limit_error(source) => {
                let rate_limit = self.fetch_rate_limit_info().await;
                let base_message =
                    format!("{operation} failed: {message}", message = source.message);
                let message = match &rate_limit {
                    Some(info) => format!("{base_message} ({})", info.describe()),
                    None => base_message,
                };

                RepomonError::RateLimitExceeded {
                    rate_limit,
                    message,
                }
            }
            _ => map_octocrab_error(operation, error),
        }
    }

    async fn fetch_rate_limit_info(&self) -> Option<RateLimitInfo> {
        let rate = self.client.ratelimit().get().await.ok()?.rate;
        let Ok(limit) = u32::try_from(rate.limit) else {
            return None;
        };
        let Ok(remaining) = u32::try_from(rate.remaining) else {
            return None;
        };
        Some(RateLimitInfo::new(limit, remaining, rate.reset))
    }
}

fn full_page() -> (&'static str, String) {
    ("per_page", MAX_PER_PAGE.to_string())
}

fn timestamp(instant: chrono::DateTime<chrono::Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl RepositoryDataGateway for OctocrabRepositoryGateway {
    async fn list_branches(
        &self,
        locator: &RepositoryLocator,
    ) -> Result<Vec<BranchRecord>, RepomonError> {
        self.get_all_pages(
            "list branches",
            &locator.repo_path("branches"),
            &vec![full_page()],
        )
        .await
    }

    async fn list_commits(
        &self,
        locator: &RepositoryLocator,
        branch: &str,
        period: &Period,
    ) -> Result<Vec<CommitRecord>, RepomonError> {
        let query = vec![
            ("sha", branch.to_owned()),
            ("since", timestamp(period.from())),
            ("until", timestamp(period.to())),
            full_page(),
        ];
        self.get_all_pages("list commits", &locator.repo_path("commits"), &query)
            .await
    }

    async fn commit_stats(
        &self,
        locator: &RepositoryLocator,
        sha: &str,
    ) -> Result<CommitStats, RepomonError> {
        let detail: CommitDetailRecord = self
            .get_one(
                "fetch commit stats",
                &locator.repo_path(&format!("commits/{sha}")),
                &Vec::new(),
            )
            .await?;
        Ok(detail.stats.unwrap_or_default())
    }

    async fn list_pull_requests(
        &self,
        locator: &RepositoryLocator,
        query: PullRequestQuery,
    ) -> Result<Vec<PullRequestRecord>, RepomonError> {
        let path = locator.repo_path("pulls");
        match query {
            PullRequestQuery::Open => {
                let params = vec![("state", "open".to_owned()), full_page()];
                self.get_all_pages("list open pull requests", &path, &params)
                    .await
            }
            PullRequestQuery::RecentlyUpdated => {
                let params = vec![
                    ("state", "all".to_owned()),
                    ("sort", "updated".to_owned()),
                    ("direction", "desc".to_owned()),
                    full_page(),
                ];
                let page: Page<PullRequestRecord> = self
                    .get_one("list updated pull requests", &path, &params)
                    .await?;
                Ok(page.items)
            }
        }
    }

    async fn list_issues(
        &self,
        locator: &RepositoryLocator,
        query: IssueQuery,
    ) -> Result<Vec<IssueRecord>, RepomonError> {
        let mut params = vec![
            ("state", query.state.as_str().to_owned()),
            ("page", query.page.to_string()),
            ("per_page", query.per_page.to_string()),
        ];
        if query.state == IssueState::Closed {
            params.push(("sort", "updated".to_owned()));
            params.push(("direction", "desc".to_owned()));
        }
        self.get_one("list issues", &locator.repo_path("issues"), &params)
            .await
    }

    async fn list_reviews(
        &self,
        locator: &RepositoryLocator,
        number: u64,
    ) -> Result<Vec<ReviewRecord>, RepomonError> {
        self.get_all_pages(
            "list reviews",
            &locator.repo_path(&format!("pulls/{number}/reviews")),
            &vec![full_page()],
        )
        .await
    }

    async fn user(&self, login: &str) -> Result<UserRecord, RepomonError> {
        self.get_one("look up user", &format!("/users/{login}"), &Vec::new())
            .await
    }
}

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;
