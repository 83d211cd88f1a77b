//! Active branch discovery and commit materialization.

use std::convert::Infallible;
use std::sync::OnceLock;

use tracing::{debug, warn};

use super::RepositoryCollector;
use crate::error::RepomonError;
use crate::github::gateway::RepositoryDataGateway;
use crate::github::locator::RepositoryLocator;
use crate::github::records::{CommitRecord, CommitStats, is_bot};
use crate::pool::run_bounded;
use crate::report::model::{Author, Branch, Commit, Period};

impl<G> RepositoryCollector<'_, G>
where
    G: RepositoryDataGateway + ?Sized,
{
    /// Branches with at least one admitted commit in `period`, in listing
    /// order. A branch whose commits cannot be fetched is skipped.
    pub(super) async fn active_branches(
        &self,
        repository: &RepositoryLocator,
        period: &Period,
    ) -> Result<Vec<Branch>, RepomonError> {
        let listed = self
            .retry
            .run("list branches", || self.gateway.list_branches(repository))
            .await?;
        debug!(count = listed.len(), "listed branches");

        let slots: Vec<OnceLock<Branch>> = listed.iter().map(|_| OnceLock::new()).collect();
        run_bounded(
            listed.iter().zip(slots.iter()),
            self.limits.branches,
            |(record, slot)| async move {
                match self.branch_commits(repository, &record.name, period).await {
                    Ok(commits) if commits.is_empty() => {
                        debug!(branch = %record.name, "no commits in window");
                    }
                    Ok(commits) => {
                        slot.get_or_init(|| Branch::from_commits(record.name.as_str(), commits));
                    }
                    Err(error) => {
                        warn!(branch = %record.name, %error, "skipping branch");
                    }
                }
                Ok::<(), Infallible>(())
            },
        )
        .await
        .unwrap_or_else(|never| match never {});

        Ok(slots.into_iter().filter_map(OnceLock::into_inner).collect())
    }

    /// Admitted commits on `branch` within `period`, with line stats.
    async fn branch_commits(
        &self,
        repository: &RepositoryLocator,
        branch: &str,
        period: &Period,
    ) -> Result<Vec<Commit>, RepomonError> {
        let records = self
            .retry
            .run("list commits", || {
                self.gateway.list_commits(repository, branch, period)
            })
            .await?;

        let admitted: Vec<(CommitRecord, Author)> = records
            .into_iter()
            .filter_map(|record| {
                let author = commit_author(repository, &record);
                self.filter.admits(&author).then_some((record, author))
            })
            .collect();
        let stats = self.commit_stats(repository, &admitted).await;

        Ok(admitted
            .into_iter()
            .zip(stats)
            .map(|((record, author), line_stats)| materialize(record, author, line_stats))
            .collect())
    }

    /// Fetches stats for every commit; a failed fetch counts as zero lines.
    async fn commit_stats(
        &self,
        repository: &RepositoryLocator,
        commits: &[(CommitRecord, Author)],
    ) -> Vec<CommitStats> {
        let slots: Vec<OnceLock<CommitStats>> = commits.iter().map(|_| OnceLock::new()).collect();
        run_bounded(
            commits.iter().zip(slots.iter()),
            self.limits.commit_stats,
            |((record, _), slot)| async move {
                let sha = record.sha.as_str();
                match self
                    .retry
                    .run("fetch commit stats", || {
                        self.gateway.commit_stats(repository, sha)
                    })
                    .await
                {
                    Ok(line_stats) => {
                        slot.get_or_init(|| line_stats);
                    }
                    Err(error) => warn!(sha, %error, "commit stats unavailable"),
                }
                Ok::<(), Infallible>(())
            },
        )
        .await
        .unwrap_or_else(|never| match never {});

        slots
            .into_iter()
            .map(|slot| slot.into_inner().unwrap_or_default())
            .collect()
    }
}

/// Identity of a commit's author. Unlinked commits fall back to the raw git
/// author name.
fn commit_author(repository: &RepositoryLocator, record: &CommitRecord) -> Author {
    let git_name = record
        .commit
        .author
        .as_ref()
        .map(|signature| signature.name.clone())
        .unwrap_or_default();

    match record.author.as_ref() {
        Some(user) if !user.login.is_empty() => Author {
            login: user.login.clone(),
            name: git_name,
            profile_url: repository.profile_url(&user.login),
            is_bot: user.is_bot(),
        },
        _ => Author {
            login: git_name.clone(),
            is_bot: is_bot(&git_name),
            name: git_name,
            profile_url: String::new(),
        },
    }
}

fn materialize(record: CommitRecord, author: Author, line_stats: CommitStats) -> Commit {
    let timestamp = record
        .commit
        .author
        .as_ref()
        .and_then(|signature| signature.date)
        .unwrap_or_default();

    Commit {
        sha: record.sha,
        message: record.commit.message,
        author,
        timestamp,
        additions: line_stats.additions,
        deletions: line_stats.deletions,
        url: record.html_url,
    }
}
