//! Open and recently updated pull requests with their review counts.

use std::convert::Infallible;
use std::sync::OnceLock;

use tracing::{debug, warn};

use super::RepositoryCollector;
use crate::error::RepomonError;
use crate::github::gateway::{PullRequestQuery, RepositoryDataGateway};
use crate::github::locator::RepositoryLocator;
use crate::github::records::{PullRequestRecord, ReviewRecord};
use crate::pool::run_bounded;
use crate::report::model::{Period, PullRequest};

impl<G> RepositoryCollector<'_, G>
where
    G: RepositoryDataGateway + ?Sized,
{
    pub(super) async fn open_pull_requests(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<Vec<PullRequest>, RepomonError> {
        let records = self
            .retry
            .run("list open pull requests", || {
                self.gateway
                    .list_pull_requests(repository, PullRequestQuery::Open)
            })
            .await?;
        debug!(count = records.len(), "listed open pull requests");
        Ok(self.materialize_pull_requests(repository, &records).await)
    }

    /// Pull requests of any state whose last update falls inside `period`.
    /// Only the newest page of the listing is scanned.
    pub(super) async fn updated_pull_requests(
        &self,
        repository: &RepositoryLocator,
        period: &Period,
    ) -> Result<Vec<PullRequest>, RepomonError> {
        let records = self
            .retry
            .run("list updated pull requests", || {
                self.gateway
                    .list_pull_requests(repository, PullRequestQuery::RecentlyUpdated)
            })
            .await?;
        let in_window: Vec<PullRequestRecord> = records
            .into_iter()
            .filter(|record| period.contains(record.updated_at))
            .collect();
        debug!(count = in_window.len(), "pull requests updated in window");
        Ok(self.materialize_pull_requests(repository, &in_window).await)
    }

    /// Resolves authors, applies the contributor filter and counts reviews.
    /// Listing order is preserved.
    async fn materialize_pull_requests(
        &self,
        repository: &RepositoryLocator,
        records: &[PullRequestRecord],
    ) -> Vec<PullRequest> {
        let slots: Vec<OnceLock<PullRequest>> = records.iter().map(|_| OnceLock::new()).collect();
        run_bounded(
            records.iter().zip(slots.iter()),
            self.limits.pull_requests,
            |(record, slot)| async move {
                let author = self.resolve_author(repository, record.user.as_ref()).await;
                if self.filter.admits(&author) {
                    let reviews = self.review_count(repository, record.number).await;
                    slot.get_or_init(|| PullRequest {
                        number: record.number,
                        title: record.title.clone(),
                        body: record.body.clone().unwrap_or_default(),
                        author,
                        state: record.state.clone(),
                        created_at: record.created_at,
                        updated_at: record.updated_at,
                        comments: record.comments,
                        reviews,
                        url: record.html_url.clone(),
                        summary: None,
                    });
                }
                Ok::<(), Infallible>(())
            },
        )
        .await
        .unwrap_or_else(|never| match never {});

        slots.into_iter().filter_map(OnceLock::into_inner).collect()
    }

    /// Reviews on one pull request, ignoring bot reviewers when bots are
    /// excluded. A failed listing counts as zero.
    async fn review_count(&self, repository: &RepositoryLocator, number: u64) -> u64 {
        match self
            .retry
            .run("list reviews", || self.gateway.list_reviews(repository, number))
            .await
        {
            Ok(reviews) => {
                let counted = reviews
                    .iter()
                    .filter(|review| !(self.filter.exclude_bots && by_bot(review)))
                    .count();
                u64::try_from(counted).unwrap_or(u64::MAX)
            }
            Err(error) => {
                warn!(number, %error, "review listing unavailable");
                0
            }
        }
    }
}

fn by_bot(review: &ReviewRecord) -> bool {
    review.user.as_ref().is_some_and(|user| user.is_bot())
}
