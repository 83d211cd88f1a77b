//! Open issues and issues closed within the window.

use std::convert::Infallible;
use std::sync::OnceLock;

use tracing::debug;

use super::{RepositoryCollector, account_author};
use crate::error::RepomonError;
use crate::github::gateway::{IssueQuery, IssueState, RepositoryDataGateway};
use crate::github::locator::RepositoryLocator;
use crate::github::records::IssueRecord;
use crate::pool::run_bounded;
use crate::report::model::{Issue, Period};

impl<G> RepositoryCollector<'_, G>
where
    G: RepositoryDataGateway + ?Sized,
{
    /// Every open issue, paging until a short page. Pull requests in the
    /// listing are skipped.
    pub(super) async fn open_issues(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<Vec<Issue>, RepomonError> {
        let mut query = IssueQuery::first(IssueState::Open);
        let mut open = Vec::new();

        loop {
            let page = self.issue_page(repository, query).await?;
            let last_page = is_short(&page, query);
            open.extend(page.into_iter().filter(|record| !record.is_pull_request()));
            if last_page {
                break;
            }
            query = query.next();
        }

        debug!(count = open.len(), page = query.page, "listed open issues");
        Ok(self.materialize_issues(repository, &open).await)
    }

    /// Issues closed inside `period`.
    ///
    /// The listing is newest-update first, so paging stops after a page that
    /// contained an issue closed before the window, or at the last page. A
    /// page is always scanned to the end because update order and close order
    /// can disagree.
    pub(super) async fn closed_issues(
        &self,
        repository: &RepositoryLocator,
        period: &Period,
    ) -> Result<Vec<Issue>, RepomonError> {
        let mut query = IssueQuery::first(IssueState::Closed);
        let mut closed = Vec::new();

        loop {
            let page = self.issue_page(repository, query).await?;
            let last_page = is_short(&page, query);
            let mut found_older = false;

            for record in page {
                if record.is_pull_request() {
                    continue;
                }
                let Some(closed_at) = record.closed_at else {
                    continue;
                };
                if closed_at < period.from() {
                    found_older = true;
                } else if closed_at <= period.to() {
                    closed.push(record);
                }
            }

            if found_older || last_page {
                break;
            }
            query = query.next();
        }

        debug!(count = closed.len(), page = query.page, "listed closed issues");
        Ok(self.materialize_issues(repository, &closed).await)
    }

    async fn issue_page(
        &self,
        repository: &RepositoryLocator,
        query: IssueQuery,
    ) -> Result<Vec<IssueRecord>, RepomonError> {
        self.retry
            .run("list issues", || self.gateway.list_issues(repository, query))
            .await
    }

    async fn materialize_issues(
        &self,
        repository: &RepositoryLocator,
        records: &[IssueRecord],
    ) -> Vec<Issue> {
        let slots: Vec<OnceLock<Issue>> = records.iter().map(|_| OnceLock::new()).collect();
        run_bounded(
            records.iter().zip(slots.iter()),
            self.limits.issues,
            |(record, slot)| async move {
                let author = self.resolve_author(repository, record.user.as_ref()).await;
                if self.filter.admits(&author) {
                    slot.get_or_init(|| Issue {
                        number: record.number,
                        title: record.title.clone(),
                        body: record.body.clone().unwrap_or_default(),
                        author,
                        state: record.state.clone(),
                        created_at: record.created_at,
                        closed_at: record.closed_at,
                        labels: record
                            .labels
                            .iter()
                            .map(|label| label.name.clone())
                            .collect(),
                        assignees: record
                            .assignees
                            .iter()
                            .map(|user| {
                                self.authors
                                    .get(&user.login)
                                    .unwrap_or_else(|| account_author(repository, user))
                            })
                            .collect(),
                        url: record.html_url.clone(),
                    });
                }
                Ok::<(), Infallible>(())
            },
        )
        .await
        .unwrap_or_else(|never| match never {});

        slots.into_iter().filter_map(OnceLock::into_inner).collect()
    }
}

fn is_short(page: &[IssueRecord], query: IssueQuery) -> bool {
    page.len() < usize::from(query.per_page)
}
