//! Optional narrative enrichment of a collected report.
//!
//! The overall summary is generated first, then every branch in one bounded
//! batch, then the open and updated pull requests as two concurrent batches.
//! A failed call never aborts anything: the item gets deterministic fallback
//! text and the failure is counted. Once the endpoint reports that its quota
//! is exhausted no further calls are dispatched.

use std::convert::Infallible;
use std::sync::OnceLock;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::prompts::{PromptSet, PromptTemplate, PromptVariables};
use super::summarizer::{Summarizer, SummaryRequest};
use crate::error::RepomonError;
use crate::pool::{PoolError, run_bounded_until};
use crate::report::model::{Branch, Issue, PullRequest, ReportData};
use crate::retry::RetryPolicy;

/// Overall summary text when generation failed.
pub const OVERALL_FALLBACK: &str =
    "Summary generation failed. Please check the activity details below.";

/// Overall summary text when enrichment is switched off.
pub const DISABLED_PLACEHOLDER: &str = "AI summary generation was disabled for this report.";

/// Default ceiling for concurrent summary calls.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Language used when none is configured.
pub const DEFAULT_LANGUAGE: &str = "english";

/// Counts of summary calls made while enriching one report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    /// Items that needed a summary.
    pub attempted: u64,
    /// Items that received generated text.
    pub succeeded: u64,
    /// Items that fell back to placeholder text.
    pub failed: u64,
}

impl EnrichmentReport {
    fn record(&mut self, outcome: &SummaryOutcome) {
        self.attempted += 1;
        match outcome {
            SummaryOutcome::Generated(_) => self.succeeded += 1,
            SummaryOutcome::Fallback(_) => self.failed += 1,
        }
    }
}

/// Text produced for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// The summarizer answered.
    Generated(String),
    /// Deterministic placeholder used instead.
    Fallback(String),
}

impl SummaryOutcome {
    /// The text, whichever way it was produced.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Generated(text) | Self::Fallback(text) => text,
        }
    }
}

/// Whether narrative summaries are generated for a run.
pub enum Enrichment {
    /// Only a fixed placeholder is written.
    Disabled,
    /// Summaries come from the wrapped enricher.
    Enabled(Enricher),
}

impl Enrichment {
    /// Fills the summary fields of `data`.
    ///
    /// Statistics should already be computed; the overall prompt reads them.
    pub async fn apply(&self, data: &mut ReportData) -> EnrichmentReport {
        match self {
            Self::Disabled => {
                info!("summary generation disabled");
                data.overall_summary = Some(DISABLED_PLACEHOLDER.to_owned());
                EnrichmentReport::default()
            }
            Self::Enabled(enricher) => enricher.enrich(data).await,
        }
    }
}

/// Generates summaries through a [`Summarizer`].
pub struct Enricher {
    summarizer: Box<dyn Summarizer>,
    prompts: PromptSet,
    language: String,
    retry: RetryPolicy,
    concurrency: usize,
}

impl Enricher {
    /// Creates an enricher writing in `language`.
    #[must_use]
    pub fn new(
        summarizer: Box<dyn Summarizer>,
        prompts: PromptSet,
        language: impl Into<String>,
    ) -> Self {
        Self {
            summarizer,
            prompts,
            language: language.into(),
            retry: RetryPolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Replaces the retry policy wrapped around every call.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the per-batch concurrency ceiling.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Fills every summary field of `data` and reports the call counts.
    pub async fn enrich(&self, data: &mut ReportData) -> EnrichmentReport {
        let quota = QuotaSignal::new();
        let mut report = EnrichmentReport::default();

        info!("generating overall summary");
        let overall = self
            .summarize(
                self.prompts.overall.render(&self.overall_variables(data)),
                &quota,
                "overall summary",
            )
            .await
            .map_or_else(
                || SummaryOutcome::Fallback(OVERALL_FALLBACK.to_owned()),
                SummaryOutcome::Generated,
            );
        report.record(&overall);
        data.overall_summary = Some(overall.into_text());

        info!(count = data.branches.len(), "generating branch summaries");
        let branch_outcomes = self
            .summarize_batch(
                &data.branches,
                &quota,
                |branch| self.branch_variables(branch),
                &self.prompts.branch,
                branch_fallback,
            )
            .await;
        for (branch, outcome) in data.branches.iter_mut().zip(branch_outcomes) {
            report.record(&outcome);
            branch.summary = Some(outcome.into_text());
        }

        info!(
            open = data.open_pull_requests.len(),
            updated = data.updated_pull_requests.len(),
            "generating pull request summaries"
        );
        let (open_outcomes, updated_outcomes) = tokio::join!(
            self.summarize_batch(
                &data.open_pull_requests,
                &quota,
                |pull_request| self.pull_request_variables(pull_request),
                &self.prompts.pull_request,
                pull_request_fallback,
            ),
            self.summarize_batch(
                &data.updated_pull_requests,
                &quota,
                |pull_request| self.pull_request_variables(pull_request),
                &self.prompts.pull_request,
                pull_request_fallback,
            ),
        );
        let pull_requests = data
            .open_pull_requests
            .iter_mut()
            .zip(open_outcomes)
            .chain(data.updated_pull_requests.iter_mut().zip(updated_outcomes));
        for (pull_request, outcome) in pull_requests {
            report.record(&outcome);
            pull_request.summary = Some(outcome.into_text());
        }

        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            "summary generation finished"
        );
        report
    }

    /// Summarizes every item with at most `concurrency` calls in flight.
    /// Items left undispatched after quota exhaustion get fallback text.
    async fn summarize_batch<T, V, F>(
        &self,
        items: &[T],
        quota: &QuotaSignal,
        variables: V,
        prompt: &PromptTemplate,
        fallback: F,
    ) -> Vec<SummaryOutcome>
    where
        V: Fn(&T) -> PromptVariables,
        F: Fn(&T) -> String,
    {
        let slots: Vec<OnceLock<SummaryOutcome>> = items.iter().map(|_| OnceLock::new()).collect();
        let variables = &variables;
        let fallback = &fallback;

        let dispatched = run_bounded_until(
            items.iter().zip(slots.iter()),
            self.concurrency,
            quota.exhausted(),
            |(item, slot)| async move {
                let outcome = self
                    .summarize(prompt.render(&variables(item)), quota, &prompt.name)
                    .await
                    .map_or_else(
                        || SummaryOutcome::Fallback(fallback(item)),
                        SummaryOutcome::Generated,
                    );
                slot.get_or_init(|| outcome);
                Ok::<(), Infallible>(())
            },
        )
        .await;

        if let Err(PoolError::Cancelled(())) = dispatched {
            warn!(
                prompt = %prompt.name,
                "summarization quota exhausted; remaining items use fallback text"
            );
        }

        items
            .iter()
            .zip(slots)
            .map(|(item, slot)| {
                slot.into_inner()
                    .unwrap_or_else(|| SummaryOutcome::Fallback(fallback(item)))
            })
            .collect()
    }

    /// One retried summary call. Failures are logged and yield `None`;
    /// quota exhaustion also trips `quota`.
    async fn summarize(
        &self,
        rendered: Result<SummaryRequest, RepomonError>,
        quota: &QuotaSignal,
        label: &str,
    ) -> Option<String> {
        if quota.is_tripped() {
            debug!(label, "skipping summary after quota exhaustion");
            return None;
        }
        let request = match rendered {
            Ok(request) => request,
            Err(error) => {
                warn!(label, %error, "prompt rendering failed");
                return None;
            }
        };

        match self
            .retry
            .run("summarize", || self.summarizer.complete(&request))
            .await
        {
            Ok(text) => Some(text),
            Err(error) => {
                if matches!(error, RepomonError::QuotaExhausted { .. }) {
                    quota.trip();
                }
                warn!(label, %error, "summary generation failed");
                None
            }
        }
    }

    fn overall_variables(&self, data: &ReportData) -> PromptVariables {
        PromptVariables::from([
            ("language", self.language.clone()),
            ("repo_name", data.repository.clone()),
            ("period", data.period.describe()),
            ("total_commits", data.overall_stats.total_commits.to_string()),
            ("total_authors", data.overall_stats.total_authors.to_string()),
            ("branches", describe_branches(&data.branches)),
            (
                "prs",
                describe_listings(
                    "No pull requests",
                    &[
                        ("Open Pull Requests:", pull_request_lines(&data.open_pull_requests)),
                        (
                            "Updated Pull Requests:",
                            pull_request_lines(&data.updated_pull_requests),
                        ),
                    ],
                ),
            ),
            (
                "issues",
                describe_listings(
                    "No issues",
                    &[
                        ("Open Issues:", issue_lines(&data.open_issues)),
                        ("Closed Issues:", issue_lines(&data.closed_issues)),
                    ],
                ),
            ),
        ])
    }

    fn branch_variables(&self, branch: &Branch) -> PromptVariables {
        let commits = branch
            .commits
            .iter()
            .map(|commit| format!("- {} ({})", commit.headline(), commit.author.login))
            .collect::<Vec<_>>()
            .join("\n");
        PromptVariables::from([
            ("language", self.language.clone()),
            ("branch_name", branch.name.clone()),
            ("commit_count", branch.commits.len().to_string()),
            ("commits", commits),
            ("authors", branch.authors.join(", ")),
        ])
    }

    fn pull_request_variables(&self, pull_request: &PullRequest) -> PromptVariables {
        let description = if pull_request.body.trim().is_empty() {
            "No description provided.".to_owned()
        } else {
            pull_request.body.clone()
        };
        PromptVariables::from([
            ("language", self.language.clone()),
            ("pr_title", pull_request.title.clone()),
            ("pr_number", pull_request.number.to_string()),
            ("pr_author", pull_request.author.login.clone()),
            ("pr_description", description),
            ("comments_count", pull_request.comments.to_string()),
        ])
    }
}

fn branch_fallback(branch: &Branch) -> String {
    format!(
        "Summary unavailable for branch `{}` ({} commits).",
        branch.name,
        branch.commits.len()
    )
}

fn pull_request_fallback(pull_request: &PullRequest) -> String {
    format!(
        "Summary unavailable for pull request #{}: {}.",
        pull_request.number, pull_request.title
    )
}

fn describe_branches(branches: &[Branch]) -> String {
    if branches.is_empty() {
        return "No active branches".to_owned();
    }
    branches
        .iter()
        .map(|branch| {
            format!(
                "- {}: {} commits by {}",
                branch.name,
                branch.commits.len(),
                branch.authors.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn pull_request_lines(pull_requests: &[PullRequest]) -> Vec<String> {
    pull_requests
        .iter()
        .map(|pull_request| {
            format!(
                "- #{}: {} (by {})",
                pull_request.number, pull_request.title, pull_request.author.login
            )
        })
        .collect()
}

fn issue_lines(issues: &[Issue]) -> Vec<String> {
    issues
        .iter()
        .map(|issue| format!("- #{}: {} (by {})", issue.number, issue.title, issue.author.login))
        .collect()
}

/// Joins non-empty headed listings with a blank line between them.
fn describe_listings(empty: &str, sections: &[(&str, Vec<String>)]) -> String {
    let blocks: Vec<String> = sections
        .iter()
        .filter(|(_, lines)| !lines.is_empty())
        .map(|(heading, lines)| format!("{heading}\n{}", lines.join("\n")))
        .collect();
    if blocks.is_empty() {
        empty.to_owned()
    } else {
        blocks.join("\n\n")
    }
}

/// Run-wide flag raised when the summarization quota is spent.
struct QuotaSignal {
    sender: watch::Sender<bool>,
}

impl QuotaSignal {
    fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    fn trip(&self) {
        self.sender.send_replace(true);
    }

    fn is_tripped(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once the flag is raised.
    async fn exhausted(&self) {
        let mut receiver = self.sender.subscribe();
        if receiver.wait_for(|tripped| *tripped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
#[path = "enrich_tests.rs"]
mod tests;
