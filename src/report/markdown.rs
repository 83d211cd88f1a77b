//! Markdown rendering of a finished report.
//!
//! The layout is a `minijinja` template. The embedded default lives in
//! `templates/report.md.j2`; a user-supplied template is rendered against the
//! same context.
//!
//! # Template context
//!
//! - `repository`, `repository_url`, `period`, `generated_at`
//! - `stats`: `total_commits`, `total_authors`, `open_pull_requests`,
//!   `open_issues`, `closed_issues`, `total_reviews`
//! - `overall_summary`
//! - `branches`: `name`, `summary`, `commit_count`, `added`, `deleted`,
//!   `authors`, `commits` (`short_sha`, `headline`, `author`, `date`, `url`,
//!   `added`, `deleted`)
//! - `open_pull_requests`, `updated_pull_requests`: `number`, `title`, `url`,
//!   `author`, `state`, `created_at`, `updated_at`, `comments`, `reviews`,
//!   `summary`
//! - `open_issues`, `closed_issues`: `number`, `title`, `url`, `author`,
//!   `labels`, `assignees`, `created_at`, `closed_at`
//! - `authors`: `display`, `commits`, `added`, `deleted`, `pull_requests`,
//!   `issues`, `reviews`, `branches`
//! - `enrichment`: `attempted`, `succeeded`, `failed`

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use minijinja::{AutoEscape, Environment, context};
use serde::Serialize;

use super::model::{Author, AuthorStats, Branch, Commit, Issue, PullRequest, ReportData};
use crate::ai::EnrichmentReport;
use crate::error::RepomonError;

const DEFAULT_TEMPLATE: &str = include_str!("../../templates/report.md.j2");
const TEMPLATE_NAME: &str = "report";
const NO_SUMMARY: &str = "No summary available.";

/// Renders [`ReportData`] to Markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownRenderer {
    source: String,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::with_template(DEFAULT_TEMPLATE)
    }
}

impl MarkdownRenderer {
    /// Renderer using the embedded layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer using `source` as the template.
    #[must_use]
    pub fn with_template(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Renderer using the template stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RepomonError::Io`] when the file cannot be read.
    pub fn from_path(path: &Utf8Path) -> Result<Self, RepomonError> {
        let source = std::fs::read_to_string(path).map_err(|error| RepomonError::Io {
            message: format!("failed to read report template {path}: {error}"),
        })?;
        Ok(Self::with_template(source))
    }

    /// Renders `data` with the enrichment counts in the footer.
    ///
    /// # Errors
    ///
    /// Returns [`RepomonError::Template`] when the template has syntax errors
    /// or fails while rendering.
    pub fn render(
        &self,
        data: &ReportData,
        enrichment: &EnrichmentReport,
    ) -> Result<String, RepomonError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);

        env.add_template(TEMPLATE_NAME, &self.source)
            .map_err(|error| RepomonError::Template {
                message: format!("invalid report template syntax: {error}"),
            })?;
        let template = env
            .get_template(TEMPLATE_NAME)
            .map_err(|error| RepomonError::Template {
                message: format!("failed to retrieve report template: {error}"),
            })?;

        let ctx = context! {
            repository => &data.repository,
            repository_url => &data.repository_url,
            period => data.period.describe(),
            generated_at => data.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            stats => StatsView::from(data),
            overall_summary => data.overall_summary.as_deref().unwrap_or(NO_SUMMARY),
            branches => data.branches.iter().map(BranchView::from).collect::<Vec<_>>(),
            open_pull_requests => pull_request_views(&data.open_pull_requests),
            updated_pull_requests => pull_request_views(&data.updated_pull_requests),
            open_issues => issue_views(&data.open_issues),
            closed_issues => issue_views(&data.closed_issues),
            authors => data.author_stats.iter().map(AuthorView::from).collect::<Vec<_>>(),
            enrichment => EnrichmentView::from(enrichment),
        };

        template
            .render(ctx)
            .map_err(|error| RepomonError::Template {
                message: format!("report rendering failed: {error}"),
            })
    }
}

#[derive(Debug, Serialize)]
struct StatsView {
    total_commits: u64,
    total_authors: u64,
    open_pull_requests: u64,
    open_issues: u64,
    closed_issues: u64,
    total_reviews: u64,
}

impl From<&ReportData> for StatsView {
    fn from(data: &ReportData) -> Self {
        let stats = data.overall_stats;
        Self {
            total_commits: stats.total_commits,
            total_authors: stats.total_authors,
            open_pull_requests: stats.open_pull_requests,
            open_issues: stats.open_issues,
            closed_issues: stats.closed_issues,
            total_reviews: stats.total_reviews,
        }
    }
}

#[derive(Debug, Serialize)]
struct BranchView {
    name: String,
    summary: Option<String>,
    commit_count: usize,
    added: u64,
    deleted: u64,
    authors: String,
    commits: Vec<CommitView>,
}

impl From<&Branch> for BranchView {
    fn from(branch: &Branch) -> Self {
        Self {
            name: branch.name.clone(),
            summary: branch.summary.clone(),
            commit_count: branch.commits.len(),
            added: branch.total_added,
            deleted: branch.total_deleted,
            authors: if branch.authors.is_empty() {
                "unknown".to_owned()
            } else {
                branch.authors.join(", ")
            },
            commits: branch.commits.iter().map(CommitView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CommitView {
    short_sha: String,
    headline: String,
    author: String,
    date: String,
    url: String,
    added: u64,
    deleted: u64,
}

impl From<&Commit> for CommitView {
    fn from(commit: &Commit) -> Self {
        Self {
            short_sha: commit.short_sha(),
            headline: commit.headline(),
            author: commit.author.login.clone(),
            date: format_date(commit.timestamp),
            url: commit.url.clone(),
            added: commit.additions,
            deleted: commit.deletions,
        }
    }
}

#[derive(Debug, Serialize)]
struct PullRequestView {
    number: u64,
    title: String,
    url: String,
    author: String,
    state: String,
    created_at: String,
    updated_at: String,
    comments: u64,
    reviews: u64,
    summary: Option<String>,
}

fn pull_request_views(pull_requests: &[PullRequest]) -> Vec<PullRequestView> {
    pull_requests
        .iter()
        .map(|pull_request| PullRequestView {
            number: pull_request.number,
            title: pull_request.title.clone(),
            url: pull_request.url.clone(),
            author: author_link(&pull_request.author),
            state: pull_request.state.clone(),
            created_at: format_date(pull_request.created_at),
            updated_at: format_date(pull_request.updated_at),
            comments: pull_request.comments,
            reviews: pull_request.reviews,
            summary: pull_request.summary.clone(),
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct IssueView {
    number: u64,
    title: String,
    url: String,
    author: String,
    labels: String,
    assignees: String,
    created_at: String,
    closed_at: String,
}

fn issue_views(issues: &[Issue]) -> Vec<IssueView> {
    issues
        .iter()
        .map(|issue| IssueView {
            number: issue.number,
            title: issue.title.clone(),
            url: issue.url.clone(),
            author: author_link(&issue.author),
            labels: issue.labels.join(", "),
            assignees: issue
                .assignees
                .iter()
                .map(|assignee| assignee.login.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            created_at: format_date(issue.created_at),
            closed_at: issue.closed_at.map(format_date).unwrap_or_default(),
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct AuthorView {
    display: String,
    commits: u64,
    added: u64,
    deleted: u64,
    pull_requests: u64,
    issues: u64,
    reviews: u64,
    branches: String,
}

impl From<&AuthorStats> for AuthorView {
    fn from(stats: &AuthorStats) -> Self {
        let mut display = author_link(&stats.author);
        if !stats.author.name.is_empty() && stats.author.name != stats.author.login {
            display.push_str(&format!(" ({})", stats.author.name));
        }
        if stats.author.is_bot {
            display.push_str(" [bot]");
        }
        Self {
            display,
            commits: stats.total_commits,
            added: stats.total_added,
            deleted: stats.total_deleted,
            pull_requests: stats.prs_created,
            issues: stats.issues_created,
            reviews: stats.reviews,
            branches: stats
                .branch_activity
                .iter()
                .map(|(name, activity)| format!("{name} ({})", activity.commits))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Debug, Serialize)]
struct EnrichmentView {
    attempted: u64,
    succeeded: u64,
    failed: u64,
}

impl From<&EnrichmentReport> for EnrichmentView {
    fn from(report: &EnrichmentReport) -> Self {
        Self {
            attempted: report.attempted,
            succeeded: report.succeeded,
            failed: report.failed,
        }
    }
}

fn author_link(author: &Author) -> String {
    if author.profile_url.is_empty() {
        author.login.clone()
    } else {
        format!("[{}]({})", author.login, author.profile_url)
    }
}

fn format_date(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
#[path = "markdown_tests.rs"]
mod tests;
