//! Domain model for one repository activity report.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

use crate::error::RepomonError;

const HEADLINE_LIMIT: usize = 72;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reporting window; `from` never exceeds `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl Period {
    /// Creates a window from explicit timestamps.
    ///
    /// # Errors
    ///
    /// Returns `RepomonError::InvalidParameters` when `from` is after `to`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, RepomonError> {
        if from > to {
            return Err(RepomonError::invalid_parameter(
                "from",
                format!(
                    "start date {} is after end date {}",
                    from.format(DATE_FORMAT),
                    to.format(DATE_FORMAT)
                ),
            ));
        }
        Ok(Self { from, to })
    }

    /// Window covering whole UTC days from `from` through `to` inclusive.
    ///
    /// # Errors
    ///
    /// Returns `RepomonError::InvalidParameters` when `from` is after `to`.
    pub fn from_dates(from: NaiveDate, to: NaiveDate) -> Result<Self, RepomonError> {
        let start = from.and_time(NaiveTime::MIN).and_utc();
        let end = to
            .and_hms_opt(23, 59, 59)
            .map_or(start, |end_of_day| end_of_day.and_utc());
        Self::new(start, end)
    }

    /// Parses a `YYYY-MM-DD` pair into a whole-day window.
    ///
    /// # Errors
    ///
    /// Returns `RepomonError::InvalidParameters` naming the malformed date,
    /// or when `from` is after `to`.
    pub fn parse_dates(from: &str, to: &str) -> Result<Self, RepomonError> {
        let start = parse_date("from", from)?;
        let end = parse_date("to", to)?;
        Self::from_dates(start, end)
    }

    /// Window ending at `now` and reaching back `days` days.
    ///
    /// # Errors
    ///
    /// Returns `RepomonError::InvalidParameters` when `days` is zero.
    pub fn last_days(days: u32, now: DateTime<Utc>) -> Result<Self, RepomonError> {
        if days == 0 {
            return Err(RepomonError::invalid_parameter(
                "days",
                "must be at least 1",
            ));
        }
        let start = TimeDelta::try_days(i64::from(days))
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or_else(|| {
                RepomonError::invalid_parameter("days", "window starts before the supported range")
            })?;
        Self::new(start, now)
    }

    /// Start of the window.
    #[must_use]
    pub const fn from(&self) -> DateTime<Utc> {
        self.from
    }

    /// End of the window.
    #[must_use]
    pub const fn to(&self) -> DateTime<Utc> {
        self.to
    }

    /// Inclusive membership test.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant <= self.to
    }

    /// `YYYY-MM-DD to YYYY-MM-DD`.
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "{} to {}",
            self.from.format(DATE_FORMAT),
            self.to.format(DATE_FORMAT)
        )
    }
}

fn parse_date(parameter: &str, value: &str) -> Result<NaiveDate, RepomonError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|error| {
        RepomonError::invalid_parameter(parameter, format!("`{value}` is not YYYY-MM-DD: {error}"))
    })
}

/// A contributor identity; two authors are the same iff their logins match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    /// Login, or the raw git author name for unlinked commits.
    pub login: String,
    /// Display name, empty when unknown.
    pub name: String,
    /// Profile URL.
    pub profile_url: String,
    /// Whether the account is an automation account.
    pub is_bot: bool,
}

/// A commit within one branch's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Commit SHA.
    pub sha: String,
    /// Full commit message.
    pub message: String,
    /// Commit author.
    pub author: Author,
    /// Authoring time.
    pub timestamp: DateTime<Utc>,
    /// Lines added; zero when stats were unavailable.
    pub additions: u64,
    /// Lines removed; zero when stats were unavailable.
    pub deletions: u64,
    /// Browser URL.
    pub url: String,
}

impl Commit {
    /// First line of the message, truncated to 72 characters.
    #[must_use]
    pub fn headline(&self) -> String {
        let first_line = self.message.lines().next().unwrap_or_default().trim_end();
        if first_line.chars().count() <= HEADLINE_LIMIT {
            return first_line.to_owned();
        }
        let mut short: String = first_line.chars().take(HEADLINE_LIMIT - 3).collect();
        short.push_str("...");
        short
    }

    /// Seven-character SHA prefix.
    #[must_use]
    pub fn short_sha(&self) -> String {
        self.sha.chars().take(7).collect()
    }
}

/// A branch with at least one commit in the reporting window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Branch name.
    pub name: String,
    /// Commits in listing order.
    pub commits: Vec<Commit>,
    /// Sum of additions across commits.
    pub total_added: u64,
    /// Sum of deletions across commits.
    pub total_deleted: u64,
    /// Sorted unique non-empty author logins.
    pub authors: Vec<String>,
    /// Narrative summary, filled by enrichment.
    pub summary: Option<String>,
}

impl Branch {
    /// Derives totals and the author list from `commits`.
    #[must_use]
    pub fn from_commits(name: impl Into<String>, commits: Vec<Commit>) -> Self {
        let total_added = commits.iter().map(|commit| commit.additions).sum();
        let total_deleted = commits.iter().map(|commit| commit.deletions).sum();
        let authors = commits
            .iter()
            .map(|commit| commit.author.login.as_str())
            .filter(|login| !login.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(ToOwned::to_owned)
            .collect();

        Self {
            name: name.into(),
            commits,
            total_added,
            total_deleted,
            authors,
            summary: None,
        }
    }
}

/// A pull request from the open or recently-updated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// Pull request number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Description, empty when absent.
    pub body: String,
    /// Author.
    pub author: Author,
    /// `open` or `closed`.
    pub state: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Issue comment count.
    pub comments: u64,
    /// Review count.
    pub reviews: u64,
    /// Browser URL.
    pub url: String,
    /// Narrative summary, filled by enrichment.
    pub summary: Option<String>,
}

/// An issue from the open or closed-in-window listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Issue number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Description, empty when absent.
    pub body: String,
    /// Author.
    pub author: Author,
    /// `open` or `closed`.
    pub state: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Close time for closed issues.
    pub closed_at: Option<DateTime<Utc>>,
    /// Label names.
    pub labels: Vec<String>,
    /// Assigned contributors.
    pub assignees: Vec<Author>,
    /// Browser URL.
    pub url: String,
}

/// Per-branch slice of an author's commit activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchActivity {
    /// Commits on the branch.
    pub commits: u64,
    /// Lines added on the branch.
    pub added: u64,
    /// Lines removed on the branch.
    pub deleted: u64,
}

/// Everything one author contributed during the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorStats {
    /// The contributor.
    pub author: Author,
    /// Commits across all branches.
    pub total_commits: u64,
    /// Lines added across all branches.
    pub total_added: u64,
    /// Lines removed across all branches.
    pub total_deleted: u64,
    /// Pull requests opened.
    pub prs_created: u64,
    /// Issues opened.
    pub issues_created: u64,
    /// Reviews given; no code path attributes reviews to authors yet.
    pub reviews: u64,
    /// Activity keyed by branch name.
    pub branch_activity: BTreeMap<String, BranchActivity>,
}

impl AuthorStats {
    /// Empty record for `author`.
    #[must_use]
    pub const fn new(author: Author) -> Self {
        Self {
            author,
            total_commits: 0,
            total_added: 0,
            total_deleted: 0,
            prs_created: 0,
            issues_created: 0,
            reviews: 0,
            branch_activity: BTreeMap::new(),
        }
    }
}

/// Repository-wide totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverallStats {
    /// Commits across all branches, counted once per branch.
    pub total_commits: u64,
    /// Distinct commit-author logins.
    pub total_authors: u64,
    /// Open pull requests.
    pub open_pull_requests: u64,
    /// Open issues.
    pub open_issues: u64,
    /// Issues closed within the window.
    pub closed_issues: u64,
    /// Reviews across the union of open and updated pull requests.
    pub total_reviews: u64,
}

/// Root aggregate for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportData {
    /// `owner/name`.
    pub repository: String,
    /// Browser URL of the repository.
    pub repository_url: String,
    /// Reporting window.
    pub period: Period,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Active branches in listing order.
    pub branches: Vec<Branch>,
    /// Currently open pull requests.
    pub open_pull_requests: Vec<PullRequest>,
    /// Pull requests updated within the window.
    pub updated_pull_requests: Vec<PullRequest>,
    /// Currently open issues.
    pub open_issues: Vec<Issue>,
    /// Issues closed within the window.
    pub closed_issues: Vec<Issue>,
    /// Per-author statistics, most commits first.
    pub author_stats: Vec<AuthorStats>,
    /// Repository-wide totals.
    pub overall_stats: OverallStats,
    /// Narrative overview, filled by enrichment.
    pub overall_summary: Option<String>,
}

impl ReportData {
    /// Empty report for `repository` over `period`.
    #[must_use]
    pub fn empty(
        repository: impl Into<String>,
        repository_url: impl Into<String>,
        period: Period,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            repository: repository.into(),
            repository_url: repository_url.into(),
            period,
            generated_at,
            branches: Vec::new(),
            open_pull_requests: Vec::new(),
            updated_pull_requests: Vec::new(),
            open_issues: Vec::new(),
            closed_issues: Vec::new(),
            author_stats: Vec::new(),
            overall_stats: OverallStats::default(),
            overall_summary: None,
        }
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
