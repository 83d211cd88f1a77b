//! Wire records returned by the GitHub REST API.
//!
//! Only the fields the collector reads are modelled; everything else in the
//! payload is ignored during deserialisation.

use chrono::{DateTime, Utc};
use serde::Deserialize;

const KNOWN_BOTS: [&str; 3] = ["github-actions", "dependabot", "renovate"];

/// Returns true when `login` looks like an automation account.
///
/// Matches logins ending in `[bot]` and a small set of well-known bots.
///
/// # Example
///
/// ```
/// use repomon::github::is_bot;
///
/// assert!(is_bot("dependabot[bot]"));
/// assert!(is_bot("renovate"));
/// assert!(!is_bot("botmaster"));
/// ```
#[must_use]
pub fn is_bot(login: &str) -> bool {
    login.ends_with("[bot]") || KNOWN_BOTS.contains(&login)
}

/// A GitHub account as embedded in other payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    /// Account login.
    pub login: String,
    /// Account type (`User`, `Bot`, `Organization`).
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
    /// Display name; only present on the `/users/{login}` payload.
    #[serde(default)]
    pub name: Option<String>,
}

impl UserRecord {
    /// Trusts an explicit `Bot` account type, otherwise falls back to the
    /// login heuristic.
    #[must_use]
    pub fn is_bot(&self) -> bool {
        self.account_type.as_deref() == Some("Bot") || is_bot(&self.login)
    }
}

/// Entry from the branch listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BranchRecord {
    /// Branch name.
    pub name: String,
}

/// Entry from the commit listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommitRecord {
    /// Commit SHA.
    pub sha: String,
    /// Git-level commit data.
    pub commit: GitCommitRecord,
    /// Linked GitHub account; absent for unknown or deleted authors.
    #[serde(default)]
    pub author: Option<UserRecord>,
    /// Browser URL of the commit.
    #[serde(default)]
    pub html_url: String,
}

/// Git-level commit data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GitCommitRecord {
    /// Full commit message.
    #[serde(default)]
    pub message: String,
    /// Git author signature.
    #[serde(default)]
    pub author: Option<GitSignatureRecord>,
}

/// Git author signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GitSignatureRecord {
    /// Author name as recorded by git.
    #[serde(default)]
    pub name: String,
    /// Authoring time.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Line-change totals for one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct CommitStats {
    /// Lines added.
    #[serde(default)]
    pub additions: u64,
    /// Lines removed.
    #[serde(default)]
    pub deletions: u64,
}

/// Single-commit payload; only the stats are read.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CommitDetailRecord {
    #[serde(default)]
    pub(crate) stats: Option<CommitStats>,
}

/// Entry from the pull request listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PullRequestRecord {
    /// Pull request number.
    pub number: u64,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Description.
    #[serde(default)]
    pub body: Option<String>,
    /// Author account.
    #[serde(default)]
    pub user: Option<UserRecord>,
    /// `open` or `closed`.
    #[serde(default)]
    pub state: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Issue comment count; the listing endpoint omits it.
    #[serde(default)]
    pub comments: u64,
    /// Browser URL.
    #[serde(default)]
    pub html_url: String,
}

/// Entry from the issue listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IssueRecord {
    /// Issue number.
    pub number: u64,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Description.
    #[serde(default)]
    pub body: Option<String>,
    /// Author account.
    #[serde(default)]
    pub user: Option<UserRecord>,
    /// `open` or `closed`.
    #[serde(default)]
    pub state: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Close time, when closed.
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    /// Labels.
    #[serde(default)]
    pub labels: Vec<LabelRecord>,
    /// Assigned accounts.
    #[serde(default)]
    pub assignees: Vec<UserRecord>,
    /// Browser URL.
    #[serde(default)]
    pub html_url: String,
    /// Present when the issue is really a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl IssueRecord {
    /// The issues endpoint also returns pull requests; those carry a
    /// `pull_request` object.
    #[must_use]
    pub const fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// Issue label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LabelRecord {
    /// Label name.
    pub name: String,
}

/// Entry from a pull request's review listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReviewRecord {
    /// Reviewer account.
    #[serde(default)]
    pub user: Option<UserRecord>,
    /// Review state (`APPROVED`, `COMMENTED`, ...).
    #[serde(default)]
    pub state: String,
}
