//! Builders for report fixtures shared by unit and integration tests.

use chrono::{DateTime, TimeZone, Utc};

use super::model::{Author, Branch, Commit, Issue, Period, PullRequest, ReportData};

/// Fixed instant used for every fixture timestamp.
#[must_use]
pub fn fixture_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Human author with the given login.
#[must_use]
pub fn author(login: &str) -> Author {
    Author {
        login: login.to_owned(),
        name: String::new(),
        profile_url: format!("https://github.com/{login}"),
        is_bot: false,
    }
}

/// Commit by `login` with the given line changes.
#[must_use]
pub fn commit(sha: &str, login: &str, additions: u64, deletions: u64) -> Commit {
    Commit {
        sha: sha.to_owned(),
        message: format!("Change {sha}"),
        author: author(login),
        timestamp: fixture_time(),
        additions,
        deletions,
        url: format!("https://github.com/octo/repo/commit/{sha}"),
    }
}

/// Pull request `number` by `login` with `reviews` reviews.
#[must_use]
pub fn pull_request(number: u64, login: &str, reviews: u64) -> PullRequest {
    PullRequest {
        number,
        title: format!("Pull request {number}"),
        body: String::new(),
        author: author(login),
        state: "open".to_owned(),
        created_at: fixture_time(),
        updated_at: fixture_time(),
        comments: 0,
        reviews,
        url: format!("https://github.com/octo/repo/pull/{number}"),
        summary: None,
    }
}

/// Issue `number` by `login`, closed at the fixture time when `closed`.
#[must_use]
pub fn issue(number: u64, login: &str, closed: bool) -> Issue {
    Issue {
        number,
        title: format!("Issue {number}"),
        body: String::new(),
        author: author(login),
        state: if closed { "closed" } else { "open" }.to_owned(),
        created_at: fixture_time(),
        closed_at: closed.then(fixture_time),
        labels: Vec::new(),
        assignees: Vec::new(),
        url: format!("https://github.com/octo/repo/issues/{number}"),
    }
}

/// Branch named `name` holding `commits`.
#[must_use]
pub fn branch(name: &str, commits: Vec<Commit>) -> Branch {
    Branch::from_commits(name, commits)
}

/// Empty report for `octo/repo` over the first week of 2024.
#[must_use]
pub fn empty_report() -> ReportData {
    ReportData::empty(
        "octo/repo",
        "https://github.com/octo/repo",
        fixture_period(),
        fixture_time(),
    )
}

/// `2024-01-01` through `2024-01-07`.
///
/// # Panics
///
/// Never in practice; the fixture dates are constant and ordered.
#[must_use]
pub fn fixture_period() -> Period {
    match Period::parse_dates("2024-01-01", "2024-01-07") {
        Ok(period) => period,
        Err(error) => panic!("fixture period should parse: {error}"),
    }
}
