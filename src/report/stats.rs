//! Repository-wide and per-author statistics.
//!
//! Both computations are pure functions of [`ReportData`]. Pull requests
//! appear in both the open and the recently-updated listings, so those two
//! sets are merged by number before anything is counted.

use std::collections::{HashMap, HashSet};

use super::model::{Author, AuthorStats, OverallStats, PullRequest, ReportData};

/// Computes repository-wide totals.
///
/// Commits are counted once per branch they appear on. Reviews on updated
/// pull requests only count when the same number is not also open.
#[must_use]
pub fn compute_overall_stats(data: &ReportData) -> OverallStats {
    let commits = data.branches.iter().flat_map(|branch| &branch.commits);
    let total_commits = count(data.branches.iter().map(|branch| branch.commits.len()).sum());
    let total_authors = count(
        commits
            .map(|commit| commit.author.login.as_str())
            .filter(|login| !login.is_empty())
            .collect::<HashSet<_>>()
            .len(),
    );

    let total_reviews = unique_pull_requests(data)
        .map(|pull_request| pull_request.reviews)
        .sum();

    OverallStats {
        total_commits,
        total_authors,
        open_pull_requests: count(data.open_pull_requests.len()),
        open_issues: count(data.open_issues.len()),
        closed_issues: count(data.closed_issues.len()),
        total_reviews,
    }
}

/// Computes one record per contributor, most commits first.
///
/// Records are created in encounter order: commits branch by branch, then
/// pull request authors (open, then updated-only), then issue authors (open,
/// then closed). Ties on commit count keep that order, so contributors with
/// no commits follow every commit author. Review counts stay zero because
/// reviews are not attributed to individual authors.
#[must_use]
pub fn compute_author_stats(data: &ReportData) -> Vec<AuthorStats> {
    let mut tallies = AuthorTallies::default();

    for branch in &data.branches {
        for commit in &branch.commits {
            let Some(stats) = tallies.record(&commit.author) else {
                continue;
            };
            stats.total_commits += 1;
            stats.total_added += commit.additions;
            stats.total_deleted += commit.deletions;

            let activity = stats
                .branch_activity
                .entry(branch.name.clone())
                .or_default();
            activity.commits += 1;
            activity.added += commit.additions;
            activity.deleted += commit.deletions;
        }
    }

    for pull_request in unique_pull_requests(data) {
        if let Some(stats) = tallies.record(&pull_request.author) {
            stats.prs_created += 1;
        }
    }

    for issue in data.open_issues.iter().chain(&data.closed_issues) {
        if let Some(stats) = tallies.record(&issue.author) {
            stats.issues_created += 1;
        }
    }

    tallies.into_ranked()
}

/// Open pull requests followed by updated ones not already open.
fn unique_pull_requests(data: &ReportData) -> impl Iterator<Item = &PullRequest> {
    let open_numbers: HashSet<u64> = data
        .open_pull_requests
        .iter()
        .map(|pull_request| pull_request.number)
        .collect();

    data.open_pull_requests.iter().chain(
        data.updated_pull_requests
            .iter()
            .filter(move |pull_request| !open_numbers.contains(&pull_request.number)),
    )
}

fn count(length: usize) -> u64 {
    u64::try_from(length).unwrap_or(u64::MAX)
}

#[derive(Default)]
struct AuthorTallies {
    by_login: HashMap<String, (usize, AuthorStats)>,
}

impl AuthorTallies {
    /// Returns the running record for `author`, creating it on first sight.
    /// Authors without an identity are not tallied.
    fn record(&mut self, author: &Author) -> Option<&mut AuthorStats> {
        if author.login.is_empty() {
            return None;
        }
        let sequence = self.by_login.len();
        let (_, stats) = self
            .by_login
            .entry(author.login.clone())
            .or_insert_with(|| (sequence, AuthorStats::new(author.clone())));
        Some(stats)
    }

    fn into_ranked(self) -> Vec<AuthorStats> {
        let mut ranked: Vec<(usize, AuthorStats)> = self.by_login.into_values().collect();
        ranked.sort_by(|(left_seq, left), (right_seq, right)| {
            right
                .total_commits
                .cmp(&left.total_commits)
                .then(left_seq.cmp(right_seq))
        });
        ranked.into_iter().map(|(_, stats)| stats).collect()
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
