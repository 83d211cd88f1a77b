//! Tests for overall and per-author aggregation.

use rstest::{fixture, rstest};

use super::{compute_author_stats, compute_overall_stats};
use crate::report::model::{BranchActivity, OverallStats, ReportData};
use crate::report::test_support::{branch, commit, empty_report, issue, pull_request};

#[fixture]
fn busy_report() -> ReportData {
    let mut data = empty_report();
    data.branches = vec![
        branch(
            "main",
            vec![
                commit("a1", "alice", 10, 2),
                commit("a2", "alice", 5, 0),
                commit("b1", "bob", 1, 1),
            ],
        ),
        branch("feature", vec![commit("a3", "alice", 7, 3)]),
    ];
    data.open_pull_requests = vec![pull_request(1, "alice", 2), pull_request(2, "carol", 3)];
    data.updated_pull_requests = vec![pull_request(1, "alice", 2), pull_request(3, "dave", 1)];
    data.open_issues = vec![issue(10, "alice", false)];
    data.closed_issues = vec![issue(11, "erin", true)];
    data
}

#[rstest]
fn overlapping_pull_requests_count_reviews_once(busy_report: ReportData) {
    let stats = compute_overall_stats(&busy_report);

    assert_eq!(stats.total_reviews, 6, "PR #1 must be counted once");
}

#[rstest]
fn overall_totals_follow_collections(busy_report: ReportData) {
    let stats = compute_overall_stats(&busy_report);

    assert_eq!(stats.total_commits, 4);
    assert_eq!(stats.total_authors, 2);
    assert_eq!(stats.open_pull_requests, 2);
    assert_eq!(stats.open_issues, 1);
    assert_eq!(stats.closed_issues, 1);
}

#[test]
fn commits_on_several_branches_count_per_branch() {
    let mut data = empty_report();
    data.branches = vec![
        branch("main", vec![commit("same", "alice", 1, 0)]),
        branch("release", vec![commit("same", "alice", 1, 0)]),
    ];

    let stats = compute_overall_stats(&data);

    assert_eq!(stats.total_commits, 2);
    assert_eq!(stats.total_authors, 1);
}

#[rstest]
fn author_activity_spans_branches(busy_report: ReportData) {
    let stats = compute_author_stats(&busy_report);
    let alice = stats
        .iter()
        .find(|entry| entry.author.login == "alice")
        .expect("alice should have a record");

    assert_eq!(alice.total_commits, 3);
    assert_eq!(alice.total_added, 22);
    assert_eq!(alice.total_deleted, 5);
    assert_eq!(alice.prs_created, 1, "PR #1 is attributed once");
    assert_eq!(alice.issues_created, 1);
    assert_eq!(alice.reviews, 0);
    assert_eq!(alice.branch_activity.len(), 2);
    assert_eq!(
        alice.branch_activity.get("main"),
        Some(&BranchActivity {
            commits: 2,
            added: 15,
            deleted: 2
        })
    );
    assert_eq!(
        alice.branch_activity.get("feature"),
        Some(&BranchActivity {
            commits: 1,
            added: 7,
            deleted: 3
        })
    );
}

#[rstest]
fn authors_rank_by_commits_then_encounter_order(busy_report: ReportData) {
    let logins: Vec<String> = compute_author_stats(&busy_report)
        .into_iter()
        .map(|entry| entry.author.login)
        .collect();

    assert_eq!(logins, vec!["alice", "bob", "carol", "dave", "erin"]);
}

#[test]
fn pull_request_and_issue_only_authors_follow_committers() {
    let mut data = empty_report();
    data.open_issues = vec![issue(1, "zara", false)];
    data.branches = vec![branch("main", vec![commit("c1", "yuri", 1, 1)])];

    let stats = compute_author_stats(&data);

    assert_eq!(stats.len(), 2);
    assert_eq!(stats.first().map(|entry| entry.author.login.as_str()), Some("yuri"));
    assert_eq!(stats.get(1).map(|entry| entry.issues_created), Some(1));
}

#[test]
fn anonymous_contributions_are_not_tallied() {
    let mut data = empty_report();
    data.branches = vec![branch("main", vec![commit("c1", "", 4, 4)])];
    data.open_issues = vec![issue(2, "", false)];

    assert!(compute_author_stats(&data).is_empty());
    assert_eq!(compute_overall_stats(&data).total_authors, 0);
}

#[rstest]
fn aggregation_is_idempotent(busy_report: ReportData) {
    assert_eq!(
        compute_overall_stats(&busy_report),
        compute_overall_stats(&busy_report)
    );
    assert_eq!(
        compute_author_stats(&busy_report),
        compute_author_stats(&busy_report)
    );
}

#[test]
fn empty_report_has_zero_totals() {
    let data = empty_report();

    assert_eq!(compute_overall_stats(&data), OverallStats::default());
    assert!(compute_author_stats(&data).is_empty());
}
