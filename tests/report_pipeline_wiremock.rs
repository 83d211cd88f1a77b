//! End-to-end report generation against a mocked GitHub API.

use std::time::Duration;

use repomon::{
    ContributorFilter, Enrichment, MarkdownRenderer, OctocrabRepositoryGateway,
    PersonalAccessToken, Period, RepomonError, RepositoryCollector, RepositoryLocator,
    ReportGenerator, RetryPolicy,
};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPO_PATH: &str = "/api/v3/repos/octo/repo";

#[fixture]
fn period() -> Period {
    Period::parse_dates("2024-01-01", "2024-01-07").expect("fixture period should parse")
}

fn user(login: &str) -> Value {
    json!({ "login": login, "type": "User" })
}

fn pull_request(number: u64, login: &str, state: &str, updated_at: &str) -> Value {
    json!({
        "number": number,
        "title": format!("Pull request {number}"),
        "body": "Details",
        "user": user(login),
        "state": state,
        "created_at": "2024-01-01T08:00:00Z",
        "updated_at": updated_at,
        "html_url": format!("https://github.com/octo/repo/pull/{number}")
    })
}

async fn mount_json(server: &MockServer, mock_path: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(mock_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_query(server: &MockServer, mock_path: &str, state: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(mock_path))
        .and(query_param("state", state))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn seed_repository(server: &MockServer) {
    mount_json(
        server,
        &format!("{REPO_PATH}/branches"),
        json!([{ "name": "main" }, { "name": "stale" }]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path(format!("{REPO_PATH}/commits")))
        .and(query_param("sha", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "sha": "abc1234def",
            "commit": {
                "message": "Add feature\n\nLonger body.",
                "author": { "name": "Alice Example", "date": "2024-01-02T10:00:00Z" }
            },
            "author": user("alice"),
            "html_url": "https://github.com/octo/repo/commit/abc1234def"
        }])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO_PATH}/commits")))
        .and(query_param("sha", "stale"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
    mount_json(
        server,
        &format!("{REPO_PATH}/commits/abc1234def"),
        json!({ "sha": "abc1234def", "stats": { "additions": 5, "deletions": 2, "total": 7 } }),
    )
    .await;

    mount_query(
        server,
        &format!("{REPO_PATH}/pulls"),
        "open",
        json!([pull_request(1, "alice", "open", "2024-01-05T08:00:00Z")]),
    )
    .await;
    mount_query(
        server,
        &format!("{REPO_PATH}/pulls"),
        "all",
        json!([
            pull_request(2, "bob", "closed", "2024-01-03T08:00:00Z"),
            pull_request(3, "bob", "closed", "2023-12-01T08:00:00Z")
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v3/repos/octo/repo/pulls/\d+/reviews$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "user": user("carol"), "state": "APPROVED" }
        ])))
        .mount(server)
        .await;

    mount_query(
        server,
        &format!("{REPO_PATH}/issues"),
        "open",
        json!([{
            "number": 10,
            "title": "Crash on start",
            "user": user("bob"),
            "state": "open",
            "created_at": "2024-01-02T08:00:00Z",
            "labels": [{ "name": "bug" }],
            "html_url": "https://github.com/octo/repo/issues/10"
        }]),
    )
    .await;
    mount_query(server, &format!("{REPO_PATH}/issues"), "closed", json!([])).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v3/users/[^/]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": "someone",
            "name": "Display Name"
        })))
        .mount(server)
        .await;
}

fn connect(server: &MockServer) -> (OctocrabRepositoryGateway, RepositoryLocator) {
    let locator = RepositoryLocator::parse(&format!("{}/octo/repo", server.uri()))
        .expect("mock repository URL should parse");
    let token = PersonalAccessToken::new("ghp_test").expect("token should be valid");
    let gateway =
        OctocrabRepositoryGateway::for_token(&token, &locator).expect("gateway should build");
    (gateway, locator)
}

#[rstest]
#[tokio::test]
async fn generates_a_markdown_report(period: Period) {
    let server = MockServer::start().await;
    seed_repository(&server).await;
    let (gateway, locator) = connect(&server);

    let collector = RepositoryCollector::new(&gateway, ContributorFilter::default())
        .with_retry(RetryPolicy::new(1, Duration::ZERO));
    let report = ReportGenerator::new(collector, Enrichment::Disabled, MarkdownRenderer::new())
        .generate(&locator, period)
        .await
        .expect("report should generate");

    let data = &report.data;
    assert_eq!(data.repository, "octo/repo");
    assert_eq!(
        data.branches.iter().map(|branch| branch.name.as_str()).collect::<Vec<_>>(),
        vec!["main"]
    );
    assert_eq!(
        data.updated_pull_requests
            .iter()
            .map(|pull_request| pull_request.number)
            .collect::<Vec<_>>(),
        vec![2]
    );
    assert_eq!(data.overall_stats.total_commits, 1);
    assert_eq!(data.overall_stats.total_reviews, 2);
    assert_eq!(data.overall_stats.open_issues, 1);

    let markdown = &report.markdown;
    for expected in [
        "# Repository Activity Report: octo/repo",
        "- Total Commits: 1",
        "- Total Authors: 1",
        "- Open Pull Requests: 1",
        "- Code Reviews: 2",
        "### main",
        "- Changes: +5 / -2",
        "[`abc1234`](https://github.com/octo/repo/commit/abc1234def) Add feature (alice, 2024-01-02, +5 / -2)",
        "#### [#1 Pull request 1](https://github.com/octo/repo/pull/1)",
        "#### [#2 Pull request 2](https://github.com/octo/repo/pull/2)",
        "[#10 Crash on start](https://github.com/octo/repo/issues/10)",
        "[bug]",
        "No issues were closed in this period.",
        "| 1 | 5 | 2 | 1 | 0 | 0 | main (1) |",
        "_Generated by repomon. No summaries were requested._",
    ] {
        assert!(markdown.contains(expected), "missing `{expected}` in:\n{markdown}");
    }
    assert!(!markdown.contains("### stale"));
    assert!(!markdown.contains("Pull request 3"));
}

#[rstest]
#[tokio::test]
async fn missing_repositories_are_reported_by_name(period: Period) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v3/repos/octo/repo/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest"
        })))
        .mount(&server)
        .await;
    let (gateway, locator) = connect(&server);

    let collector = RepositoryCollector::new(&gateway, ContributorFilter::default())
        .with_retry(RetryPolicy::new(1, Duration::ZERO));
    let error = ReportGenerator::new(collector, Enrichment::Disabled, MarkdownRenderer::new())
        .generate(&locator, period)
        .await
        .expect_err("missing repository should fail");

    assert_eq!(
        error,
        RepomonError::RepositoryNotFound {
            repository: "octo/repo".to_owned()
        }
    );
}
