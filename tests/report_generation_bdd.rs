//! Behavioural tests for end-to-end report generation.

#[path = "report_generation_bdd/mod.rs"]
mod report_generation_bdd_support;

use report_generation_bdd_support::{ReportState, ensure_runtime_and_server, generate_report};
use repomon::RepomonError;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[fixture]
fn report_state() -> ReportState {
    ReportState::default()
}

#[given("a mock GitHub API with no activity for {repository}")]
fn seed_quiet_repository(report_state: &ReportState, repository: String) {
    let runtime = ensure_runtime_and_server(report_state);

    for listing in ["branches", "pulls", "issues"] {
        let mock = Mock::given(method("GET"))
            .and(path(format!("/api/v3/repos/{repository}/{listing}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])));

        report_state
            .server
            .with_ref(|server| {
                runtime.block_on(mock.mount(server));
            })
            .unwrap_or_else(|| panic!("mock server not initialised"));
    }
}

#[when("a report is generated for {repository} from {from} to {to}")]
fn run_generation(report_state: &ReportState, repository: String, from: String, to: String) {
    match generate_report(report_state, &repository, &from, &to) {
        Ok(markdown) => {
            let _had_previous_error = report_state.error.take().is_some();
            report_state.markdown.set(markdown);
        }
        Err(error) => {
            let _had_previous_report = report_state.markdown.take().is_some();
            report_state.error.set(error);
        }
    }
}

fn rendered(report_state: &ReportState) -> String {
    report_state
        .markdown
        .get()
        .unwrap_or_else(|| panic!("expected a rendered report"))
}

#[then("the report shows no branch activity")]
fn assert_no_branch_activity(report_state: &ReportState) {
    let markdown = rendered(report_state);

    assert!(
        markdown.contains("No branch activity in this period."),
        "unexpected report:\n{markdown}"
    );
}

#[then("the summary statistics show {count} commits")]
fn assert_commit_total(report_state: &ReportState, count: u64) {
    let markdown = rendered(report_state);
    let expected = format!("- Total Commits: {count}");

    assert!(markdown.contains(&expected), "missing `{expected}`:\n{markdown}");
}

#[then("the footer notes that no summaries were requested")]
fn assert_footer(report_state: &ReportState) {
    let markdown = rendered(report_state);

    assert!(markdown.contains("_Generated by repomon. No summaries were requested._"));
}

#[then("generation fails with an invalid parameters error")]
fn assert_invalid_parameters(report_state: &ReportState) {
    let error = report_state
        .error
        .get()
        .unwrap_or_else(|| panic!("expected generation to fail"));

    assert!(
        matches!(error, RepomonError::InvalidParameters { ref parameter, .. } if parameter == "from"),
        "unexpected error: {error:?}"
    );
    assert_eq!(error.category(), "Invalid parameters");
}

#[then("no GitHub requests were made")]
fn assert_no_requests(report_state: &ReportState) {
    let runtime = ensure_runtime_and_server(report_state);
    let received = report_state
        .server
        .with_ref(|server| runtime.block_on(server.received_requests()))
        .unwrap_or_else(|| panic!("mock server not initialised"))
        .unwrap_or_default();

    assert!(received.is_empty(), "expected no requests, got {}", received.len());
}

#[scenario(path = "tests/features/report_generation.feature", index = 0)]
fn report_on_quiet_repository(report_state: ReportState) {
    let _ = report_state;
}

#[scenario(path = "tests/features/report_generation.feature", index = 1)]
fn reject_reversed_date_range(report_state: ReportState) {
    let _ = report_state;
}
