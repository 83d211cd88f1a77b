//! Tests for Markdown rendering.

use camino::Utf8PathBuf;
use rstest::rstest;

use super::MarkdownRenderer;
use crate::ai::EnrichmentReport;
use crate::error::RepomonError;
use crate::report::model::ReportData;
use crate::report::stats::{compute_author_stats, compute_overall_stats};
use crate::report::test_support::{
    author, branch, commit, empty_report, issue, pull_request,
};

fn populated_report() -> ReportData {
    let mut data = empty_report();
    let mut main = branch("main", vec![commit("aaa1111bbb", "alice", 3, 1)]);
    main.summary = Some("Main moved forward.".to_owned());
    data.branches = vec![main];
    let mut open = pull_request(7, "bob", 2);
    open.summary = Some("Adds a widget.".to_owned());
    data.open_pull_requests = vec![open];
    let mut bug = issue(9, "carol", false);
    bug.labels = vec!["bug".to_owned(), "ui".to_owned()];
    bug.assignees = vec![author("alice")];
    data.open_issues = vec![bug];
    data.closed_issues = vec![issue(4, "alice", true)];
    data.overall_stats = compute_overall_stats(&data);
    data.author_stats = compute_author_stats(&data);
    data.overall_summary = Some("A quiet week.".to_owned());
    data
}

fn render(data: &ReportData, enrichment: EnrichmentReport) -> String {
    MarkdownRenderer::new()
        .render(data, &enrichment)
        .expect("default template should render")
}

#[test]
fn empty_reports_render_every_section() {
    let output = render(&empty_report(), EnrichmentReport::default());

    assert!(output.starts_with("# Repository Activity Report: octo/repo\n"));
    for expected in [
        "- Repository: [octo/repo](https://github.com/octo/repo)",
        "- Period: 2024-01-01 to 2024-01-07",
        "- Generated: 2024-01-03 12:00:00 UTC",
        "- Total Commits: 0",
        "- Code Reviews: 0",
        "No summary available.",
        "No branch activity in this period.",
        "No open pull requests.",
        "No pull requests were updated in this period.",
        "No open issues.",
        "No issues were closed in this period.",
        "No author activity in this period.",
        "_Generated by repomon. No summaries were requested._",
    ] {
        assert!(output.contains(expected), "missing `{expected}` in:\n{output}");
    }
    assert!(!output.contains("{{"));
}

#[test]
fn branches_list_their_commits() {
    let output = render(&populated_report(), EnrichmentReport::default());

    assert!(output.contains("### main\n\nMain moved forward.\n\n- Commits: 1\n"));
    assert!(output.contains("- Changes: +3 / -1\n- Authors: alice\n"));
    assert!(output.contains(
        "- [`aaa1111`](https://github.com/octo/repo/commit/aaa1111bbb) Change aaa1111bbb (alice, 2024-01-03, +3 / -1)\n"
    ));
}

#[test]
fn pull_requests_and_issues_are_linked() {
    let output = render(&populated_report(), EnrichmentReport::default());

    assert!(output.contains("#### [#7 Pull request 7](https://github.com/octo/repo/pull/7)"));
    assert!(output.contains("- Author: [bob](https://github.com/bob)"));
    assert!(output.contains("- Comments: 0, reviews: 2\n\nAdds a widget.\n"));
    assert!(output.contains(
        "- [#9 Issue 9](https://github.com/octo/repo/issues/9) by [carol](https://github.com/carol) [bug, ui], assigned to alice, opened 2024-01-03\n"
    ));
    assert!(output.contains(
        "- [#4 Issue 4](https://github.com/octo/repo/issues/4) by [alice](https://github.com/alice), closed 2024-01-03\n"
    ));
}

#[test]
fn author_table_has_one_row_per_contributor() {
    let output = render(&populated_report(), EnrichmentReport::default());

    assert!(output.contains("| Author | Commits | Added | Deleted | PRs | Issues | Reviews | Branches |"));
    assert!(output.contains("| [alice](https://github.com/alice) | 1 | 3 | 1 | 0 | 1 | 0 | main (1) |"));
    assert!(output.contains("| [bob](https://github.com/bob) | 0 | 0 | 0 | 1 | 0 | 0 |  |"));
}

#[rstest]
#[case::all_succeeded(4, 4, 0, "Summaries: 4 of 4 generated, 0 failed.")]
#[case::some_failed(5, 2, 3, "Summaries: 2 of 5 generated, 3 failed.")]
fn footer_reports_enrichment_counts(
    #[case] attempted: u64,
    #[case] succeeded: u64,
    #[case] failed: u64,
    #[case] expected: &str,
) {
    let output = render(
        &empty_report(),
        EnrichmentReport {
            attempted,
            succeeded,
            failed,
        },
    );

    assert!(output.contains(expected), "footer missing in:\n{output}");
}

#[test]
fn custom_templates_share_the_context() {
    let renderer = MarkdownRenderer::with_template(
        "{{ repository }}: {{ stats.total_commits }} commits, {{ branches | length }} branches\n",
    );

    let output = renderer
        .render(&populated_report(), &EnrichmentReport::default())
        .expect("custom template should render");

    assert_eq!(output, "octo/repo: 1 commits, 1 branches\n");
}

#[test]
fn template_syntax_errors_are_reported() {
    let renderer = MarkdownRenderer::with_template("{% for branch in branches %}");

    let error = renderer
        .render(&empty_report(), &EnrichmentReport::default())
        .expect_err("unclosed block should fail");

    assert!(matches!(error, RepomonError::Template { .. }));
}

#[test]
fn templates_load_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
    let path = root.join("custom.md.j2");
    std::fs::write(&path, "Generated {{ generated_at }}").expect("template should be written");

    let output = MarkdownRenderer::from_path(&path)
        .expect("template should load")
        .render(&empty_report(), &EnrichmentReport::default())
        .expect("template should render");

    assert_eq!(output, "Generated 2024-01-03 12:00:00 UTC");
}

#[test]
fn missing_template_files_are_io_errors() {
    let error = MarkdownRenderer::from_path(Utf8PathBuf::from("/nonexistent/report.md.j2").as_path())
        .expect_err("missing file should fail");

    assert!(matches!(error, RepomonError::Io { .. }));
}
