//! Report model, statistics and rendering.

pub mod generator;
pub mod markdown;
pub mod model;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use generator::{GeneratedReport, ReportGenerator};
pub use markdown::MarkdownRenderer;
pub use model::{
    Author, AuthorStats, Branch, BranchActivity, Commit, Issue, OverallStats, Period,
    PullRequest, ReportData,
};
