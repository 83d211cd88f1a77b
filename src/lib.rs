//! Repomon library crate producing repository activity reports.
//!
//! The library collects a period's branches, commits, pull requests and
//! issues from GitHub through Octocrab, aggregates them into per-author and
//! repository-wide statistics, optionally asks an OpenAI-compatible endpoint
//! for narrative summaries, and renders the result as Markdown.

pub mod ai;
pub mod collect;
pub mod config;
pub mod error;
pub mod github;
pub mod pool;
pub mod report;
pub mod retry;

pub use ai::{Enricher, Enrichment, EnrichmentReport, OpenAiConfig, OpenAiSummarizer, PromptSet};
pub use collect::{CollectionLimits, ContributorFilter, RepositoryCollector};
pub use config::RepomonConfig;
pub use error::RepomonError;
pub use github::{OctocrabRepositoryGateway, PersonalAccessToken, RepositoryLocator};
pub use report::{GeneratedReport, MarkdownRenderer, Period, ReportData, ReportGenerator};
pub use retry::RetryPolicy;
