//! End-to-end report pipeline: collect, aggregate, enrich, render.

use tracing::info;

use super::markdown::MarkdownRenderer;
use super::model::{Period, ReportData};
use super::stats::{compute_author_stats, compute_overall_stats};
use crate::ai::{Enrichment, EnrichmentReport};
use crate::collect::RepositoryCollector;
use crate::error::RepomonError;
use crate::github::gateway::RepositoryDataGateway;
use crate::github::locator::RepositoryLocator;

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedReport {
    /// The aggregated and enriched report.
    pub data: ReportData,
    /// Summary call counts.
    pub enrichment: EnrichmentReport,
    /// Rendered Markdown.
    pub markdown: String,
}

/// Runs the full pipeline for one repository.
pub struct ReportGenerator<'a, G: ?Sized> {
    collector: RepositoryCollector<'a, G>,
    enrichment: Enrichment,
    renderer: MarkdownRenderer,
}

impl<'a, G> ReportGenerator<'a, G>
where
    G: RepositoryDataGateway + ?Sized,
{
    /// Assembles a generator from its stages.
    #[must_use]
    pub const fn new(
        collector: RepositoryCollector<'a, G>,
        enrichment: Enrichment,
        renderer: MarkdownRenderer,
    ) -> Self {
        Self {
            collector,
            enrichment,
            renderer,
        }
    }

    /// Generates the report for `repository` over `period`.
    ///
    /// # Errors
    ///
    /// Returns collection failures and template failures. Summary failures
    /// never surface here; they are counted in
    /// [`GeneratedReport::enrichment`].
    pub async fn generate(
        &self,
        repository: &RepositoryLocator,
        period: Period,
    ) -> Result<GeneratedReport, RepomonError> {
        let mut data = self.collector.collect(repository, period).await?;

        data.overall_stats = compute_overall_stats(&data);
        data.author_stats = compute_author_stats(&data);
        info!(
            commits = data.overall_stats.total_commits,
            authors = data.author_stats.len(),
            "statistics computed"
        );

        let enrichment = self.enrichment.apply(&mut data).await;
        let markdown = self.renderer.render(&data, &enrichment)?;

        Ok(GeneratedReport {
            data,
            enrichment,
            markdown,
        })
    }
}
