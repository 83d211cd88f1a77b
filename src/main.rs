//! Repomon CLI entrypoint for repository activity reports.

use std::io::{self, Write};
use std::process::ExitCode;

use camino::Utf8Path;
use chrono::Utc;
use ortho_config::OrthoConfig;
use repomon::{
    Enricher, Enrichment, MarkdownRenderer, OctocrabRepositoryGateway, OpenAiSummarizer,
    PersonalAccessToken, PromptSet, RepomonConfig, RepomonError, RepositoryCollector,
    ReportGenerator,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _stderr_unavailable =
                writeln!(io::stderr().lock(), "{}: {error}", error.category()).is_err();
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), RepomonError> {
    let config = load_config()?;
    init_logging(config.verbose);

    let repository = config.require_repository()?;
    let period = config.resolve_period(Utc::now())?;
    let token = config.resolve_token()?;

    let gateway = OctocrabRepositoryGateway::for_token(&token, &repository)?;
    let collector = RepositoryCollector::new(&gateway, config.contributor_filter());
    let enrichment = build_enrichment(&config, &token)?;
    let renderer = match config.template.as_deref() {
        Some(path) => MarkdownRenderer::from_path(Utf8Path::new(path))?,
        None => MarkdownRenderer::new(),
    };

    let report = ReportGenerator::new(collector, enrichment, renderer)
        .generate(&repository, period)
        .await?;

    write_report(config.output.as_deref(), &report.markdown)
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`RepomonError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<RepomonConfig, RepomonError> {
    RepomonConfig::load().map_err(|error| RepomonError::Configuration {
        message: error.to_string(),
    })
}

/// Logs go to standard error; `RUST_LOG` overrides the verbosity flag.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

fn build_enrichment(
    config: &RepomonConfig,
    token: &PersonalAccessToken,
) -> Result<Enrichment, RepomonError> {
    let Some(settings) = config.summarizer_settings(token) else {
        return Ok(Enrichment::Disabled);
    };
    info!(model = %settings.model, endpoint = %settings.base_url, "summaries enabled");

    let prompts = PromptSet::load(config.prompts_dir.as_deref().map(Utf8Path::new))?;
    let summarizer = OpenAiSummarizer::new(settings)?;
    Ok(Enrichment::Enabled(Enricher::new(
        Box::new(summarizer),
        prompts,
        config.language(),
    )))
}

fn write_report(output: Option<&str>, markdown: &str) -> Result<(), RepomonError> {
    let Some(path) = output else {
        return io::stdout()
            .lock()
            .write_all(markdown.as_bytes())
            .map_err(|error| RepomonError::Io {
                message: format!("failed to write report: {error}"),
            });
    };

    std::fs::write(path, markdown).map_err(|error| RepomonError::Io {
        message: format!("failed to write report to {path}: {error}"),
    })?;
    info!(path, "report written");
    Ok(())
}
