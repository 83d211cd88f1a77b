//! Scenario state and runtime/server initialisation for the report
//! generation BDD tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use repomon::{
    ContributorFilter, Enrichment, MarkdownRenderer, OctocrabRepositoryGateway,
    PersonalAccessToken, Period, RepomonError, RepositoryCollector, RepositoryLocator,
    ReportGenerator, RetryPolicy,
};
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use tokio::runtime::Runtime;
use wiremock::MockServer;

/// Shared runtime wrapper that can be stored in an rstest-bdd Slot.
#[derive(Clone)]
pub(crate) struct SharedRuntime(Rc<RefCell<Runtime>>);

impl SharedRuntime {
    fn new(runtime: Runtime) -> Self {
        Self(Rc::new(RefCell::new(runtime)))
    }

    pub(crate) fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.0.borrow().block_on(future)
    }
}

#[derive(ScenarioState, Default)]
pub(crate) struct ReportState {
    pub(crate) runtime: Slot<SharedRuntime>,
    pub(crate) server: Slot<MockServer>,
    pub(crate) markdown: Slot<String>,
    pub(crate) error: Slot<RepomonError>,
}

/// Ensures the runtime and mock server exist and returns the runtime.
pub(crate) fn ensure_runtime_and_server(state: &ReportState) -> SharedRuntime {
    if state.runtime.with_ref(|_| ()).is_none() {
        let runtime = Runtime::new()
            .unwrap_or_else(|error| panic!("failed to create Tokio runtime: {error}"));
        state.runtime.set(SharedRuntime::new(runtime));
    }

    let runtime = state
        .runtime
        .get()
        .unwrap_or_else(|| panic!("runtime not initialised after set"));

    if state.server.with_ref(|_| ()).is_none() {
        state.server.set(runtime.block_on(MockServer::start()));
    }

    runtime
}

/// Resolves the period and runs the pipeline against the mock server with
/// summaries disabled.
pub(crate) fn generate_report(
    state: &ReportState,
    repository: &str,
    from: &str,
    to: &str,
) -> Result<String, RepomonError> {
    let period = Period::parse_dates(from, to)?;

    let server_url = state
        .server
        .with_ref(MockServer::uri)
        .unwrap_or_else(|| panic!("mock server not initialised"));
    let locator = RepositoryLocator::parse(&format!("{server_url}/{repository}"))?;
    let token = PersonalAccessToken::new("ghp_bdd")?;
    let runtime = ensure_runtime_and_server(state);

    runtime.block_on(async {
        let gateway = OctocrabRepositoryGateway::for_token(&token, &locator)?;
        let collector = RepositoryCollector::new(&gateway, ContributorFilter::default())
            .with_retry(RetryPolicy::new(1, Duration::ZERO));
        let report = ReportGenerator::new(collector, Enrichment::Disabled, MarkdownRenderer::new())
            .generate(&locator, period)
            .await?;
        Ok(report.markdown)
    })
}
