//! Support modules for the report generation BDD tests.

pub(crate) mod state;

pub(crate) use state::{ReportState, ensure_runtime_and_server, generate_report};
