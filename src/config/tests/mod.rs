//! Unit tests for configuration loading and precedence.
//!
//! Tests are organised into modules by functional area:
//! - `helpers`: Shared test utilities
//! - `precedence`: Layer precedence tests
//! - `field_resolution`: Repository, token, filter and summarizer resolution
//! - `period`: Reporting window resolution

mod field_resolution;
mod helpers;
