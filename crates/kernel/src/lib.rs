//! Insight Kernel Library
//!
//! Read-only diagnostics reports over a CMS host database. The `insight`
//! binary serves them over HTTP and runs template warm-up scans.

pub mod config;
pub mod db;
pub mod error;
pub mod report;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::{ReportError, ReportResult};
pub use state::AppState;
