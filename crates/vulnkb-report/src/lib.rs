//! vulnkb-report: persists finished scan results as named report objects.
//!
//! Depends only on result data; the knowledge-base bundle has been released by the time
//! a sink runs.

pub mod format;
mod model;
mod sink;

pub use model::{timestamp_key, CveSummary, ScanResult, Severity};
pub use sink::{DirectorySink, ReportError, ReportFormats, ReportSink};
